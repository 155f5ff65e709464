use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::config::Config;
use crate::runner::CodeRunner;
use crate::session::registry::SessionRegistry;

/// The application context: every shared handle lives here and is passed
/// down explicitly, never through module-level globals.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub sessions: SessionRegistry,
    pub runner: Arc<dyn CodeRunner>,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for SessionRegistry {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl FromRef<AppState> for Arc<dyn CodeRunner> {
    fn from_ref(state: &AppState) -> Self {
        state.runner.clone()
    }
}
