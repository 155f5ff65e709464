// src/routes.rs

use std::sync::Arc;

use axum::{
    Router,
    http::Method,
    middleware,
    routing::{get, post, put},
};
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, quiz, results},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, quiz, results, admin).
/// * Applies global middleware (Trace, CORS) and rate limiting on auth.
/// * Injects global state (pool, config, session registry, code runner).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(SmartIpKeyExtractor)
            .per_second(2)
            .burst_size(5)
            .finish()
            .unwrap(),
    );

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(GovernorLayer::new(governor_conf))
        .merge(
            Router::new().route("/me", get(auth::me)).layer(
                middleware::from_fn_with_state(state.clone(), auth_middleware),
            ),
        );

    let quiz_routes = Router::new()
        .route("/start", post(quiz::start))
        .route("/session/{id}", get(quiz::state).delete(quiz::abandon))
        .route("/session/{id}/answer", put(quiz::answer))
        .route("/session/{id}/position", put(quiz::position))
        .route("/session/{id}/focus-loss", post(quiz::focus_loss))
        .route("/session/{id}/run", post(quiz::run_code))
        .route("/session/{id}/submit", post(quiz::submit))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let results_routes = Router::new()
        .route("/me", get(results::my_results))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let admin_routes = Router::new()
        .route(
            "/quizzes",
            get(admin::list_quizzes).post(admin::create_quiz),
        )
        .route(
            "/quizzes/{id}",
            get(admin::get_quiz)
                .put(admin::update_quiz)
                .delete(admin::delete_quiz),
        )
        .route("/users", get(admin::list_users))
        .route("/results", get(admin::list_results))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/quiz", quiz_routes)
        .nest("/api/results", results_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
