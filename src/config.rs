// src/config.rs

use dotenvy::dotenv;
use std::env;
use url::Url;

/// Questions drawn into a round 1 (MCQ) session.
pub const ROUND_ONE_QUESTION_COUNT: usize = 10;
/// Questions drawn into a round 2 (coding) session.
pub const ROUND_TWO_QUESTION_COUNT: usize = 3;

/// How long a finished session stays queryable before the sweeper drops it.
pub const FINISHED_SESSION_TTL_SECS: u64 = 600;
/// Sweeper wake-up interval.
pub const SESSION_SWEEP_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub admin_enrollment: Option<String>,
    pub admin_password: Option<String>,
    pub compiler_api_url: String,
    pub compiler_api_key: String,
    pub compiler_api_host: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(86400);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let admin_enrollment = env::var("ADMIN_ENROLLMENT").ok();
        let admin_password = env::var("ADMIN_PASSWORD").ok();

        let compiler_api_url = env::var("COMPILER_API_URL")
            .unwrap_or_else(|_| "https://onecompiler-api.p.rapidapi.com/api/v1/run".to_string());
        if Url::parse(&compiler_api_url).is_err() {
            panic!("COMPILER_API_URL is not a valid URL: {}", compiler_api_url);
        }

        let compiler_api_key = env::var("COMPILER_API_KEY").unwrap_or_default();
        let compiler_api_host = env::var("COMPILER_API_HOST")
            .unwrap_or_else(|_| "onecompiler-api.p.rapidapi.com".to_string());

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            admin_enrollment,
            admin_password,
            compiler_api_url,
            compiler_api_key,
            compiler_api_host,
        }
    }

    /// Target selection size for a round.
    pub fn question_count_for_round(round: i32) -> usize {
        if round == 1 {
            ROUND_ONE_QUESTION_COUNT
        } else {
            ROUND_TWO_QUESTION_COUNT
        }
    }
}
