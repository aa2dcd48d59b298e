// src/config.rs

use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub mongodb_url: String,
    pub mongodb_db: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub cors_origin: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let mongodb_url = env::var("MONGODB_URL").expect("MONGODB_URL must be set");

        let mongodb_db = env::var("MONGODB_DB").unwrap_or_else(|_| "learnhub".to_string());

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(86400);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let cors_origin =
            env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());

        Self {
            mongodb_url,
            mongodb_db,
            jwt_secret,
            jwt_expiration,
            rust_log,
            cors_origin,
        }
    }
}
