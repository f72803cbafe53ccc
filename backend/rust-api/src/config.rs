use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::services::query_gate::DEFAULT_ROW_LIMIT;

pub const DEFAULT_QUERY_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// SQLite file holding the practice table.
    pub dataset_path: String,
    pub table_name: String,
    pub bind_address: String,
    pub row_limit: u32,
    pub query_timeout_ms: u64,
    /// Problem catalog override; the bundled catalog is used when unset.
    pub catalog_path: Option<String>,
    /// Query logs go to MongoDB when set, to process memory otherwise.
    pub mongo_uri: Option<String>,
    pub mongo_database: String,
    /// Learner progress and history go to Redis when set, to process memory otherwise.
    pub redis_uri: Option<String>,
    pub jwt_secret: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Root .env first, then a local one
        let skip_root_env = env::var("SKIP_ROOT_ENV").is_ok();
        if skip_root_env {
            dotenvy::dotenv().ok();
        } else if dotenvy::from_path("../../.env").is_err() {
            dotenvy::dotenv().ok();
        }

        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // config/*.toml + ENV overrides (prefix: APP__)
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let dataset_path = settings
            .get_string("dataset.path")
            .or_else(|_| env::var("DATASET_PATH"))
            .unwrap_or_else(|_| "data/stores.db".to_string());

        let table_name = settings
            .get_string("dataset.table")
            .or_else(|_| env::var("DATASET_TABLE"))
            .unwrap_or_else(|_| "stores".to_string());

        let bind_address = settings
            .get_string("server.bind_address")
            .or_else(|_| env::var("BIND_ADDRESS"))
            .unwrap_or_else(|_| "0.0.0.0:3001".to_string());

        let row_limit = match settings.get_int("query.row_limit") {
            Ok(limit) => u32::try_from(limit).map_err(|_| {
                config::ConfigError::Message(format!("query.row_limit out of range: {}", limit))
            })?,
            Err(_) => parse_env("QUERY_ROW_LIMIT")?.unwrap_or(DEFAULT_ROW_LIMIT),
        };

        let query_timeout_ms = match settings.get_int("query.timeout_ms") {
            Ok(ms) => u64::try_from(ms).map_err(|_| {
                config::ConfigError::Message(format!("query.timeout_ms out of range: {}", ms))
            })?,
            Err(_) => parse_env("QUERY_TIMEOUT_MS")?.unwrap_or(DEFAULT_QUERY_TIMEOUT_MS),
        };

        let catalog_path = settings
            .get_string("catalog.path")
            .or_else(|_| env::var("CATALOG_PATH"))
            .ok();

        let mongo_uri = settings
            .get_string("database.mongo_uri")
            .or_else(|_| env::var("MONGO_URI"))
            .ok();

        let mongo_database = settings
            .get_string("database.mongo_database")
            .or_else(|_| env::var("MONGO_DATABASE"))
            .unwrap_or_else(|_| "sqlpractice".to_string());

        let redis_uri = settings
            .get_string("redis.uri")
            .or_else(|_| env::var("REDIS_URI"))
            .ok();

        let jwt_secret = match settings
            .get_string("auth.jwt_secret")
            .or_else(|_| env::var("JWT_SECRET"))
        {
            Ok(secret) => secret,
            Err(_) if env == "prod" => {
                return Err(config::ConfigError::Message(
                    "JWT_SECRET must be set in production".to_string(),
                ))
            }
            Err(_) => {
                eprintln!("WARNING: Using default JWT_SECRET (dev mode only!)");
                "dev-secret-only-for-local-testing".to_string()
            }
        };

        Ok(Config {
            dataset_path,
            table_name,
            bind_address,
            row_limit,
            query_timeout_ms,
            catalog_path,
            mongo_uri,
            mongo_database,
            redis_uri,
            jwt_secret,
        })
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

impl Default for Config {
    /// In-memory stores, bundled catalog, defaults everywhere else.
    fn default() -> Self {
        Self {
            dataset_path: "data/stores.db".to_string(),
            table_name: "stores".to_string(),
            bind_address: "0.0.0.0:3001".to_string(),
            row_limit: DEFAULT_ROW_LIMIT,
            query_timeout_ms: DEFAULT_QUERY_TIMEOUT_MS,
            catalog_path: None,
            mongo_uri: None,
            mongo_database: "sqlpractice".to_string(),
            redis_uri: None,
            jwt_secret: "dev-secret-only-for-local-testing".to_string(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>, config::ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| config::ConfigError::Message(format!("{} is not a valid number", key))),
        Err(_) => Ok(None),
    }
}
