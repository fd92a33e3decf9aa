//! Application configuration loaded from environment variables.

use std::path::PathBuf;

use crate::errors::{Result, ServerError};

#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite database file
    pub database_url: String,
    /// Port for the REST API server
    pub api_port: u16,
    /// Quest catalog JSON file; the built-in catalog is used when unset
    pub quest_catalog_path: Option<PathBuf>,
    /// Prefix of every per-user storage key (`{prefix}:{user_id}`)
    pub storage_key_prefix: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let storage_key_prefix = env_var("STORAGE_KEY_PREFIX")
            .unwrap_or_else(|_| carbonmax_progress::storage::DEFAULT_STORAGE_KEY.to_string());
        if storage_key_prefix.trim().is_empty() {
            return Err(ServerError::Config(
                "STORAGE_KEY_PREFIX must not be empty".to_string(),
            ));
        }

        Ok(Config {
            database_url: env_var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:./carbonmax.db".to_string()),
            api_port: env_var("API_PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .map_err(|_| ServerError::Config("Invalid API_PORT".to_string()))?,
            quest_catalog_path: env_var("QUEST_CATALOG_PATH").ok().map(PathBuf::from),
            storage_key_prefix,
        })
    }
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| ServerError::Config(format!("Missing env var: {key}")))
}
