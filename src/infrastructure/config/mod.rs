use crate::domain::error::{AppError, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

pub const DEFAULT_CONFIG_FILE: &str = "analytics.toml";
pub const ENV_PREFIX: &str = "ANALYTICS_";

/// Process-wide settings, built once at startup and handed to each
/// component explicitly.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    pub host: String,
    #[validate(range(min = 1))]
    pub port: u16,
    #[validate(length(min = 1))]
    pub database_url: String,
    #[validate(range(min = 1))]
    pub db_max_connections: u32,
    pub upload_folder: PathBuf,
    /// Upper bound for a single uploaded file, in bytes.
    #[validate(range(min = 1))]
    pub max_content_length: usize,
    #[validate(length(min = 1))]
    pub allowed_extensions: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            database_url: "sqlite://analytics.db".to_string(),
            db_max_connections: 5,
            upload_folder: PathBuf::from("uploads"),
            max_content_length: 16 * 1024 * 1024,
            allowed_extensions: vec!["csv".to_string(), "xlsx".to_string(), "xls".to_string()],
        }
    }
}

impl AppConfig {
    /// Defaults, then `analytics.toml`, then `DATABASE_URL`/`UPLOAD_FOLDER`,
    /// then `ANALYTICS_*` variables. A `.env` file is loaded first.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_figment(Self::figment(DEFAULT_CONFIG_FILE))
    }

    pub fn figment(config_file: &str) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(config_file))
            .merge(Env::raw().only(&["database_url", "upload_folder"]))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: AppConfig = figment
            .extract()
            .map_err(|e| AppError::ValidationError(format!("Invalid configuration: {}", e)))?;
        config
            .validate()
            .map_err(|e| AppError::ValidationError(format!("Invalid configuration: {}", e)))?;
        Ok(config)
    }

    pub fn is_allowed_file(&self, filename: &str) -> bool {
        crate::infrastructure::tabular::extension_of(filename)
            .map(|ext| self.allowed_extensions.iter().any(|a| a.eq_ignore_ascii_case(&ext)))
            .unwrap_or(false)
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}
