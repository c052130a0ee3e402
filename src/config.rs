use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::ml::ClassLabel;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,
    /// HTTP port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins (empty = any origin)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Directory holding both artifacts
    #[serde(default = "default_model_dir")]
    pub dir: PathBuf,
    /// Serialized classifier file name
    #[serde(default = "default_model_file")]
    pub model_file: String,
    /// Ordered feature-column list file name
    #[serde(default = "default_columns_file")]
    pub columns_file: String,
    /// Class whose probability is reported; overrides the artifact's own
    /// declaration when set
    #[serde(default)]
    pub positive_class: Option<ClassLabel>,
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_model_file() -> String {
    "modelo_reingreso.json".to_string()
}

fn default_columns_file() -> String {
    "model_columns.json".to_string()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            dir: default_model_dir(),
            model_file: default_model_file(),
            columns_file: default_columns_file(),
            positive_class: None,
        }
    }
}

impl ModelConfig {
    pub fn model_path(&self) -> PathBuf {
        self.dir.join(&self.model_file)
    }

    pub fn columns_path(&self) -> PathBuf {
        self.dir.join(&self.columns_file)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
    /// Directory for daily rotating log files (console only when unset)
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            dir: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from a specific directory, then the environment
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("REINGRESO_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (REINGRESO__SERVER__PORT, etc.)
            .add_source(
                Environment::with_prefix("REINGRESO")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins"),
            );

        Ok(builder.build()?.try_deserialize()?)
    }
}
