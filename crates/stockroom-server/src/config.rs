use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logging: LogSettings,

    #[serde(default)]
    pub telemetry: TelemetryConfig,

    #[serde(default)]
    pub request: RequestConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_environment")]
    pub environment: String,

    /// Directory for the rotating file sink; unset means stdout only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,

    #[serde(default = "default_log_max_size_mb")]
    pub max_size_mb: u64,

    #[serde(default = "default_log_max_backups")]
    pub max_backups: usize,

    #[serde(default = "default_log_max_age_days")]
    pub max_age_days: u64,

    #[serde(default = "default_log_compress")]
    pub compress: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// OTLP collector endpoint; unset means spans go to the log
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otlp_endpoint: Option<String>,

    #[serde(default = "default_service_name")]
    pub service_name: String,

    #[serde(default = "default_batch_timeout_secs")]
    pub batch_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Wall-clock budget for one request, in seconds
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database: DatabaseConfig::default(),
            logging: LogSettings::default(),
            telemetry: TelemetryConfig::default(),
            request: RequestConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            environment: default_environment(),
            directory: None,
            max_size_mb: default_log_max_size_mb(),
            max_backups: default_log_max_backups(),
            max_age_days: default_log_max_age_days(),
            compress: default_log_compress(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            otlp_endpoint: None,
            service_name: default_service_name(),
            batch_timeout_secs: default_batch_timeout_secs(),
        }
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            deadline_secs: default_deadline_secs(),
        }
    }
}

impl ServerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        let config = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::from_str(&contents)?
        } else {
            // Default to YAML
            serde_yaml::from_str(&contents)?
        };

        Ok(config)
    }

    /// Merge environment variables into config (env vars take precedence)
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("HOST") {
            self.host = val;
        }
        if let Ok(val) = std::env::var("PORT") {
            match val.parse::<u16>() {
                Ok(port) => self.port = port,
                Err(_) => eprintln!("Warning: Invalid PORT '{}', using {}", val, self.port),
            }
        }
        if let Ok(val) = std::env::var("SQLITE3_PATH") {
            self.database.path = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("ENVIRONMENT") {
            self.logging.environment = val;
        }
        if let Ok(val) = std::env::var("LOG_DIR") {
            self.logging.directory = Some(PathBuf::from(val));
        }
        if let Ok(val) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
            self.telemetry.otlp_endpoint = Some(val);
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_db_path() -> PathBuf {
    PathBuf::from("stockroom.db")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_log_max_size_mb() -> u64 {
    1024
}

fn default_log_max_backups() -> usize {
    30
}

fn default_log_max_age_days() -> u64 {
    90
}

fn default_log_compress() -> bool {
    true
}

fn default_service_name() -> String {
    "stockroom".to_string()
}

fn default_batch_timeout_secs() -> u64 {
    1
}

fn default_deadline_secs() -> u64 {
    5
}
