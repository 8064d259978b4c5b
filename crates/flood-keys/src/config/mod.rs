use crate::lookup::DEFAULT_USER_VULNERABILITY_COLUMN;
use std::env;
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_DATA_DIR: &str = "keys_data/UK_FLOOD";
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

/// Distinguishes runtime behavior for different stages of a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for a keys run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub keys: KeysConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let chunk_size = match non_empty_var("KEYS_CHUNK_SIZE") {
            Some(value) => match value.trim().parse::<usize>() {
                Ok(size) if size > 0 => size,
                _ => return Err(ConfigError::InvalidChunkSize { value }),
            },
            None => DEFAULT_CHUNK_SIZE,
        };

        let user_vulnerability_column = non_empty_var("KEYS_USER_VULNERABILITY_COLUMN")
            .unwrap_or_else(|| DEFAULT_USER_VULNERABILITY_COLUMN.to_string());
        if user_vulnerability_column.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidColumn {
                value: user_vulnerability_column,
            });
        }

        let keys = KeysConfig {
            data_dir: non_empty_var("KEYS_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            user_data_dir: non_empty_var("KEYS_USER_DATA_DIR").map(PathBuf::from),
            output_dir: non_empty_var("KEYS_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            chunk_size,
            user_vulnerability_column,
        };

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            keys,
            telemetry: TelemetryConfig { log_level },
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Where reference data is read from and keys are written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeysConfig {
    pub data_dir: PathBuf,
    pub user_data_dir: Option<PathBuf>,
    pub output_dir: PathBuf,
    /// Locations per parallel work unit.
    pub chunk_size: usize,
    pub user_vulnerability_column: String,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidChunkSize { value: String },
    InvalidColumn { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidChunkSize { value } => write!(
                f,
                "KEYS_CHUNK_SIZE must be a positive integer, got '{}'",
                value
            ),
            ConfigError::InvalidColumn { value } => write!(
                f,
                "KEYS_USER_VULNERABILITY_COLUMN must be a single column name, got '{}'",
                value
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for name in [
            "APP_ENV",
            "APP_LOG_LEVEL",
            "KEYS_DATA_DIR",
            "KEYS_USER_DATA_DIR",
            "KEYS_OUTPUT_DIR",
            "KEYS_CHUNK_SIZE",
            "KEYS_USER_VULNERABILITY_COLUMN",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.keys.data_dir, PathBuf::from("keys_data/UK_FLOOD"));
        assert_eq!(config.keys.user_data_dir, None);
        assert_eq!(config.keys.output_dir, PathBuf::from("."));
        assert_eq!(config.keys.chunk_size, 10_000);
        assert_eq!(config.keys.user_vulnerability_column, "locuserdef1");
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn reads_directories_and_chunk_size() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "prod");
        env::set_var("KEYS_DATA_DIR", "/srv/keys/UK_FLOOD");
        env::set_var("KEYS_USER_DATA_DIR", "/srv/run/user_data");
        env::set_var("KEYS_CHUNK_SIZE", " 250 ");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.environment, AppEnvironment::Production);
        assert_eq!(config.keys.data_dir, PathBuf::from("/srv/keys/UK_FLOOD"));
        assert_eq!(
            config.keys.user_data_dir,
            Some(PathBuf::from("/srv/run/user_data"))
        );
        assert_eq!(config.keys.chunk_size, 250);
        reset_env();
    }

    #[test]
    fn rejects_zero_chunk_size() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("KEYS_CHUNK_SIZE", "0");
        let error = AppConfig::load().expect_err("zero chunk size");
        assert!(matches!(error, ConfigError::InvalidChunkSize { ref value } if value == "0"));
        reset_env();
    }
}
