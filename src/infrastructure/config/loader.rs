use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("MongoDB URI cannot be empty")]
    EmptyUri,

    #[error("Invalid MongoDB URI: {0}. Must start with mongodb:// or mongodb+srv://")]
    InvalidUri(String),

    #[error("Database name cannot be empty")]
    EmptyDatabaseName,

    #[error("Invalid database name: {0}. Must not contain '/', '\\', '.', '\"', '$' or spaces")]
    InvalidDatabaseName(String),

    #[error("Invalid {0}: must be greater than 0")]
    ZeroTimeout(&'static str),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must not exceed max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),
}

/// Project-local configuration directory
pub const CONFIG_DIR: &str = ".testbench";
/// Environment variable prefix
pub const ENV_PREFIX: &str = "TESTBENCH_";

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .testbench/config.yaml (project config)
    /// 3. .testbench/local.yaml (project local overrides, optional)
    /// 4. Environment variables (TESTBENCH_* prefix, `__` separates nested keys)
    pub fn load() -> Result<Config> {
        Self::load_with(None)
    }

    /// Like [`load`](Self::load), with an extra file merged after the project
    /// files and before the environment.
    pub fn load_with(extra: Option<&Path>) -> Result<Config> {
        let mut figment = Self::base();
        if let Some(path) = extra {
            anyhow::ensure!(path.exists(), "config file {} not found", path.display());
            figment = figment.merge(Yaml::file(path));
        }

        let config: Config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, without environment overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn base() -> Figment {
        let dir = Path::new(CONFIG_DIR);
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let mongodb = &config.mongodb;
        if mongodb.uri.trim().is_empty() {
            return Err(ConfigError::EmptyUri);
        }
        if !(mongodb.uri.starts_with("mongodb://") || mongodb.uri.starts_with("mongodb+srv://")) {
            return Err(ConfigError::InvalidUri(mongodb.uri.clone()));
        }

        if mongodb.database.is_empty() {
            return Err(ConfigError::EmptyDatabaseName);
        }
        if mongodb
            .database
            .chars()
            .any(|c| matches!(c, '/' | '\\' | '.' | '"' | '$' | ' ' | '\0'))
        {
            return Err(ConfigError::InvalidDatabaseName(mongodb.database.clone()));
        }

        if mongodb.connect_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("connect_timeout_ms"));
        }
        if mongodb.server_selection_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("server_selection_timeout_ms"));
        }

        let retry = &config.retry;
        if retry.initial_backoff_ms == 0 {
            return Err(ConfigError::ZeroTimeout("initial_backoff_ms"));
        }
        if retry.initial_backoff_ms > retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                retry.initial_backoff_ms,
                retry.max_backoff_ms,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.mongodb.uri, "mongodb://localhost:27017");
        assert_eq!(config.mongodb.database, "pocket-ml-testbench");
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.log_dir.is_none());
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
mongodb:
  uri: mongodb://mongodb:27017/?replicaSet=devRs
  database: staging-testbench
retry:
  max_elapsed_ms: 60000
logging:
  level: debug
  format: json
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.mongodb.uri, "mongodb://mongodb:27017/?replicaSet=devRs");
        assert_eq!(config.mongodb.database, "staging-testbench");
        assert_eq!(config.mongodb.app_name, "testbench-db");
        assert_eq!(config.retry.max_elapsed_ms, 60_000);
        assert_eq!(config.retry.initial_backoff_ms, 500);
        assert_eq!(config.logging.format, "json");

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_invalid_uri_scheme() {
        let mut config = Config::default();
        config.mongodb.uri = "postgres://localhost".to_string();

        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidUri(uri) => assert_eq!(uri, "postgres://localhost"),
            other => panic!("Expected InvalidUri error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_srv_uri() {
        let mut config = Config::default();
        config.mongodb.uri = "mongodb+srv://cluster0.example.net".to_string();
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_validate_invalid_database_name() {
        let mut config = Config::default();
        config.mongodb.database = "pocket.ml".to_string();

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidDatabaseName(_))
        ));

        config.mongodb.database = String::new();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::EmptyDatabaseName)
        ));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.mongodb.server_selection_timeout_ms = 0;

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::ZeroTimeout("server_selection_timeout_ms"))
        ));
    }

    #[test]
    fn test_validate_invalid_backoff() {
        let mut config = Config::default();
        config.retry.initial_backoff_ms = 30_000;
        config.retry.max_backoff_ms = 10_000;

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidBackoff(30_000, 10_000))
        ));
    }

    #[test]
    fn test_validate_invalid_log_level_and_format() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogLevel(_))
        ));

        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidLogFormat(format) => assert_eq!(format, "xml"),
            other => panic!("Expected InvalidLogFormat error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "mongodb:\n  uri: mongodb://db.internal:27017\n  database: testbench-ci"
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(file.path()).expect("should load");
        assert_eq!(config.mongodb.uri, "mongodb://db.internal:27017");
        assert_eq!(config.mongodb.database, "testbench-ci");
        assert_eq!(config.retry.max_backoff_ms, 10_000);
    }

    #[test]
    fn test_load_from_file_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "logging:\n  format: xml").unwrap();

        assert!(ConfigLoader::load_from_file(file.path()).is_err());
    }

    #[test]
    fn test_env_override() {
        temp_env::with_vars(
            [
                ("TESTBENCH_MONGODB__URI", Some("mongodb://mongodb:27017")),
                ("TESTBENCH_MONGODB__DATABASE", Some("env-testbench")),
                ("TESTBENCH_LOGGING__LEVEL", Some("debug")),
            ],
            || {
                let config = ConfigLoader::load().expect("should load");
                assert_eq!(config.mongodb.uri, "mongodb://mongodb:27017");
                assert_eq!(config.mongodb.database, "env-testbench");
                assert_eq!(config.logging.level, "debug");
            },
        );
    }

    #[test]
    fn test_env_overrides_extra_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "mongodb:\n  database: from-file\n  app_name: from-file").unwrap();

        temp_env::with_var("TESTBENCH_MONGODB__DATABASE", Some("from-env"), || {
            let config = ConfigLoader::load_with(Some(file.path())).expect("should load");
            assert_eq!(config.mongodb.database, "from-env");
            assert_eq!(config.mongodb.app_name, "from-file");
        });
    }

    #[test]
    fn test_missing_extra_file_is_an_error() {
        let err = ConfigLoader::load_with(Some(Path::new("/nonexistent/testbench.yaml")))
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
