use crate::shared::inbound::request_context::SlowRequestThresholds;
use crate::shared::infrastructure::database::sql::SqlPoolSettings;
use crate::shared::infrastructure::resilience::ResilienceConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/settings.toml";
const ENV_PREFIX: &str = "SAMPLE_TASKS_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {error}")]
    Io { path: String, error: String },

    #[error("failed to parse configuration: {0}")]
    Parse(String),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    pub fn include_diagnostics(self) -> bool {
        self != Environment::Production
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Environment::Development),
            "staging" => Some(Environment::Staging),
            "production" | "prod" => Some(Environment::Production),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: String,
    pub database_name: String,
    pub connect_timeout_secs: u64,
    pub command_timeout_secs: u64,
    pub min_pool_size: u32,
    pub max_pool_size: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "sqlite://sample_tasks.db".to_string(),
            database_name: "sample_tasks".to_string(),
            connect_timeout_secs: 30,
            command_timeout_secs: 30,
            min_pool_size: 1,
            max_pool_size: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResilienceSettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub failure_threshold: u32,
    pub break_duration_secs: u64,
    pub operation_timeout_secs: u64,
}

impl Default for ResilienceSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            failure_threshold: 5,
            break_duration_secs: 60,
            operation_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub filter: String,
    pub slow_request_warn_ms: u64,
    pub slow_request_error_ms: u64,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info,sqlx=warn,tower_http=info".to_string(),
            slow_request_warn_ms: 1000,
            slow_request_error_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub environment: Environment,
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub resilience: ResilienceSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(format!("{ENV_PREFIX}CONFIG"))
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        let mut settings = if path.exists() {
            Self::from_toml(&read(&path)?)?
        } else {
            Self::default()
        };

        let environment = match std::env::var(format!("{ENV_PREFIX}ENVIRONMENT")) {
            Ok(value) => Environment::parse(&value).ok_or(ConfigError::InvalidValue {
                key: format!("{ENV_PREFIX}ENVIRONMENT"),
                value,
            })?,
            Err(_) => settings.environment,
        };
        let overlay = overlay_path(&path, environment);
        if overlay.exists() {
            settings = settings.merge_toml(&read(&overlay)?)?;
        }

        settings.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::from_toml(&read(path.as_ref())?)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Layers `content` over the current values. Keys missing from `content` keep their value.
    pub fn merge_toml(&self, content: &str) -> Result<Self, ConfigError> {
        let mut base =
            toml::Value::try_from(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let overlay: toml::Table =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        merge(&mut base, toml::Value::Table(overlay));
        let merged: Settings = base
            .try_into()
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(merged)
    }

    fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(value) = var("ENVIRONMENT") {
            self.environment = Environment::parse(&value).ok_or(ConfigError::InvalidValue {
                key: format!("{ENV_PREFIX}ENVIRONMENT"),
                value,
            })?;
        }
        if let Some(host) = var("SERVER_HOST") {
            self.server.host = host;
        }
        override_parsed(&var, "SERVER_PORT", &mut self.server.port)?;

        if let Some(url) = var("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(name) = var("DATABASE_NAME") {
            self.database.database_name = name;
        }
        let database = &mut self.database;
        override_parsed(&var, "DATABASE_CONNECT_TIMEOUT_SECS", &mut database.connect_timeout_secs)?;
        override_parsed(&var, "DATABASE_COMMAND_TIMEOUT_SECS", &mut database.command_timeout_secs)?;
        override_parsed(&var, "DATABASE_MIN_POOL_SIZE", &mut database.min_pool_size)?;
        override_parsed(&var, "DATABASE_MAX_POOL_SIZE", &mut database.max_pool_size)?;

        let resilience = &mut self.resilience;
        override_parsed(&var, "RESILIENCE_MAX_ATTEMPTS", &mut resilience.max_attempts)?;
        override_parsed(&var, "RESILIENCE_BASE_DELAY_MS", &mut resilience.base_delay_ms)?;
        override_parsed(&var, "RESILIENCE_FAILURE_THRESHOLD", &mut resilience.failure_threshold)?;
        override_parsed(
            &var,
            "RESILIENCE_BREAK_DURATION_SECS",
            &mut resilience.break_duration_secs,
        )?;
        override_parsed(&var, "RESILIENCE_TIMEOUT_SECS", &mut resilience.operation_timeout_secs)?;

        if let Some(filter) = var("LOG_FILTER") {
            self.logging.filter = filter;
        }
        let logging = &mut self.logging;
        override_parsed(&var, "LOG_SLOW_REQUEST_WARN_MS", &mut logging.slow_request_warn_ms)?;
        override_parsed(&var, "LOG_SLOW_REQUEST_ERROR_MS", &mut logging.slow_request_error_ms)?;
        Ok(())
    }

    pub fn resilience_config(&self) -> ResilienceConfig {
        ResilienceConfig {
            max_attempts: self.resilience.max_attempts.max(1),
            base_delay: Duration::from_millis(self.resilience.base_delay_ms),
            failure_threshold: self.resilience.failure_threshold.max(1),
            break_duration: Duration::from_secs(self.resilience.break_duration_secs),
            operation_timeout: Duration::from_secs(self.resilience.operation_timeout_secs),
        }
    }

    pub fn pool_settings(&self) -> SqlPoolSettings {
        SqlPoolSettings {
            url: self.database.url.clone(),
            min_connections: self.database.min_pool_size,
            max_connections: self.database.max_pool_size.max(1),
            connect_timeout: Duration::from_secs(self.database.connect_timeout_secs),
            command_timeout: Duration::from_secs(self.database.command_timeout_secs),
        }
    }

    pub fn slow_request_thresholds(&self) -> SlowRequestThresholds {
        SlowRequestThresholds {
            warn: Duration::from_millis(self.logging.slow_request_warn_ms),
            error: Duration::from_millis(self.logging.slow_request_error_ms),
        }
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        error: e.to_string(),
    })
}

fn overlay_path(base: &Path, environment: Environment) -> PathBuf {
    base.with_file_name(format!("settings.{}.toml", environment.as_str()))
}

fn override_parsed<T: std::str::FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    name: &str,
    target: &mut T,
) -> Result<(), ConfigError> {
    if let Some(value) = var(name) {
        *target = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: format!("{ENV_PREFIX}{name}"),
            value,
        })?;
    }
    Ok(())
}

fn merge(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn it_should_default_every_section() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.resilience.max_attempts, 3);
        assert_eq!(settings.logging.slow_request_warn_ms, 1000);
        assert_eq!(settings.server.address(), "0.0.0.0:8080");
    }

    #[test]
    fn it_should_read_partial_sections() {
        let settings = Settings::from_toml(
            r#"
            environment = "production"

            [server]
            port = 9090

            [resilience]
            base_delay_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(settings.environment, Environment::Production);
        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(
            settings.resilience_config().base_delay,
            Duration::from_millis(250)
        );
        assert_eq!(settings.resilience.failure_threshold, 5);
    }

    #[test]
    fn it_should_reject_malformed_toml() {
        assert!(matches!(
            Settings::from_toml("server = ["),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn it_should_layer_an_overlay_over_the_base() {
        let base = Settings::from_toml("[database]\nurl = \"sqlite://base.db\"\nmax_pool_size = 4")
            .unwrap();

        let merged = base
            .merge_toml("[database]\nurl = \"sqlite://staging.db\"")
            .unwrap();

        assert_eq!(merged.database.url, "sqlite://staging.db");
        assert_eq!(merged.database.max_pool_size, 4);
    }

    #[test]
    fn it_should_let_environment_variables_win() {
        let mut settings = Settings::default();
        settings
            .apply_env_overrides(lookup(&[
                ("SAMPLE_TASKS_SERVER_PORT", "7000"),
                ("SAMPLE_TASKS_DATABASE_URL", "sqlite::memory:"),
                ("SAMPLE_TASKS_ENVIRONMENT", "prod"),
                ("SAMPLE_TASKS_LOG_SLOW_REQUEST_ERROR_MS", "9000"),
            ]))
            .unwrap();

        assert_eq!(settings.server.port, 7000);
        assert_eq!(settings.database.url, "sqlite::memory:");
        assert_eq!(settings.environment, Environment::Production);
        assert_eq!(
            settings.slow_request_thresholds().error,
            Duration::from_millis(9000)
        );
    }

    #[test]
    fn it_should_name_the_variable_that_failed_to_parse() {
        let mut settings = Settings::default();
        let result =
            settings.apply_env_overrides(lookup(&[("SAMPLE_TASKS_SERVER_PORT", "eighty")]));

        match result {
            Err(ConfigError::InvalidValue { key, value }) => {
                assert_eq!(key, "SAMPLE_TASKS_SERVER_PORT");
                assert_eq!(value, "eighty");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[rstest]
    #[case(Environment::Development, true)]
    #[case(Environment::Staging, true)]
    #[case(Environment::Production, false)]
    fn it_should_only_expose_diagnostics_outside_production(
        #[case] environment: Environment,
        #[case] diagnostics: bool,
    ) {
        assert_eq!(environment.include_diagnostics(), diagnostics);
    }

    #[test]
    fn it_should_place_the_overlay_next_to_the_base_file() {
        assert_eq!(
            overlay_path(Path::new("config/settings.toml"), Environment::Staging),
            PathBuf::from("config/settings.staging.toml")
        );
    }
}
