//! Runtime configuration for survey core hosts.
//!
//! # Responsibility
//! - Load settings from a JSON file or from `SURVEY_*` environment variables.
//! - Validate settings before any database or logger is touched.
//!
//! # Invariants
//! - Missing keys fall back to defaults; unknown JSON keys are rejected.
//! - `log_level` is normalized to one of `trace|debug|info|warn|error`.
//! - `log_dir`, when set, is absolute.

use crate::ingest::submission::IngestPolicy;
use crate::logging::{default_log_level, normalize_level};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_DB_PATH: &str = "SURVEY_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "SURVEY_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "SURVEY_LOG_DIR";
pub const ENV_TRUST_FORWARDED_FOR: &str = "SURVEY_TRUST_FORWARDED_FOR";
pub const ENV_ENFORCE_OPTION_MEMBERSHIP: &str = "SURVEY_ENFORCE_OPTION_MEMBERSHIP";

/// Settings shared by every host embedding the core.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// SQLite file; `None` opens an in-memory database.
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    /// Directory for rolling log files; `None` leaves logging uninitialized.
    pub log_dir: Option<PathBuf>,
    pub trust_forwarded_for: bool,
    pub enforce_option_membership: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
            trust_forwarded_for: true,
            enforce_option_membership: false,
        }
    }
}

impl CoreConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validated()
    }

    /// Reads and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Builds config from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds config from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(value) = read(ENV_DB_PATH) {
            config.db_path = Some(PathBuf::from(value));
        }
        if let Some(value) = read(ENV_LOG_LEVEL) {
            config.log_level = value;
        }
        if let Some(value) = read(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = read(ENV_TRUST_FORWARDED_FOR) {
            config.trust_forwarded_for = parse_flag(ENV_TRUST_FORWARDED_FOR, &value)?;
        }
        if let Some(value) = read(ENV_ENFORCE_OPTION_MEMBERSHIP) {
            config.enforce_option_membership = parse_flag(ENV_ENFORCE_OPTION_MEMBERSHIP, &value)?;
        }
        config.validated()
    }

    /// Ingest rules derived from this config.
    pub fn ingest_policy(&self) -> IngestPolicy {
        IngestPolicy {
            trust_forwarded_for: self.trust_forwarded_for,
            enforce_option_membership: self.enforce_option_membership,
        }
    }

    fn validated(mut self) -> Result<Self, ConfigError> {
        self.log_level = normalize_level(&self.log_level)
            .map_err(|_| ConfigError::InvalidLogLevel(self.log_level.clone()))?
            .to_string();
        if let Some(dir) = self.log_dir.as_ref() {
            if !dir.is_absolute() {
                return Err(ConfigError::RelativeLogDir(dir.clone()));
            }
        }
        Ok(self)
    }
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}

/// Errors raised while loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    InvalidValue {
        key: &'static str,
        value: String,
    },
    InvalidLogLevel(String),
    RelativeLogDir(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config document: {err}"),
            Self::InvalidValue { key, value } => {
                write!(f, "invalid value `{value}` for {key}; expected true|false")
            }
            Self::InvalidLogLevel(level) => write!(
                f,
                "unsupported log level `{level}`; expected trace|debug|info|warn|error"
            ),
            Self::RelativeLogDir(dir) => {
                write!(f, "log_dir must be an absolute path, got `{}`", dir.display())
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, ENV_LOG_LEVEL, ENV_TRUST_FORWARDED_FOR};
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn empty_document_uses_defaults() {
        let config = CoreConfig::from_json_str("{}").expect("empty config");
        assert_eq!(config, CoreConfig::default());
        assert!(config.ingest_policy().trust_forwarded_for);
        assert!(!config.ingest_policy().enforce_option_membership);
    }

    #[test]
    fn unknown_keys_and_bad_levels_are_rejected() {
        let err = CoreConfig::from_json_str(r#"{ "db": "x" }"#).expect_err("unknown key");
        assert!(matches!(err, ConfigError::Parse(_)));

        let err = CoreConfig::from_json_str(r#"{ "log_level": "loud" }"#).expect_err("bad level");
        assert!(matches!(err, ConfigError::InvalidLogLevel(_)));

        let err = CoreConfig::from_json_str(r#"{ "log_dir": "logs" }"#).expect_err("relative dir");
        assert!(matches!(err, ConfigError::RelativeLogDir(_)));
    }

    #[test]
    fn environment_lookup_overrides_defaults() {
        let vars = HashMap::from([
            (ENV_LOG_LEVEL, "WARNING"),
            (ENV_TRUST_FORWARDED_FOR, "off"),
            ("SURVEY_DB_PATH", " "),
        ]);
        let config = CoreConfig::from_lookup(|key| vars.get(key).map(|value| value.to_string()))
            .expect("env config");
        assert_eq!(config.log_level, "warn");
        assert!(!config.trust_forwarded_for);
        assert_eq!(config.db_path, None);

        let vars = HashMap::from([(ENV_TRUST_FORWARDED_FOR, "maybe")]);
        let err = CoreConfig::from_lookup(|key| vars.get(key).map(|value| value.to_string()))
            .expect_err("bad flag");
        assert!(err.to_string().contains(ENV_TRUST_FORWARDED_FOR));
    }

    #[test]
    fn load_reads_json_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{ "db_path": "/tmp/survey.sqlite3", "enforce_option_membership": true }}"#
        )
        .expect("write config");

        let config = CoreConfig::load(file.path()).expect("load config");
        assert_eq!(
            config.db_path.as_deref(),
            Some(std::path::Path::new("/tmp/survey.sqlite3"))
        );
        assert!(config.enforce_option_membership);
    }
}
