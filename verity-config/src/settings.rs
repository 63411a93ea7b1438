// Engine and logging settings

use crate::{ConfigError, ConfigLoader, EnvLoader, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use verity_log::{Format, Level, LogConfig};
use verity_validation::{Engine, EngineConfig, UnknownFieldPolicy};

/// Everything a validation service is configured with
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub engine: EngineSettings,
    pub log: LogSettings,
}

/// Engine options as they appear in a settings file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub unknown_fields: UnknownFieldPolicy,
    pub accept_integral_floats: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        let config = EngineConfig::default();
        Self {
            unknown_fields: config.unknown_fields,
            accept_integral_floats: config.accept_integral_floats,
        }
    }
}

/// Log options as they appear in a settings file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
    pub format: String,
    pub debug: bool,
    pub timestamps: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
            debug: false,
            timestamps: true,
        }
    }
}

impl Settings {
    /// Deserialize from an already-parsed value
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| ConfigError::DeserializationError(e.to_string()))
    }

    /// Read a JSON or TOML settings file
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let value = ConfigLoader::auto(path)?.load_file(path)?;
        Self::from_value(value)
    }

    /// Layer a JSON or TOML settings file over these settings
    ///
    /// Keys present in the file replace the current values; the rest are kept.
    pub fn merge_file(&self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let overlay = ConfigLoader::auto(path)?.load_file(path)?;
        self.merge_value(overlay)
    }

    /// Layer an already-parsed settings value over these settings
    pub fn merge_value(&self, overlay: Value) -> Result<Self> {
        let mut base = serde_json::to_value(self)
            .map_err(|e| ConfigError::DeserializationError(e.to_string()))?;
        merge_values(&mut base, overlay);
        Self::from_value(base)
    }

    /// Override file settings with environment variables
    ///
    /// Reads `UNKNOWN_FIELDS`, `ACCEPT_INTEGRAL_FLOATS`, `LOG_LEVEL`,
    /// `LOG_FORMAT` and `DEBUG` under the loader's prefix.
    pub fn apply_env(&mut self, env: &EnvLoader) -> Result<()> {
        if let Some(policy) = env.get("unknown_fields") {
            self.engine.unknown_fields = parse_policy(&policy)?;
        }
        if let Some(flag) = env.get("accept_integral_floats") {
            self.engine.accept_integral_floats = parse_flag("accept_integral_floats", &flag)?;
        }
        if let Some(level) = env.get("log_level") {
            self.log.level = level;
        }
        if let Some(format) = env.get("log_format") {
            self.log.format = format;
        }
        if let Some(flag) = env.get("debug") {
            self.log.debug = parse_flag("debug", &flag)?;
        }
        Ok(())
    }

    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig {
            unknown_fields: self.engine.unknown_fields,
            accept_integral_floats: self.engine.accept_integral_floats,
        }
    }

    pub fn engine(&self) -> Engine {
        Engine::new(self.to_engine_config())
    }

    /// Translate log settings, rejecting unknown level or format names
    pub fn to_log_config(&self) -> Result<LogConfig> {
        let level = Level::parse(&self.log.level).ok_or_else(|| {
            ConfigError::ValidationError(format!("unknown log level '{}'", self.log.level))
        })?;
        let format = Format::parse(&self.log.format).ok_or_else(|| {
            ConfigError::ValidationError(format!("unknown log format '{}'", self.log.format))
        })?;

        Ok(LogConfig {
            debug: self.log.debug,
            level,
            format,
            timestamps: self.log.timestamps,
            ..LogConfig::default()
        })
    }

    /// Apply the log settings to the global logger
    pub fn install_logging(&self) -> Result<()> {
        verity_log::configure(self.to_log_config()?);
        Ok(())
    }
}

// Objects merge key by key; anything else is replaced.
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn parse_policy(raw: &str) -> Result<UnknownFieldPolicy> {
    serde_json::from_value(Value::String(raw.trim().to_lowercase())).map_err(|_| {
        ConfigError::ValidationError(format!(
            "unknown_fields must be 'ignore' or 'forbid', got '{}'",
            raw
        ))
    })
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::ValidationError(format!(
            "{} must be a boolean, got '{}'",
            key, raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_match_engine_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.to_engine_config(), EngineConfig::default());
        assert_eq!(settings.to_log_config().unwrap().level, Level::Info);
    }

    #[test]
    fn test_merge_value_keeps_unset_keys() {
        let base = Settings {
            engine: EngineSettings {
                accept_integral_floats: false,
                ..EngineSettings::default()
            },
            ..Settings::default()
        };

        let merged = base
            .merge_value(json!({"engine": {"unknown_fields": "forbid"}, "log": {"level": "warn"}}))
            .unwrap();

        assert_eq!(merged.engine.unknown_fields, UnknownFieldPolicy::Forbid);
        assert!(!merged.engine.accept_integral_floats);
        assert_eq!(merged.log.level, "warn");
        assert_eq!(merged.log.format, "json");
    }

    #[test]
    fn test_merge_value_rejects_bad_types() {
        let result = Settings::default().merge_value(json!({"engine": {"accept_integral_floats": "no"}}));
        assert!(matches!(result, Err(ConfigError::DeserializationError(_))));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let settings = Settings::from_value(json!({"engine": {"unknown_fields": "forbid"}})).unwrap();

        assert_eq!(settings.engine.unknown_fields, UnknownFieldPolicy::Forbid);
        assert!(settings.engine.accept_integral_floats);
        assert_eq!(settings.log, LogSettings::default());
    }

    #[test]
    fn test_bad_policy_in_file() {
        let result = Settings::from_value(json!({"engine": {"unknown_fields": "drop"}}));
        assert!(matches!(result, Err(ConfigError::DeserializationError(_))));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut settings = Settings::from_value(json!({
            "engine": {"unknown_fields": "ignore", "accept_integral_floats": true},
            "log": {"level": "info"}
        }))
        .unwrap();

        let env = EnvLoader::default().with_vars([
            ("VERITY_UNKNOWN_FIELDS", "Forbid"),
            ("VERITY_ACCEPT_INTEGRAL_FLOATS", "false"),
            ("VERITY_LOG_LEVEL", "trace"),
            ("VERITY_LOG_FORMAT", "compact"),
        ]);
        settings.apply_env(&env).unwrap();

        let engine = settings.to_engine_config();
        assert_eq!(engine.unknown_fields, UnknownFieldPolicy::Forbid);
        assert!(!engine.accept_integral_floats);

        let log = settings.to_log_config().unwrap();
        assert_eq!(log.level, Level::Trace);
        assert_eq!(log.format, Format::Compact);
    }

    #[test]
    fn test_invalid_env_values() {
        let mut settings = Settings::default();
        let env = EnvLoader::default().with_vars([("VERITY_ACCEPT_INTEGRAL_FLOATS", "maybe")]);
        assert!(matches!(
            settings.apply_env(&env),
            Err(ConfigError::ValidationError(_))
        ));

        let env = EnvLoader::default().with_vars([("VERITY_UNKNOWN_FIELDS", "drop")]);
        assert!(settings.apply_env(&env).is_err());
    }

    #[test]
    fn test_unknown_log_level() {
        let mut settings = Settings::default();
        settings.log.level = "loud".to_string();
        assert!(matches!(
            settings.to_log_config(),
            Err(ConfigError::ValidationError(msg)) if msg.contains("loud")
        ));
    }
}
