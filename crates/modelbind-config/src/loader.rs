//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: defaults, files, inline strings and environment variables.

use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use modelbind_telemetry::LogFormat;
use serde_json::Value;

use crate::{ConfigError, ModelBindConfig};

/// Environment variable prefix used by [`ConfigLoader::with_env`].
pub const DEFAULT_ENV_PREFIX: &str = "MODELBIND";

/// Configuration loader with layered approach.
///
/// The loader applies configuration in layers, with later layers overriding
/// earlier ones:
/// 1. Default values or a preset
/// 2. Configuration files and strings (TOML or JSON), in the order added
/// 3. Environment variables
///
/// A layer only overrides the keys it sets; everything else keeps the value
/// from the layers below it.
///
/// # Example
///
/// ```no_run
/// use modelbind_config::ConfigLoader;
///
/// # fn main() -> Result<(), modelbind_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_production()
///     .with_optional_file("modelbind.toml")?
///     .with_env()
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: ModelBindConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader starting from defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ModelBindConfig::default(),
            env_prefix: None,
        }
    }

    /// Reset to default configuration values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = ModelBindConfig::default();
        self
    }

    /// Start with the development preset.
    ///
    /// # Example
    ///
    /// ```
    /// use modelbind_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = ModelBindConfig::development();
        self
    }

    /// Start with the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = ModelBindConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// The format is chosen by extension: `.toml` or `.json`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist or cannot be read
    /// - The extension is not `.toml` or `.json`
    /// - The file contains invalid TOML/JSON or unknown fields
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        self.with_string(&content, &extension)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in `format` (`"toml"` or `"json"`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the format is unknown or parsing fails.
    ///
    /// # Example
    ///
    /// ```
    /// use modelbind_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [form_limits]
    ///     value_count_limit = 64
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.form_limits.value_count_limit, 64);
    /// assert_eq!(config.form_limits.key_length_limit, 2048);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let layer = match format.to_lowercase().as_str() {
            "toml" => {
                // Parse into the typed config first so unknown fields surface
                // as TOML errors with line information.
                toml::from_str::<ModelBindConfig>(content)?;
                serde_json::to_value(toml::from_str::<toml::Value>(content)?)?
            }
            "json" => {
                serde_json::from_str::<ModelBindConfig>(content)?;
                serde_json::from_str::<Value>(content)?
            }
            _ => return Err(ConfigError::UnsupportedFormat(format.to_string())),
        };

        self.merge_layer(layer)?;
        Ok(self)
    }

    /// Apply overrides from environment variables with the `MODELBIND` prefix.
    #[must_use]
    pub fn with_env(self) -> Self {
        self.with_env_prefix(DEFAULT_ENV_PREFIX)
    }

    /// Set environment variable prefix for overrides.
    ///
    /// Environment variables use the format `PREFIX__SECTION__KEY`, for
    /// example:
    /// - `MODELBIND__BINDING__ALLOW_EMPTY_INPUT_IN_BODY_BINDING=true`
    /// - `MODELBIND__FORM_LIMITS__VALUE_COUNT_LIMIT=256`
    /// - `MODELBIND__LOGGING__LEVEL=debug`
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load variables from a `.env` file in the current directory, if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Dotenv` if the file exists but cannot be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(err) if err.not_found() => Ok(self),
            Err(err) => Err(err.into()),
        }
    }

    /// Load variables from a specific `.env` file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Dotenv` if the file is missing or malformed.
    pub fn with_dotenv_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        dotenvy::from_path(path.as_ref())?;
        Ok(self)
    }

    /// Finalize and return the loaded configuration.
    ///
    /// Applies environment variable overrides (if a prefix was set) and
    /// validates the result.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an environment variable cannot be parsed or
    /// validation fails.
    pub fn load(mut self) -> Result<ModelBindConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix, env::vars())?;
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Finalize without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> ModelBindConfig {
        self.config
    }

    fn merge_layer(&mut self, layer: Value) -> Result<(), ConfigError> {
        let mut merged = serde_json::to_value(&self.config)?;
        merge_values(&mut merged, layer);
        self.config = serde_json::from_value(merged)?;
        Ok(())
    }

    fn apply_env_overrides(
        &mut self,
        prefix: &str,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<(), ConfigError> {
        let scoped = format!("{prefix}__");
        for (key, value) in vars {
            if key.starts_with(&scoped) {
                self.apply_env_var(&key, &value, prefix)?;
            }
        }
        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let key_without_prefix = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let parts: Vec<&str> = key_without_prefix.split("__").collect();
        let binding = &mut self.config.binding;
        let limits = &mut self.config.form_limits;
        let logging = &mut self.config.logging;
        let metrics = &mut self.config.metrics;

        match parts.as_slice() {
            ["BINDING", "ALLOW_EMPTY_INPUT_IN_BODY_BINDING"] => {
                binding.allow_empty_input_in_body_binding = parse_bool_var(key, value)?;
            }
            ["BINDING", "SEND_BAD_REQUEST_FOR_ALL_FORMATTER_EXCEPTIONS"] => {
                binding.send_bad_request_for_all_formatter_exceptions = parse_bool_var(key, value)?;
            }

            ["FORM_LIMITS", "BUFFER_BODY"] => limits.buffer_body = parse_bool_var(key, value)?,
            ["FORM_LIMITS", "MEMORY_BUFFER_THRESHOLD"] => {
                limits.memory_buffer_threshold = parse_number(key, value)?;
            }
            ["FORM_LIMITS", "BUFFER_BODY_LENGTH_LIMIT"] => {
                limits.buffer_body_length_limit = parse_number(key, value)?;
            }
            ["FORM_LIMITS", "VALUE_COUNT_LIMIT"] => {
                limits.value_count_limit = parse_number(key, value)?;
            }
            ["FORM_LIMITS", "KEY_LENGTH_LIMIT"] => {
                limits.key_length_limit = parse_number(key, value)?;
            }
            ["FORM_LIMITS", "VALUE_LENGTH_LIMIT"] => {
                limits.value_length_limit = parse_number(key, value)?;
            }
            ["FORM_LIMITS", "MULTIPART_BOUNDARY_LENGTH_LIMIT"] => {
                limits.multipart_boundary_length_limit = parse_number(key, value)?;
            }
            ["FORM_LIMITS", "MULTIPART_HEADERS_COUNT_LIMIT"] => {
                limits.multipart_headers_count_limit = parse_number(key, value)?;
            }
            ["FORM_LIMITS", "MULTIPART_HEADERS_LENGTH_LIMIT"] => {
                limits.multipart_headers_length_limit = parse_number(key, value)?;
            }
            ["FORM_LIMITS", "MULTIPART_BODY_LENGTH_LIMIT"] => {
                limits.multipart_body_length_limit = parse_number(key, value)?;
            }

            ["LOGGING", "ENABLED"] => logging.enabled = parse_bool_var(key, value)?,
            ["LOGGING", "LEVEL"] => logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    "compact" => LogFormat::Compact,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json', 'pretty' or 'compact'",
                        ))
                    }
                };
            }
            ["LOGGING", "SPAN_EVENTS"] => logging.span_events = parse_bool_var(key, value)?,
            ["LOGGING", "INCLUDE_LOCATION"] => {
                logging.include_location = parse_bool_var(key, value)?;
            }

            ["METRICS", "ENABLED"] => metrics.enabled = parse_bool_var(key, value)?,
            ["METRICS", "SERVICE_NAME"] => metrics.service_name = value.to_string(),
            ["METRICS", "DURATION_BUCKETS"] => {
                metrics.duration_buckets = value
                    .split(',')
                    .map(str::trim)
                    .filter(|bucket| !bucket.is_empty())
                    .map(|bucket| parse_number(key, bucket))
                    .collect::<Result<_, _>>()?;
            }

            _ => tracing::warn!(var = key, "ignoring unknown configuration variable"),
        }

        Ok(())
    }
}

fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                merge_values(base.entry(key).or_insert(Value::Null), value);
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_bool_var(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, format!("expected number, got '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_loader_new() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, ModelBindConfig::default());
    }

    #[test]
    fn test_loader_with_production() {
        let config = ConfigLoader::new().with_production().load().unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.binding.send_bad_request_for_all_formatter_exceptions);
    }

    #[test]
    fn test_string_layer_keeps_preset_values() {
        let toml = r#"
            [logging]
            format = "compact"
        "#;

        let config = ConfigLoader::new()
            .with_development()
            .with_string(toml, "toml")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.span_events);
    }

    #[test]
    fn test_later_layers_win() {
        let config = ConfigLoader::new()
            .with_string(
                r#"{"form_limits": {"value_count_limit": 10, "key_length_limit": 20}}"#,
                "json",
            )
            .unwrap()
            .with_string("[form_limits]\nvalue_count_limit = 30", "toml")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.form_limits.value_count_limit, 30);
        assert_eq!(config.form_limits.key_length_limit, 20);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = ConfigLoader::new().with_string("[binding]\nallow_empty = true", "toml");
        assert!(matches!(result, Err(ConfigError::TomlError(_))));

        let result = ConfigLoader::new().with_string(r#"{"server": {}}"#, "json");
        assert!(matches!(result, Err(ConfigError::JsonError(_))));
    }

    #[test]
    fn test_unsupported_format() {
        let result = ConfigLoader::new().with_string("a: 1", "yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(f)) if f == "yaml"));
    }

    #[test]
    fn test_loader_with_file_not_found() {
        let result = ConfigLoader::new().with_file("/nonexistent/modelbind.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_loader_with_optional_file_not_found() {
        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/modelbind.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config, ModelBindConfig::default());
    }

    #[test]
    fn test_load_unvalidated_skips_validation() {
        let config = ConfigLoader::new()
            .with_string("[form_limits]\nvalue_count_limit = 0", "toml")
            .unwrap()
            .load_unvalidated();
        assert_eq!(config.form_limits.value_count_limit, 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_bool() {
        for value in ["true", "True", "1", "yes", "on"] {
            assert_eq!(parse_bool(value), Some(true));
        }
        for value in ["false", "FALSE", "0", "no", "off"] {
            assert_eq!(parse_bool(value), Some(false));
        }
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn test_env_overrides_binding_flags() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_overrides(
                "TEST",
                vars(&[
                    ("TEST__BINDING__ALLOW_EMPTY_INPUT_IN_BODY_BINDING", "true"),
                    ("TEST__BINDING__SEND_BAD_REQUEST_FOR_ALL_FORMATTER_EXCEPTIONS", "on"),
                    ("OTHER__BINDING__ALLOW_EMPTY_INPUT_IN_BODY_BINDING", "false"),
                ]),
            )
            .unwrap();

        assert!(loader.config.binding.allow_empty_input_in_body_binding);
        assert!(loader.config.binding.send_bad_request_for_all_formatter_exceptions);
    }

    #[test]
    fn test_env_overrides_form_limits() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_overrides(
                "TEST",
                vars(&[
                    ("TEST__FORM_LIMITS__BUFFER_BODY", "yes"),
                    ("TEST__FORM_LIMITS__VALUE_COUNT_LIMIT", "12"),
                    ("TEST__FORM_LIMITS__MULTIPART_BODY_LENGTH_LIMIT", "4096"),
                ]),
            )
            .unwrap();

        let limits = &loader.config.form_limits;
        assert!(limits.buffer_body);
        assert_eq!(limits.value_count_limit, 12);
        assert_eq!(limits.multipart_body_length_limit, 4096);
    }

    #[test]
    fn test_env_overrides_telemetry() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__LOGGING__FORMAT", "pretty", "TEST").unwrap();
        loader.apply_env_var("TEST__LOGGING__LEVEL", "warn", "TEST").unwrap();
        loader.apply_env_var("TEST__METRICS__SERVICE_NAME", "orders", "TEST").unwrap();
        loader
            .apply_env_var("TEST__METRICS__DURATION_BUCKETS", "0.001, 0.01,0.1", "TEST")
            .unwrap();

        assert_eq!(loader.config.logging.format, LogFormat::Pretty);
        assert_eq!(loader.config.logging.level, "warn");
        assert_eq!(loader.config.metrics.service_name, "orders");
        assert_eq!(loader.config.metrics.duration_buckets, vec![0.001, 0.01, 0.1]);
    }

    #[test]
    fn test_env_invalid_values() {
        let mut loader = ConfigLoader::new();
        let err = loader
            .apply_env_var("TEST__FORM_LIMITS__KEY_LENGTH_LIMIT", "lots", "TEST")
            .unwrap_err();
        assert!(err.to_string().contains("TEST__FORM_LIMITS__KEY_LENGTH_LIMIT"));

        assert!(loader.apply_env_var("TEST__LOGGING__FORMAT", "xml", "TEST").is_err());
        assert!(loader.apply_env_var("TEST__LOGGING__ENABLED", "maybe", "TEST").is_err());
    }

    #[test]
    fn test_env_unknown_key_ignored() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__SERVER__PORT", "8080", "TEST").unwrap();
        assert_eq!(loader.config, ModelBindConfig::default());
    }

    #[test]
    fn test_merge_values_replaces_leaves_only() {
        let mut base = serde_json::json!({"a": {"b": 1, "c": 2}, "d": [1, 2]});
        merge_values(&mut base, serde_json::json!({"a": {"c": 3}, "d": [9]}));
        assert_eq!(base, serde_json::json!({"a": {"b": 1, "c": 3}, "d": [9]}));
    }
}
