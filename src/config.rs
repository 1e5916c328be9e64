//! Configuration management for gslb-metrics
//!
//! Parses TOML configuration files and provides typed access to settings.
//! Every section is optional; a missing file or section means defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::error::{MetricsError, MetricsResult};
use crate::metrics::CatalogOptions;
use crate::metrics::recorder::DEFAULT_NAMESPACE;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Metrics configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MetricsConfig {
    /// Namespace the controller runs in, reported by the runtime info metric
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Instantiate the Infoblox provider instruments
    #[serde(default = "default_infoblox")]
    pub infoblox: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            infoblox: default_infoblox(),
        }
    }
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_infoblox() -> bool {
    true
}

/// Observability configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load and validate configuration from a TOML file
    ///
    /// # Errors
    ///
    /// - [`MetricsError::ConfigFileRead`] if the file cannot be read
    /// - [`MetricsError::ConfigParseFailed`] if it is not valid TOML for this schema
    /// - [`MetricsError::ConfigValidationFailed`] if a value is out of range
    pub fn from_file<P: AsRef<Path>>(path: P) -> MetricsResult<Self> {
        let path_display = path.as_ref().display().to_string();

        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| {
            MetricsError::ConfigFileRead {
                path: path_display.clone(),
                source,
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|source| {
            MetricsError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            }
        })?;

        config
            .check()
            .map_err(|reason| MetricsError::ConfigValidationFailed {
                path: path_display,
                reason,
            })?;

        tracing::debug!(path = %path.as_ref().display(), "Loaded configuration");
        Ok(config)
    }

    /// Load configuration from `path`, or defaults when the file does not exist
    ///
    /// # Errors
    ///
    /// Same as [`Config::from_file`] for a file that exists.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> MetricsResult<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate configuration after parsing
    ///
    /// This is called automatically by `from_file()` and `from_str()`.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Config`] naming the offending setting.
    pub fn validate(&self) -> MetricsResult<()> {
        self.check().map_err(MetricsError::Config)
    }

    /// Validation rules, returning the bare reason on failure
    fn check(&self) -> Result<(), String> {
        let namespace = &self.metrics.namespace;
        if namespace.is_empty() {
            return Err("metrics.namespace must not be empty".to_string());
        }
        if namespace.trim() != namespace {
            return Err(format!(
                "metrics.namespace '{}' must not have surrounding whitespace",
                namespace
            ));
        }

        let level = self.observability.log_level.as_str();
        if !LOG_LEVELS.contains(&level) {
            return Err(format!(
                "observability.log_level '{}' is not one of: {}",
                level,
                LOG_LEVELS.join(", ")
            ));
        }

        Ok(())
    }

    /// Which instrument groups the catalog instantiates
    pub fn catalog_options(&self) -> CatalogOptions {
        CatalogOptions {
            infoblox: self.metrics.infoblox,
        }
    }
}

impl FromStr for Config {
    type Err = MetricsError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config = toml::from_str(toml_str).map_err(|source| {
            MetricsError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            }
        })?;

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_CONFIG: &str = r#"
[metrics]
namespace = "k8gb-system"
infoblox = false

[observability]
log_level = "debug"
"#;

    #[test]
    fn test_config_from_str_parses_successfully() {
        let config = Config::from_str(TEST_CONFIG).expect("should parse config");
        assert_eq!(config.metrics.namespace, "k8gb-system");
        assert!(!config.metrics.infoblox);
        assert_eq!(config.observability.log_level, "debug");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").expect("empty config should parse");
        assert_eq!(config, Config::default());
        assert_eq!(config.metrics.namespace, "k8gb");
        assert!(config.metrics.infoblox);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_partial_section_fills_defaults() {
        let config = Config::from_str("[metrics]\ninfoblox = false\n").expect("should parse");
        assert_eq!(config.metrics.namespace, "k8gb");
        assert!(!config.metrics.infoblox);
    }

    #[test]
    fn test_catalog_options_follow_infoblox_flag() {
        let config = Config::from_str(TEST_CONFIG).expect("should parse config");
        assert_eq!(config.catalog_options(), CatalogOptions { infoblox: false });
        assert_eq!(
            Config::default().catalog_options(),
            CatalogOptions::default()
        );
    }

    #[test]
    fn test_config_validation_empty_namespace_fails() {
        let err = Config::from_str("[metrics]\nnamespace = \"\"\n")
            .expect_err("empty namespace should be rejected");
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn test_config_validation_padded_namespace_fails() {
        let err = Config::from_str("[metrics]\nnamespace = \" k8gb \"\n")
            .expect_err("padded namespace should be rejected");
        assert!(err.to_string().contains("surrounding whitespace"));
    }

    #[test]
    fn test_config_validation_unknown_log_level_fails() {
        let err = Config::from_str("[observability]\nlog_level = \"verbose\"\n")
            .expect_err("unknown log level should be rejected");
        assert!(err.to_string().contains("verbose"));
    }

    #[test]
    fn test_validate_reports_bare_reason() {
        let config = Config {
            observability: ObservabilityConfig {
                log_level: "verbose".to_string(),
            },
            ..Config::default()
        };
        match config.validate() {
            Err(MetricsError::Config(reason)) => {
                assert!(reason.starts_with("observability.log_level 'verbose'"))
            }
            other => panic!("expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_config_parse_error_is_reported() {
        let err = Config::from_str("[metrics]\ninfoblox = \"yes\"\n")
            .expect_err("wrong type should fail to parse");
        assert!(matches!(err, MetricsError::ConfigParseFailed { .. }));
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = Config::from_str(TEST_CONFIG).expect("should parse config");
        let rendered = toml::to_string(&config).expect("config should serialize");
        assert_eq!(Config::from_str(&rendered).expect("should reparse"), config);
    }
}
