//! Consumer-side configuration.

use crate::builder::JsonOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pact specification version stamped into the contract document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PactSpecification {
    #[default]
    V3,
    V4,
}

impl PactSpecification {
    pub fn version(&self) -> &'static str {
        match self {
            PactSpecification::V3 => "3.0.0",
            PactSpecification::V4 => "4.0",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PactConfig {
    /// `tracing` filter directive, e.g. `info` or `accord_core=debug`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub specification: PactSpecification,
    /// Serializer options used by `with_json_body` unless overridden per call.
    #[serde(default)]
    pub json: JsonOptions,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for PactConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            specification: PactSpecification::default(),
            json: JsonOptions::default(),
        }
    }
}

impl PactConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, anyhow::Error> {
        let config: PactConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Install the global subscriber using `log_level`. Returns `false` if
    /// one was already installed.
    pub fn init_logging(&self) -> bool {
        crate::logging::init(&self.log_level)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.log_level.trim().is_empty() {
            anyhow::bail!("'log_level' must not be empty. Use a tracing filter such as 'info'");
        }
        tracing_subscriber::EnvFilter::try_new(&self.log_level).map_err(|e| {
            anyhow::anyhow!("Invalid 'log_level' filter '{}': {}", self.log_level, e)
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::KeyCase;

    #[test]
    fn test_defaults_from_empty_document() {
        let config = PactConfig::from_yaml("{}").unwrap();
        assert_eq!(config, PactConfig::default());
        assert_eq!(config.specification.version(), "3.0.0");
    }

    #[test]
    fn test_full_document() {
        let yaml = r#"
log_level: accord_core=debug
specification: v4
json:
  key_case: camel_case
  skip_nulls: true
"#;
        let config = PactConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.specification, PactSpecification::V4);
        assert_eq!(config.json.key_case, KeyCase::CamelCase);
        assert!(config.json.skip_nulls);
        assert!(!config.json.pretty);
    }

    #[test]
    fn test_rejects_empty_log_level() {
        let err = PactConfig::from_yaml("log_level: ''").unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn test_from_file_missing() {
        assert!(PactConfig::from_file("/nonexistent/accord.yaml").is_err());
    }
}
