//! Provider-side configuration.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

pub const DEFAULT_ROUTE: &str = "/provider-states";
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProviderStateConfig {
    /// Address the standalone server binds to.
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    /// Requests whose path starts with this prefix are state invocations.
    #[serde(default = "default_route")]
    pub route: String,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9001))
}

fn default_route() -> String {
    DEFAULT_ROUTE.to_string()
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ProviderStateConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            route: default_route(),
            max_body_bytes: default_max_body_bytes(),
            log_level: default_log_level(),
        }
    }
}

impl ProviderStateConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, anyhow::Error> {
        let config: ProviderStateConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Install the global subscriber using `log_level`. Returns `false` if
    /// one was already installed.
    pub fn init_logging(&self) -> bool {
        accord_core::logging::init(&self.log_level)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.route.starts_with('/') {
            anyhow::bail!(
                "'route' must start with '/', got '{}'. Example: route: /provider-states",
                self.route
            );
        }
        if self.route == "/" {
            anyhow::bail!(
                "'route' must not be '/' as every request would be treated as a provider state call"
            );
        }
        if self.max_body_bytes == 0 {
            anyhow::bail!("'max_body_bytes' must be greater than 0");
        }
        if self.log_level.trim().is_empty() {
            anyhow::bail!("'log_level' must not be empty. Use a tracing filter such as 'info'");
        }
        Ok(())
    }
}
