use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ecoroute_core::Error;
use ecoroute_core::network::EdgeAggregation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Arc cost table written by the training pipeline
    pub arc_costs_path: PathBuf,
    /// Persisted arc feature model
    pub arc_model_path: PathBuf,
    pub aggregation: EdgeAggregation,
    pub request_timeout_secs: u64,
    /// Requests handled at once per route
    pub concurrency_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 5000)),
            arc_costs_path: PathBuf::from("output/couts_arcs.csv"),
            arc_model_path: PathBuf::from("output/arc_model.json"),
            aggregation: EdgeAggregation::default(),
            request_timeout_secs: 30,
            concurrency_limit: 64,
        }
    }
}

impl ServerConfig {
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid
    /// configuration.
    pub fn from_toml_file(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!("Failed to open file '{}': {}", path.display(), e),
            )
        })?;
        let config: Self = toml::from_str(&text).map_err(|e| Error::ConfigError(e.to_string()))?;
        if config.concurrency_limit == 0 {
            return Err(Error::ConfigError(
                "concurrency_limit must be positive".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
