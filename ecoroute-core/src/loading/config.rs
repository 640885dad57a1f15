use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Error;
use crate::cost::training::TrainingConfig;
use crate::network::EdgeAggregation;

/// Settings of a full pipeline run, read from a TOML file.
/// Every field is optional, missing ones take their default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Raw or cleaned counter export
    pub counts_path: PathBuf,
    /// Daily weather file, enables the weather features of the cost model
    pub weather_path: Option<PathBuf>,
    /// Directory receiving cleaned data, models and the arc cost table
    pub output_dir: PathBuf,
    /// Rows per parallel cleaning batch
    pub chunk_size: usize,
    pub aggregation: EdgeAggregation,
    pub training: TrainingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            counts_path: PathBuf::from("comptages.csv"),
            weather_path: None,
            output_dir: PathBuf::from("output"),
            chunk_size: 10_000,
            aggregation: EdgeAggregation::default(),
            training: TrainingConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML or
    /// holds invalid settings.
    pub fn from_toml_file(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!("Failed to open file '{}': {}", path.display(), e),
            )
        })?;
        Self::from_toml_str(&text)
    }

    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or holds invalid
    /// settings.
    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        let config: Self = toml::from_str(text).map_err(|e| Error::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns a `ConfigError` naming the first invalid setting.
    pub fn validate(&self) -> Result<(), Error> {
        let training = &self.training;
        if self.chunk_size == 0 {
            return Err(Error::ConfigError("chunk_size must be positive".to_string()));
        }
        if !(training.test_fraction > 0.0 && training.test_fraction < 1.0) {
            return Err(Error::ConfigError(format!(
                "test_fraction must be in (0, 1), got {}",
                training.test_fraction
            )));
        }
        let weights = training.weights;
        if !(weights.alpha.is_finite() && weights.beta.is_finite())
            || weights.alpha < 0.0
            || weights.beta < 0.0
        {
            return Err(Error::ConfigError(format!(
                "cost weights must be finite and non-negative, got alpha={} beta={}",
                weights.alpha, weights.beta
            )));
        }
        if let Some((state, factor)) = training
            .traffic_factors
            .0
            .iter()
            .find(|(_, f)| !f.is_finite() || **f < 0.0)
        {
            return Err(Error::ConfigError(format!(
                "traffic factor of {state} must be finite and non-negative, got {factor}"
            )));
        }
        if training.tune_cost_model && training.cv_folds < 2 {
            return Err(Error::ConfigError(format!(
                "cv_folds must be at least 2, got {}",
                training.cv_folds
            )));
        }
        Ok(())
    }

    pub fn cleaned_counts_path(&self) -> PathBuf {
        self.output_dir.join("comptages_clean.csv")
    }

    pub fn arc_costs_path(&self) -> PathBuf {
        self.output_dir.join("couts_arcs.csv")
    }

    pub fn arc_model_path(&self) -> PathBuf {
        self.output_dir.join("arc_model.json")
    }

    pub fn cost_model_path(&self) -> PathBuf {
        self.output_dir.join("cost_model.json")
    }

    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join("training_report.json")
    }
}
