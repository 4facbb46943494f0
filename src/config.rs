//! Pipeline configuration
//!
//! A single `PipelineConfig` value carries every tunable the training run
//! needs, with defaults matching the shipped risk model.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Learning rate used when no explicit optimizer is configured.
pub const DEFAULT_LEARNING_RATE: f64 = 0.001;

/// Which rows the feature scaler is fitted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalerFit {
    /// Fit mean and standard deviation on every row before splitting.
    FullDataset,
    /// Fit on the training rows only and reuse those statistics for the
    /// held-out rows.
    TrainOnly,
}

/// Everything the training pipeline needs to run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// CSV file with one header row.
    pub input_path: PathBuf,
    /// Numeric columns fed to the network, in order.
    pub feature_columns: Vec<String>,
    /// Binary target column containing only 0 and 1.
    pub label_column: String,
    /// Fraction of rows held out for evaluation.
    pub test_ratio: f64,
    /// Seed for the row shuffle, weight init and batch order.
    pub seed: u64,
    /// Number of passes over the training rows.
    pub epochs: usize,
    /// Rows per gradient update.
    pub batch_size: usize,
    /// Hidden layer widths; the output layer is always a single sigmoid unit.
    pub hidden_layers: Vec<usize>,
    /// Adam step size.
    pub learning_rate: f64,
    /// Scaler fitting mode.
    pub scaler_fit: ScalerFit,
    /// Where the full-precision model is written.
    pub model_path: PathBuf,
    /// Where the quantized lite model is written.
    pub lite_path: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("risk_data.csv"),
            feature_columns: vec![
                "Age".to_string(),
                "BloodPressure".to_string(),
                "Glucose".to_string(),
            ],
            label_column: "Risk".to_string(),
            test_ratio: 0.2,
            seed: 42,
            epochs: 50,
            batch_size: 8,
            hidden_layers: vec![16, 8],
            learning_rate: DEFAULT_LEARNING_RATE,
            scaler_fit: ScalerFit::FullDataset,
            model_path: PathBuf::from("risk_model.json"),
            lite_path: PathBuf::from("risk_model.lite"),
        }
    }
}

impl PipelineConfig {
    /// Checks every field for values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.feature_columns.is_empty() {
            return Err(PipelineError::Config(
                "at least one feature column is required".to_string(),
            ));
        }
        if !(self.test_ratio > 0.0 && self.test_ratio < 1.0) {
            return Err(PipelineError::Config(format!(
                "test_ratio must be strictly between 0 and 1, got {}",
                self.test_ratio
            )));
        }
        if self.epochs == 0 {
            return Err(PipelineError::Config("epochs must be at least 1".to_string()));
        }
        if self.batch_size == 0 {
            return Err(PipelineError::Config(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.hidden_layers.iter().any(|&w| w == 0) {
            return Err(PipelineError::Config(
                "hidden layer widths must be at least 1".to_string(),
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(PipelineError::Config(format!(
                "learning_rate must be a positive finite number, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.feature_columns.len(), 3);
        assert_eq!(config.label_column, "Risk");
        assert_eq!(config.test_ratio, 0.2);
        assert_eq!(config.seed, 42);
        assert_eq!(config.epochs, 50);
        assert_eq!(config.batch_size, 8);
        assert_eq!(config.hidden_layers, vec![16, 8]);
        assert_eq!(config.scaler_fit, ScalerFit::FullDataset);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_ratio() {
        let mut config = PipelineConfig::default();
        config.test_ratio = 0.0;
        assert!(matches!(
            config.validate(),
            Err(PipelineError::Config(_))
        ));

        config.test_ratio = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_batch() {
        let mut config = PipelineConfig::default();
        config.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_width_hidden_layer() {
        let mut config = PipelineConfig::default();
        config.hidden_layers = vec![16, 0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_learning_rate() {
        let mut config = PipelineConfig::default();
        config.learning_rate = 0.0;
        assert!(config.validate().is_err());
        config.learning_rate = f64::NAN;
        assert!(config.validate().is_err());
    }
}
