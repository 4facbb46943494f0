//! Lite Model Format
//!
//! Compact binary export of a trained network for on-device scoring.
//! Weights are quantized to INT8 with one symmetric absmax scale per
//! layer; biases and the embedded feature scaler stay in f32. The
//! resulting file is a fraction of the full-precision artifact.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::StandardScaler;
use crate::error::{PipelineError, Result};
use crate::nn::{ActivationType, NeuralNetwork};

/// One dense layer with INT8 weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteLayer {
    pub input_size: usize,
    pub output_size: usize,
    /// Dequantization factor: weight = q * scale.
    pub scale: f32,
    /// Row-major (input_size x output_size) quantized weights.
    pub weights: Vec<i8>,
    pub biases: Vec<f32>,
    pub activation: ActivationType,
}

/// Self-contained scoring model: feature scaler plus quantized layers.
///
/// Raw feature rows go in; the embedded mean and standard deviation are
/// applied before the network, so callers never scale inputs themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteModel {
    /// Input column names, in the order the model expects them.
    pub feature_columns: Vec<String>,
    pub feature_mean: Vec<f32>,
    pub feature_std: Vec<f32>,
    pub layers: Vec<LiteLayer>,
}

impl LiteModel {
    /// Quantizes a trained network and bundles it with its feature scaler.
    pub fn from_network(
        network: &NeuralNetwork,
        scaler: &StandardScaler,
        feature_columns: &[String],
    ) -> Result<Self> {
        let input_size = network.config().input_size();
        if scaler.mean().len() != input_size {
            return Err(PipelineError::Shape(format!(
                "scaler covers {} columns but the network takes {}",
                scaler.mean().len(),
                input_size
            )));
        }
        if feature_columns.len() != input_size {
            return Err(PipelineError::Shape(format!(
                "{} feature names for a {}-input network",
                feature_columns.len(),
                input_size
            )));
        }

        let layers = network
            .layers()
            .iter()
            .map(|layer| {
                let (weights, scale) = quantize_weights(layer.weights.iter().copied());
                LiteLayer {
                    input_size: layer.input_size,
                    output_size: layer.output_size,
                    scale,
                    weights,
                    biases: layer.biases.iter().map(|&b| b as f32).collect(),
                    activation: layer.activation,
                }
            })
            .collect();

        let model = Self {
            feature_columns: feature_columns.to_vec(),
            feature_mean: scaler.mean().iter().map(|&v| v as f32).collect(),
            feature_std: scaler.stddev().iter().map(|&v| v as f32).collect(),
            layers,
        };
        model.validate()?;
        Ok(model)
    }

    /// Network input width.
    pub fn input_size(&self) -> usize {
        self.feature_mean.len()
    }

    /// Checks internal consistency: scaler width, layer chaining and
    /// weight buffer lengths.
    pub fn validate(&self) -> Result<()> {
        if self.layers.is_empty() {
            return Err(PipelineError::Shape("lite model has no layers".to_string()));
        }
        if self.feature_mean.len() != self.feature_std.len()
            || self.feature_mean.len() != self.feature_columns.len()
        {
            return Err(PipelineError::Shape(format!(
                "scaler fields disagree: {} names, {} means, {} stddevs",
                self.feature_columns.len(),
                self.feature_mean.len(),
                self.feature_std.len()
            )));
        }
        if self.feature_std.iter().any(|&s| s == 0.0 || !s.is_finite()) {
            return Err(PipelineError::Shape(
                "feature stddev entries must be finite and non-zero".to_string(),
            ));
        }

        let mut width = self.feature_mean.len();
        for (i, layer) in self.layers.iter().enumerate() {
            if layer.input_size != width {
                return Err(PipelineError::Shape(format!(
                    "layer {} expects {} inputs but receives {}",
                    i, layer.input_size, width
                )));
            }
            if layer.weights.len() != layer.input_size * layer.output_size {
                return Err(PipelineError::Shape(format!(
                    "layer {} holds {} weights, expected {}",
                    i,
                    layer.weights.len(),
                    layer.input_size * layer.output_size
                )));
            }
            if layer.biases.len() != layer.output_size {
                return Err(PipelineError::Shape(format!(
                    "layer {} holds {} biases, expected {}",
                    i,
                    layer.biases.len(),
                    layer.output_size
                )));
            }
            if !(layer.scale > 0.0 && layer.scale.is_finite()) {
                return Err(PipelineError::Shape(format!(
                    "layer {} has invalid scale {}",
                    i, layer.scale
                )));
            }
            width = layer.output_size;
        }

        if width != 1 {
            return Err(PipelineError::Shape(format!(
                "risk scoring needs a single output, model ends in {}",
                width
            )));
        }
        Ok(())
    }

    /// Scores one raw feature row, returning the predicted probability.
    pub fn predict_row(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.input_size() {
            return Err(PipelineError::Shape(format!(
                "model expects {} features but received {}",
                self.input_size(),
                features.len()
            )));
        }

        // Embedded z-score scaling
        let mut current: Vec<f64> = features
            .iter()
            .enumerate()
            .map(|(i, &v)| (v - self.feature_mean[i] as f64) / self.feature_std[i] as f64)
            .collect();

        for layer in &self.layers {
            let scale = layer.scale as f64;
            let mut next = vec![0.0; layer.output_size];
            for (o, out) in next.iter_mut().enumerate() {
                let mut sum = layer.biases[o] as f64;
                for (i, &x) in current.iter().enumerate() {
                    let w = layer.weights[i * layer.output_size + o] as f64 * scale;
                    sum += x * w;
                }
                *out = layer.activation.apply_scalar(sum);
            }
            current = next;
        }

        Ok(current[0])
    }

    /// Write the model as a bincode file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = bincode::serialize(self)?;
        fs::write(path, bytes)?;
        Ok(())
    }

    /// Read and validate a bincode model file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path)?;
        let model: Self = bincode::deserialize(&bytes)?;
        model.validate()?;
        Ok(model)
    }
}

/// Symmetric absmax quantization to INT8.
///
/// All-zero inputs quantize with scale 1.0 so dequantization never
/// divides by zero.
fn quantize_weights<I: Iterator<Item = f64>>(weights: I) -> (Vec<i8>, f32) {
    let values: Vec<f64> = weights.collect();
    let max_abs = values.iter().fold(0.0f64, |acc, &v| acc.max(v.abs()));
    let scale = if max_abs == 0.0 { 1.0 } else { max_abs / 127.0 };

    let quantized = values
        .iter()
        .map(|&v| (v / scale).round().clamp(-127.0, 127.0) as i8)
        .collect();

    (quantized, scale as f32)
}
