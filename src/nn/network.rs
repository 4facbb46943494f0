//! Neural Network Implementation
//!
//! Feedforward binary classifier trained with binary cross-entropy and
//! mini-batch gradient descent.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use log::{debug, info};
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_LEARNING_RATE;
use crate::error::{PipelineError, Result};

use super::activation::ActivationType;
use super::layer::DenseLayer;
use super::optimizer::{Adam, Optimizer};

/// Decision threshold for turning probabilities into class labels.
const CLASS_THRESHOLD: f64 = 0.5;

/// Probability clamp for the cross-entropy loss.
const LOSS_EPSILON: f64 = 1e-15;

/// Network architecture description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub layer_sizes: Vec<usize>,
    pub activations: Vec<ActivationType>,
}

impl NetworkConfig {
    pub fn new(input_size: usize) -> Self {
        Self {
            layer_sizes: vec![input_size],
            activations: vec![],
        }
    }

    /// Add a hidden layer
    pub fn add_layer(mut self, size: usize, activation: ActivationType) -> Self {
        self.layer_sizes.push(size);
        self.activations.push(activation);
        self
    }

    /// Set output layer
    pub fn output_layer(mut self, size: usize, activation: ActivationType) -> Self {
        self.layer_sizes.push(size);
        self.activations.push(activation);
        self
    }

    /// Width of the input layer.
    pub fn input_size(&self) -> usize {
        self.layer_sizes[0]
    }

    /// Width of the output layer.
    pub fn output_size(&self) -> usize {
        self.layer_sizes[self.layer_sizes.len() - 1]
    }

    fn validate(&self) -> Result<()> {
        if self.activations.is_empty() {
            return Err(PipelineError::Config(
                "network needs at least one layer".to_string(),
            ));
        }
        if self.layer_sizes.len() != self.activations.len() + 1 {
            return Err(PipelineError::Config(format!(
                "{} layer sizes do not match {} activations",
                self.layer_sizes.len(),
                self.activations.len()
            )));
        }
        if self.layer_sizes.iter().any(|&s| s == 0) {
            return Err(PipelineError::Config(
                "layer widths must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Per-epoch training metrics.
#[derive(Debug, Clone, Serialize)]
pub struct EpochStats {
    pub epoch: usize,
    pub loss: f64,
    pub accuracy: f64,
    pub val_loss: Option<f64>,
    pub val_accuracy: Option<f64>,
}

impl EpochStats {
    fn describe(&self) -> String {
        match (self.val_loss, self.val_accuracy) {
            (Some(vl), Some(va)) => format!(
                "loss: {:.4} - accuracy: {:.4} - val_loss: {:.4} - val_accuracy: {:.4}",
                self.loss, self.accuracy, vl, va
            ),
            _ => format!("loss: {:.4} - accuracy: {:.4}", self.loss, self.accuracy),
        }
    }
}

/// Metrics recorded over a full training run, one entry per epoch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TrainingHistory {
    pub epochs: Vec<EpochStats>,
}

impl TrainingHistory {
    /// Stats for the last completed epoch.
    pub fn final_epoch(&self) -> Option<&EpochStats> {
        self.epochs.last()
    }
}

/// Feedforward Neural Network
pub struct NeuralNetwork {
    layers: Vec<DenseLayer>,
    config: NetworkConfig,
    optimizers: Vec<Box<dyn Optimizer>>,
    rng: StdRng,
}

impl NeuralNetwork {
    /// Create network from configuration.
    ///
    /// The seed drives both weight initialization and the batch shuffle,
    /// so the same seed reproduces the same trained model.
    pub fn from_config(config: NetworkConfig, seed: u64) -> Result<Self> {
        config.validate()?;

        let mut rng = StdRng::seed_from_u64(seed);
        let mut layers = Vec::new();
        for i in 0..config.activations.len() {
            layers.push(DenseLayer::new(
                config.layer_sizes[i],
                config.layer_sizes[i + 1],
                config.activations[i],
                &mut rng,
            ));
        }

        let optimizers: Vec<Box<dyn Optimizer>> = (0..layers.len())
            .map(|_| Box::new(Adam::new(DEFAULT_LEARNING_RATE)) as Box<dyn Optimizer>)
            .collect();

        Ok(Self {
            layers,
            config,
            optimizers,
            rng,
        })
    }

    /// Create a network for binary classification: ReLU hidden layers and
    /// a single sigmoid output unit.
    pub fn binary_classification(
        input_size: usize,
        hidden_sizes: &[usize],
        seed: u64,
    ) -> Result<Self> {
        let mut config = NetworkConfig::new(input_size);
        for &size in hidden_sizes {
            config = config.add_layer(size, ActivationType::ReLU);
        }
        config = config.output_layer(1, ActivationType::Sigmoid);

        Self::from_config(config, seed)
    }

    /// Set optimizer for all layers
    pub fn set_optimizer(&mut self, optimizer: Box<dyn Optimizer>) {
        self.optimizers = self.layers.iter().map(|_| optimizer.clone_box()).collect();
    }

    /// Trained layers, in forward order.
    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    /// Architecture description.
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    fn forward(&mut self, input: &Array2<f64>) -> Array2<f64> {
        let mut output = input.clone();
        for layer in &mut self.layers {
            output = layer.forward(&output);
        }
        output
    }

    fn check_input(&self, input: &Array2<f64>) -> Result<()> {
        if input.ncols() != self.config.input_size() {
            return Err(PipelineError::Shape(format!(
                "network expects {} input columns but received {}",
                self.config.input_size(),
                input.ncols()
            )));
        }
        Ok(())
    }

    /// Predicted probabilities, one row per input row.
    pub fn predict(&mut self, input: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_input(input)?;
        Ok(self.forward(input))
    }

    /// Hard 0/1 class labels at the 0.5 threshold.
    pub fn predict_classes(&mut self, input: &Array2<f64>) -> Result<Array1<f64>> {
        let probabilities = self.predict(input)?;
        if probabilities.ncols() != 1 {
            return Err(PipelineError::Shape(format!(
                "class prediction expects a single-output network, got {} outputs",
                probabilities.ncols()
            )));
        }
        Ok(probabilities
            .column(0)
            .mapv(|p| if p >= CLASS_THRESHOLD { 1.0 } else { 0.0 }))
    }

    /// Backward pass and weight update
    fn backward(&mut self, predictions: &Array2<f64>, targets: &Array2<f64>) {
        let mut gradient = bce_gradient(predictions, targets);

        for i in (0..self.layers.len()).rev() {
            let (input_grad, weight_grad, bias_grad) = self.layers[i].backward(&gradient);

            let layer = &mut self.layers[i];
            self.optimizers[i].step(
                &mut layer.weights,
                &mut layer.biases,
                &weight_grad,
                &bias_grad,
            );

            gradient = input_grad;
        }
    }

    /// Train for one epoch over shuffled mini-batches; returns mean batch loss.
    fn train_epoch(
        &mut self,
        x_train: &Array2<f64>,
        y_train: &Array2<f64>,
        batch_size: usize,
    ) -> f64 {
        let n_samples = x_train.nrows();
        let n_batches = (n_samples + batch_size - 1) / batch_size;
        let mut total_loss = 0.0;

        let mut indices: Vec<usize> = (0..n_samples).collect();
        indices.shuffle(&mut self.rng);

        for batch_idx in 0..n_batches {
            let start = batch_idx * batch_size;
            let end = (start + batch_size).min(n_samples);
            let batch_indices = &indices[start..end];

            let x_batch = x_train.select(Axis(0), batch_indices);
            let y_batch = y_train.select(Axis(0), batch_indices);

            let predictions = self.forward(&x_batch);
            total_loss += bce_loss(&predictions, &y_batch);
            self.backward(&predictions, &y_batch);
        }

        total_loss / n_batches as f64
    }

    /// Train the network, optionally scoring a held-out set after every epoch.
    pub fn fit(
        &mut self,
        x_train: &Array2<f64>,
        y_train: &Array1<f64>,
        validation: Option<(&Array2<f64>, &Array1<f64>)>,
        epochs: usize,
        batch_size: usize,
    ) -> Result<TrainingHistory> {
        self.check_input(x_train)?;
        if self.config.output_size() != 1 {
            return Err(PipelineError::Shape(format!(
                "training expects a single-output network, got {} outputs",
                self.config.output_size()
            )));
        }
        if x_train.nrows() != y_train.len() {
            return Err(PipelineError::Shape(format!(
                "{} training rows but {} labels",
                x_train.nrows(),
                y_train.len()
            )));
        }
        if batch_size == 0 {
            return Err(PipelineError::Config(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if let Some((x_val, y_val)) = validation {
            self.check_input(x_val)?;
            if x_val.nrows() != y_val.len() {
                return Err(PipelineError::Shape(format!(
                    "{} validation rows but {} labels",
                    x_val.nrows(),
                    y_val.len()
                )));
            }
        }

        let targets = to_column(y_train);
        let mut history = TrainingHistory::default();

        for epoch in 0..epochs {
            let loss = self.train_epoch(x_train, &targets, batch_size);
            if !loss.is_finite() {
                return Err(PipelineError::Convergence(format!(
                    "loss became non-finite at epoch {}",
                    epoch + 1
                )));
            }

            let predictions = self.forward(x_train);
            let accuracy = binary_accuracy(&predictions, y_train);

            let (val_loss, val_accuracy) = match validation {
                Some((x_val, y_val)) => {
                    let (l, a) = self.evaluate(x_val, y_val)?;
                    (Some(l), Some(a))
                }
                None => (None, None),
            };

            let stats = EpochStats {
                epoch: epoch + 1,
                loss,
                accuracy,
                val_loss,
                val_accuracy,
            };

            if epoch == 0 || epoch + 1 == epochs || (epoch + 1) % 10 == 0 {
                info!("epoch {:>3}/{}: {}", epoch + 1, epochs, stats.describe());
            } else {
                debug!("epoch {:>3}/{}: {}", epoch + 1, epochs, stats.describe());
            }

            history.epochs.push(stats);
        }

        Ok(history)
    }

    /// Loss and accuracy on a labelled set.
    pub fn evaluate(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(f64, f64)> {
        self.check_input(x)?;
        if x.nrows() != y.len() {
            return Err(PipelineError::Shape(format!(
                "{} rows but {} labels",
                x.nrows(),
                y.len()
            )));
        }

        let predictions = self.forward(x);
        if predictions.ncols() != 1 {
            return Err(PipelineError::Shape(format!(
                "evaluation expects a single-output network, got {} outputs",
                predictions.ncols()
            )));
        }

        let loss = bce_loss(&predictions, &to_column(y));
        let accuracy = binary_accuracy(&predictions, y);
        Ok((loss, accuracy))
    }

    /// Get total number of parameters
    pub fn num_parameters(&self) -> usize {
        self.layers.iter().map(|l| l.num_parameters()).sum()
    }

    /// Human-readable architecture table.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Input size: {}\n", self.config.input_size()));
        for (i, layer) in self.layers.iter().enumerate() {
            out.push_str(&format!(
                "Layer {}: {} -> {} ({:?}), params: {}\n",
                i + 1,
                layer.input_size,
                layer.output_size,
                layer.activation,
                layer.num_parameters()
            ));
        }
        out.push_str(&format!("Total parameters: {}", self.num_parameters()));
        out
    }

    /// Save model to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);

        serde_json::to_writer(writer, &(&self.config, &self.layers))?;
        Ok(())
    }

    /// Load model from a JSON file.
    ///
    /// Optimizer state is not persisted; a loaded model gets a fresh Adam.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let (config, layers): (NetworkConfig, Vec<DenseLayer>) = serde_json::from_reader(reader)?;
        config.validate()?;
        if layers.len() != config.activations.len() {
            return Err(PipelineError::Config(format!(
                "model file holds {} layers but the config describes {}",
                layers.len(),
                config.activations.len()
            )));
        }

        let optimizers: Vec<Box<dyn Optimizer>> = (0..layers.len())
            .map(|_| Box::new(Adam::new(DEFAULT_LEARNING_RATE)) as Box<dyn Optimizer>)
            .collect();

        Ok(Self {
            layers,
            config,
            optimizers,
            rng: StdRng::from_entropy(),
        })
    }
}

fn to_column(y: &Array1<f64>) -> Array2<f64> {
    y.clone().insert_axis(Axis(1))
}

/// Binary cross-entropy, averaged over rows, with probabilities clamped
/// away from 0 and 1 so the logarithms stay finite.
fn bce_loss(predictions: &Array2<f64>, targets: &Array2<f64>) -> f64 {
    let n = predictions.nrows() as f64;
    let p = predictions.mapv(|v| v.clamp(LOSS_EPSILON, 1.0 - LOSS_EPSILON));
    let loss = targets * &p.mapv(f64::ln) + &(1.0 - targets) * &(1.0 - &p).mapv(f64::ln);
    -loss.sum() / n
}

fn bce_gradient(predictions: &Array2<f64>, targets: &Array2<f64>) -> Array2<f64> {
    let n = predictions.nrows() as f64;
    let p = predictions.mapv(|v| v.clamp(LOSS_EPSILON, 1.0 - LOSS_EPSILON));
    ((&p - targets) / (&p * &(1.0 - &p))) / n
}

/// Fraction of rows whose thresholded probability matches the label.
fn binary_accuracy(predictions: &Array2<f64>, labels: &Array1<f64>) -> f64 {
    let correct = predictions
        .column(0)
        .iter()
        .zip(labels.iter())
        .filter(|(&p, &y)| {
            let class = if p >= CLASS_THRESHOLD { 1.0 } else { 0.0 };
            class == y
        })
        .count();
    correct as f64 / labels.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tempfile::tempdir;

    /// Points on a circle, labelled by which side of the line x + y = 0
    /// they fall on. Linearly separable with a margin.
    fn separable_problem() -> (Array2<f64>, Array1<f64>) {
        let n = 40;
        let x = Array2::from_shape_fn((n, 2), |(i, j)| {
            let theta = (i as f64 + 0.5) * std::f64::consts::TAU / n as f64;
            if j == 0 {
                theta.cos()
            } else {
                theta.sin()
            }
        });
        let y = Array1::from_shape_fn(n, |i| {
            let theta = (i as f64 + 0.5) * std::f64::consts::TAU / n as f64;
            if theta.cos() + theta.sin() > 0.0 {
                1.0
            } else {
                0.0
            }
        });
        (x, y)
    }

    #[test]
    fn test_network_creation() {
        let config = NetworkConfig::new(10)
            .add_layer(32, ActivationType::ReLU)
            .add_layer(16, ActivationType::ReLU)
            .output_layer(1, ActivationType::Sigmoid);

        let network = NeuralNetwork::from_config(config, 42).unwrap();
        assert_eq!(network.layers().len(), 3);
        assert_eq!(network.config().input_size(), 10);
        assert_eq!(network.config().output_size(), 1);
    }

    #[test]
    fn test_parameter_count_for_risk_topology() {
        let network = NeuralNetwork::binary_classification(3, &[16, 8], 42).unwrap();
        // 3*16+16 + 16*8+8 + 8*1+1
        assert_eq!(network.num_parameters(), 209);
    }

    #[test]
    fn test_zero_width_layer_is_rejected() {
        let config = NetworkConfig::new(3)
            .add_layer(0, ActivationType::ReLU)
            .output_layer(1, ActivationType::Sigmoid);
        assert!(matches!(
            NeuralNetwork::from_config(config, 42),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn test_predictions_are_probabilities() {
        let mut network = NeuralNetwork::binary_classification(4, &[8, 4], 42).unwrap();
        let input = Array2::from_shape_fn((10, 4), |(i, j)| (i as f64 - 5.0) * (j as f64 + 1.0));
        let output = network.predict(&input).unwrap();

        assert_eq!(output.dim(), (10, 1));
        assert!(output.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn test_same_seed_same_predictions() {
        let input = Array2::ones((3, 3));

        let mut a = NeuralNetwork::binary_classification(3, &[16, 8], 42).unwrap();
        let mut b = NeuralNetwork::binary_classification(3, &[16, 8], 42).unwrap();

        let pa = a.predict(&input).unwrap();
        let pb = b.predict(&input).unwrap();
        assert_eq!(pa, pb);
    }

    #[test]
    fn test_predict_rejects_wrong_width() {
        let mut network = NeuralNetwork::binary_classification(3, &[4], 42).unwrap();
        let input = Array2::ones((2, 5));
        assert!(matches!(
            network.predict(&input),
            Err(PipelineError::Shape(_))
        ));
    }

    #[test]
    fn test_training_learns_separable_data() {
        let (x, y) = separable_problem();

        let mut network = NeuralNetwork::binary_classification(2, &[8], 42).unwrap();
        network.set_optimizer(Box::new(Adam::new(0.01)));

        let (initial_loss, _) = network.evaluate(&x, &y).unwrap();
        let history = network.fit(&x, &y, None, 200, 8).unwrap();
        let (final_loss, final_accuracy) = network.evaluate(&x, &y).unwrap();

        assert_eq!(history.epochs.len(), 200);
        assert!(final_loss < initial_loss);
        assert!(final_accuracy >= 0.9);
    }

    #[test]
    fn test_history_records_validation_metrics() {
        let (x, y) = separable_problem();

        let mut network = NeuralNetwork::binary_classification(2, &[4], 7).unwrap();
        let history = network.fit(&x, &y, Some((&x, &y)), 5, 8).unwrap();

        assert_eq!(history.epochs.len(), 5);
        for stats in &history.epochs {
            assert!(stats.loss.is_finite());
            assert!(stats.val_loss.is_some());
            assert!(stats.val_accuracy.is_some());
        }
        assert_eq!(history.final_epoch().unwrap().epoch, 5);
    }

    #[test]
    fn test_ragged_final_batch() {
        let (x, y) = separable_problem();
        // 40 rows with batch size 12 leaves a final batch of 4.
        let mut network = NeuralNetwork::binary_classification(2, &[4], 7).unwrap();
        let history = network.fit(&x, &y, None, 3, 12).unwrap();
        assert_eq!(history.epochs.len(), 3);
    }

    #[test]
    fn test_non_finite_loss_aborts_training() {
        let x = Array2::from_shape_vec((4, 2), vec![0.1, 0.2, f64::NAN, 0.4, 0.5, 0.6, 0.7, 0.8])
            .unwrap();
        let y = Array1::from_vec(vec![0.0, 1.0, 0.0, 1.0]);

        // Tanh carries the NaN row through to the output, so the first
        // epoch loss is NaN. (ReLU would flush it to zero instead.)
        let config = NetworkConfig::new(2)
            .add_layer(4, ActivationType::Tanh)
            .output_layer(1, ActivationType::Sigmoid);
        let mut network = NeuralNetwork::from_config(config, 42).unwrap();

        assert!(matches!(
            network.fit(&x, &y, None, 5, 2),
            Err(PipelineError::Convergence(_))
        ));
    }

    #[test]
    fn test_fit_rejects_zero_batch_size() {
        let (x, y) = separable_problem();
        let mut network = NeuralNetwork::binary_classification(2, &[4], 42).unwrap();
        assert!(matches!(
            network.fit(&x, &y, None, 1, 0),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn test_fit_rejects_label_length_mismatch() {
        let x = Array2::ones((4, 2));
        let y = Array1::ones(3);
        let mut network = NeuralNetwork::binary_classification(2, &[4], 42).unwrap();
        assert!(matches!(
            network.fit(&x, &y, None, 1, 2),
            Err(PipelineError::Shape(_))
        ));
    }

    #[test]
    fn test_fit_rejects_multi_output_network() {
        let (x, y) = separable_problem();

        // A two-unit output would broadcast against the single label
        // column instead of failing, so fit refuses it up front.
        let config = NetworkConfig::new(2)
            .add_layer(4, ActivationType::ReLU)
            .output_layer(2, ActivationType::Sigmoid);
        let mut network = NeuralNetwork::from_config(config, 42).unwrap();

        assert!(matches!(
            network.fit(&x, &y, None, 1, 8),
            Err(PipelineError::Shape(_))
        ));
    }

    #[test]
    fn test_bce_loss_is_finite_at_confident_predictions() {
        let predictions = Array2::from_shape_vec((2, 1), vec![0.0, 1.0]).unwrap();
        let targets = Array2::from_shape_vec((2, 1), vec![1.0, 0.0]).unwrap();

        // Exactly wrong confident predictions: clamping keeps the loss finite.
        let loss = bce_loss(&predictions, &targets);
        assert!(loss.is_finite());
        assert!(loss > 10.0);
    }

    #[test]
    fn test_bce_loss_known_value() {
        let predictions = Array2::from_shape_vec((2, 1), vec![0.8, 0.3]).unwrap();
        let targets = Array2::from_shape_vec((2, 1), vec![1.0, 0.0]).unwrap();

        let expected = -((0.8f64).ln() + (0.7f64).ln()) / 2.0;
        assert_relative_eq!(bce_loss(&predictions, &targets), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_binary_accuracy() {
        let predictions = Array2::from_shape_vec((4, 1), vec![0.9, 0.4, 0.6, 0.1]).unwrap();
        let labels = Array1::from_vec(vec![1.0, 0.0, 0.0, 0.0]);
        assert_relative_eq!(binary_accuracy(&predictions, &labels), 0.75);
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");

        let mut network = NeuralNetwork::binary_classification(3, &[16, 8], 42).unwrap();
        let input = Array2::from_shape_fn((5, 3), |(i, j)| i as f64 * 0.1 + j as f64);
        let before = network.predict(&input).unwrap();

        network.save(&path).unwrap();
        let mut restored = NeuralNetwork::load(&path).unwrap();
        let after = restored.predict(&input).unwrap();

        assert_eq!(restored.layers().len(), 3);
        for (a, b) in before.iter().zip(after.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        assert!(matches!(
            NeuralNetwork::load("no_such_model.json"),
            Err(PipelineError::Io(_))
        ));
    }

    #[test]
    fn test_summary_lists_all_layers() {
        let network = NeuralNetwork::binary_classification(3, &[16, 8], 42).unwrap();
        let summary = network.summary();
        assert!(summary.contains("Layer 1: 3 -> 16"));
        assert!(summary.contains("Layer 3: 8 -> 1"));
        assert!(summary.contains("Total parameters: 209"));
    }

    #[test]
    fn test_predict_classes_thresholds_at_half() {
        let (x, y) = separable_problem();
        let mut network = NeuralNetwork::binary_classification(2, &[8], 42).unwrap();
        network.set_optimizer(Box::new(Adam::new(0.01)));
        network.fit(&x, &y, None, 200, 8).unwrap();

        let classes = network.predict_classes(&x).unwrap();
        assert!(classes.iter().all(|&c| c == 0.0 || c == 1.0));
        let agreement = classes
            .iter()
            .zip(y.iter())
            .filter(|(&c, &label)| c == label)
            .count();
        assert!(agreement as f64 / y.len() as f64 >= 0.9);
    }
}
