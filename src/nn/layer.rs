//! Dense (Fully Connected) Layer Implementation
//!
//! A dense layer performs: output = activation(input * weights + bias)

use ndarray::{Array1, Array2, Axis};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::activation::ActivationType;

/// Dense layer with weights, biases, and activation function
#[derive(Serialize, Deserialize)]
pub struct DenseLayer {
    /// Weight matrix (input_size x output_size)
    pub weights: Array2<f64>,
    /// Bias vector (output_size)
    pub biases: Array1<f64>,
    /// Activation function type
    pub activation: ActivationType,
    /// Input size
    pub input_size: usize,
    /// Output size (number of neurons)
    pub output_size: usize,

    // Cached values for backpropagation (not serialized)
    #[serde(skip)]
    last_input: Option<Array2<f64>>,
    #[serde(skip)]
    last_z: Option<Array2<f64>>,
}

impl DenseLayer {
    /// Create a new dense layer with Xavier initialization.
    ///
    /// Weights are drawn from the seeded generator so networks built with
    /// the same seed start identical; biases start at zero.
    pub fn new(
        input_size: usize,
        output_size: usize,
        activation: ActivationType,
        rng: &mut StdRng,
    ) -> Self {
        let limit = (6.0 / (input_size + output_size) as f64).sqrt();
        let weights =
            Array2::random_using((input_size, output_size), Uniform::new(-limit, limit), rng);
        let biases = Array1::zeros(output_size);

        Self {
            weights,
            biases,
            activation,
            input_size,
            output_size,
            last_input: None,
            last_z: None,
        }
    }

    /// Forward pass through the layer
    pub fn forward(&mut self, input: &Array2<f64>) -> Array2<f64> {
        self.last_input = Some(input.clone());

        // Linear transformation: z = input @ weights + bias
        let mut z = input.dot(&self.weights);
        for mut row in z.rows_mut() {
            row += &self.biases;
        }
        self.last_z = Some(z.clone());

        self.activation.apply(&z)
    }

    /// Backward pass - compute gradients
    /// Returns: (input_gradient, weight_gradient, bias_gradient)
    pub fn backward(
        &self,
        output_gradient: &Array2<f64>,
    ) -> (Array2<f64>, Array2<f64>, Array1<f64>) {
        let z = self
            .last_z
            .as_ref()
            .expect("Must call forward before backward");
        let input = self
            .last_input
            .as_ref()
            .expect("Must call forward before backward");

        let delta = output_gradient * &self.activation.derivative(z);

        // Gradient with respect to weights
        let weight_gradient = input.t().dot(&delta);

        // Gradient with respect to biases
        let bias_gradient = delta.sum_axis(Axis(0));

        // Gradient with respect to input (for previous layer)
        let input_gradient = delta.dot(&self.weights.t());

        (input_gradient, weight_gradient, bias_gradient)
    }

    /// Get number of parameters
    pub fn num_parameters(&self) -> usize {
        self.weights.len() + self.biases.len()
    }
}

impl Clone for DenseLayer {
    fn clone(&self) -> Self {
        Self {
            weights: self.weights.clone(),
            biases: self.biases.clone(),
            activation: self.activation,
            input_size: self.input_size,
            output_size: self.output_size,
            last_input: None,
            last_z: None,
        }
    }
}
