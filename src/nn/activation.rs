//! Activation Functions
//!
//! Implements the activation functions used by the risk network and their
//! derivatives for backpropagation.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Types of activation functions available
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum ActivationType {
    /// Rectified Linear Unit: max(0, x)
    ReLU,
    /// Sigmoid: 1 / (1 + exp(-x))
    Sigmoid,
    /// Hyperbolic tangent
    Tanh,
    /// Linear (identity): x
    Linear,
}

impl ActivationType {
    /// Apply the activation elementwise to a batch of pre-activations.
    pub fn apply(&self, z: &Array2<f64>) -> Array2<f64> {
        match self {
            ActivationType::ReLU => z.mapv(|v| v.max(0.0)),
            ActivationType::Sigmoid => z.mapv(sigmoid),
            ActivationType::Tanh => z.mapv(f64::tanh),
            ActivationType::Linear => z.clone(),
        }
    }

    /// Derivative with respect to the pre-activation, evaluated elementwise.
    pub fn derivative(&self, z: &Array2<f64>) -> Array2<f64> {
        match self {
            ActivationType::ReLU => z.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 }),
            ActivationType::Sigmoid => z.mapv(|v| {
                let s = sigmoid(v);
                s * (1.0 - s)
            }),
            ActivationType::Tanh => z.mapv(|v| {
                let t = v.tanh();
                1.0 - t * t
            }),
            ActivationType::Linear => Array2::ones(z.dim()),
        }
    }

    /// Scalar form, used by the dequantizing forward pass.
    pub fn apply_scalar(&self, x: f64) -> f64 {
        match self {
            ActivationType::ReLU => x.max(0.0),
            ActivationType::Sigmoid => sigmoid(x),
            ActivationType::Tanh => x.tanh(),
            ActivationType::Linear => x,
        }
    }
}

/// Numerically stable logistic function.
///
/// Branches on the sign so the exponential argument is never positive,
/// which keeps extreme inputs from overflowing.
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        let e = (-x).exp();
        1.0 / (1.0 + e)
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}
