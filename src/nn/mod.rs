//! Neural Network Module
//!
//! Provides building blocks for feedforward neural networks:
//! - Activation functions (ReLU, Sigmoid, Tanh, Linear)
//! - Dense layers with forward and backward propagation
//! - Full network with training, evaluation and persistence

mod activation;
mod layer;
mod network;
mod optimizer;

pub use activation::{sigmoid, ActivationType};
pub use layer::DenseLayer;
pub use network::{EpochStats, NetworkConfig, NeuralNetwork, TrainingHistory};
pub use optimizer::{Adam, Optimizer, SGD};
