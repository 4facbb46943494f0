//! # Risk Model Training
//!
//! This library trains a feedforward neural network that predicts a binary
//! health risk flag from patient vitals, then exports the result in a
//! full-precision format and a quantized lite format for on-device use.
//!
//! ## Modules
//!
//! - `config` - Pipeline configuration with shipped-model defaults
//! - `data` - CSV loading, feature scaling and train/test splitting
//! - `nn` - Neural network implementation (layers, activations, training)
//! - `lite` - Quantized INT8 export with an embedded feature scaler
//! - `pipeline` - End-to-end training run
//! - `error` - Typed errors for every pipeline stage

pub mod config;
pub mod data;
pub mod error;
pub mod lite;
pub mod nn;
pub mod pipeline;

pub use config::{PipelineConfig, ScalerFit};
pub use error::{PipelineError, Result};
pub use lite::LiteModel;
pub use nn::NeuralNetwork;
pub use pipeline::{run, PipelineReport};
