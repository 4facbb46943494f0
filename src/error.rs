//! Error types
//!
//! Every stage of the pipeline reports failure through `PipelineError`,
//! so callers can tell a bad file apart from a bad schema or a diverging
//! training run.

use thiserror::Error;

/// Errors produced by the training pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Filesystem access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV reader rejected the file.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The file parsed but its contents do not match the expected schema.
    #[error("schema error: {0}")]
    Schema(String),

    /// Arrays with incompatible dimensions were combined.
    #[error("shape mismatch: {0}")]
    Shape(String),

    /// Training produced a non-finite loss.
    #[error("training diverged: {0}")]
    Convergence(String),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Serializing or deserializing the full-precision model failed.
    #[error("model serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Encoding or decoding the lite model failed.
    #[error("lite model codec error: {0}")]
    LiteCodec(#[from] bincode::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PipelineError>;
