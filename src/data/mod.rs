//! Data Module
//!
//! Provides dataset loading and preprocessing:
//! - CSV table reading with named column extraction
//! - Z-score feature scaling
//! - Seeded train/test splitting

mod scaler;
mod split;
mod table;

pub use scaler::StandardScaler;
pub use split::{split_indices, train_test_split, TrainTestSplit};
pub use table::Table;
