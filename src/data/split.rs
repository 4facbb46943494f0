//! Train/Test Splitting
//!
//! Seeded random row partition so every run of the pipeline sees the
//! same training and evaluation sets.

use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{PipelineError, Result};

/// The four arrays produced by a split, rows in shuffled order.
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
}

impl TrainTestSplit {
    /// Number of training rows.
    pub fn train_len(&self) -> usize {
        self.y_train.len()
    }

    /// Number of held-out rows.
    pub fn test_len(&self) -> usize {
        self.y_test.len()
    }
}

/// Shuffles `0..n` with a seeded RNG and partitions the permutation into
/// `(train, test)` index lists.
///
/// The test set takes `ceil(n * test_ratio)` rows, so a 100-row dataset at
/// ratio 0.2 yields exactly 80 training and 20 test rows. Both sides must
/// end up non-empty.
pub fn split_indices(n: usize, test_ratio: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        return Err(PipelineError::Config(format!(
            "test_ratio must be strictly between 0 and 1, got {}",
            test_ratio
        )));
    }

    let n_test = (n as f64 * test_ratio).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(PipelineError::Config(format!(
            "{} rows cannot be split with test_ratio {}",
            n, test_ratio
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test = indices[..n_test].to_vec();
    let train = indices[n_test..].to_vec();
    Ok((train, test))
}

/// Splits a feature matrix and its label vector into train and test sets.
pub fn train_test_split(
    features: &Array2<f64>,
    labels: &Array1<f64>,
    test_ratio: f64,
    seed: u64,
) -> Result<TrainTestSplit> {
    if features.nrows() != labels.len() {
        return Err(PipelineError::Shape(format!(
            "{} feature rows but {} labels",
            features.nrows(),
            labels.len()
        )));
    }

    let (train_idx, test_idx) = split_indices(features.nrows(), test_ratio, seed)?;

    Ok(TrainTestSplit {
        x_train: features.select(Axis(0), &train_idx),
        x_test: features.select(Axis(0), &test_idx),
        y_train: labels.select(Axis(0), &train_idx),
        y_test: labels.select(Axis(0), &test_idx),
    })
}
