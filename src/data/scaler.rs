//! Feature Scaling
//!
//! Z-score standardization for network input, with the fitted statistics
//! kept alongside the model so raw feature rows can be scored later.

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Per-column z-score scaler. Constructed by fitting, so a value of this
/// type always holds valid statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Array1<f64>,
    std: Array1<f64>,
}

impl StandardScaler {
    /// Computes column means and population standard deviations.
    ///
    /// Columns with zero variance get a standard deviation of 1.0 so they
    /// scale to all zeros instead of dividing by zero.
    pub fn fit(data: &Array2<f64>) -> Result<Self> {
        if data.nrows() == 0 {
            return Err(PipelineError::Shape(
                "cannot fit scaler on an empty matrix".to_string(),
            ));
        }

        let n = data.nrows() as f64;
        let mean = data.sum_axis(Axis(0)) / n;

        let mut std = Array1::zeros(data.ncols());
        for row in data.rows() {
            let diff = &row - &mean;
            std = std + &diff * &diff;
        }
        std = (std / n).mapv(f64::sqrt);
        std = std.mapv(|v| if v.abs() < 1e-10 { 1.0 } else { v });

        Ok(Self { mean, std })
    }

    /// Applies the fitted statistics to `data`.
    pub fn transform(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_width(data)?;

        let mut result = Array2::zeros(data.dim());
        for (i, row) in data.rows().into_iter().enumerate() {
            let scaled = (&row - &self.mean) / &self.std;
            result.row_mut(i).assign(&scaled);
        }
        Ok(result)
    }

    /// Fits on `data` and returns the scaler together with the scaled copy.
    pub fn fit_transform(data: &Array2<f64>) -> Result<(Self, Array2<f64>)> {
        let scaler = Self::fit(data)?;
        let scaled = scaler.transform(data)?;
        Ok((scaler, scaled))
    }

    /// Maps scaled values back to the original units.
    pub fn inverse_transform(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_width(data)?;

        let mut result = Array2::zeros(data.dim());
        for (i, row) in data.rows().into_iter().enumerate() {
            let original = &row * &self.std + &self.mean;
            result.row_mut(i).assign(&original);
        }
        Ok(result)
    }

    /// Fitted column means.
    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    /// Fitted column standard deviations.
    pub fn stddev(&self) -> &Array1<f64> {
        &self.std
    }

    fn check_width(&self, data: &Array2<f64>) -> Result<()> {
        if data.ncols() != self.mean.len() {
            return Err(PipelineError::Shape(format!(
                "scaler was fitted on {} columns but received {}",
                self.mean.len(),
                data.ncols()
            )));
        }
        Ok(())
    }
}
