//! Optimization Algorithms
//!
//! Implements the optimizers used for training:
//! - SGD (Stochastic Gradient Descent), with optional momentum
//! - Adam (Adaptive Moment Estimation)

use ndarray::{Array1, Array2};

/// Optimizer trait for per-layer parameter updates.
///
/// A single `step` updates weights and biases together so stateful
/// optimizers see one timestep per batch.
pub trait Optimizer: Send + Sync {
    /// Apply one gradient step to the layer's parameters.
    fn step(
        &mut self,
        weights: &mut Array2<f64>,
        biases: &mut Array1<f64>,
        weight_gradients: &Array2<f64>,
        bias_gradients: &Array1<f64>,
    );

    /// Reset optimizer state (for a new training run)
    fn reset(&mut self);

    /// Clone the optimizer for each layer
    fn clone_box(&self) -> Box<dyn Optimizer>;
}

/// Stochastic Gradient Descent with optional momentum
#[derive(Clone)]
pub struct SGD {
    pub learning_rate: f64,
    pub momentum: f64,
    velocity_w: Option<Array2<f64>>,
    velocity_b: Option<Array1<f64>>,
}

impl SGD {
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            momentum: 0.0,
            velocity_w: None,
            velocity_b: None,
        }
    }

    pub fn with_momentum(mut self, momentum: f64) -> Self {
        self.momentum = momentum;
        self
    }
}

impl Optimizer for SGD {
    fn step(
        &mut self,
        weights: &mut Array2<f64>,
        biases: &mut Array1<f64>,
        weight_gradients: &Array2<f64>,
        bias_gradients: &Array1<f64>,
    ) {
        if self.momentum > 0.0 {
            let vw = self
                .velocity_w
                .get_or_insert_with(|| Array2::zeros(weights.dim()));
            *vw = &*vw * self.momentum - weight_gradients * self.learning_rate;
            *weights = &*weights + &*vw;

            let vb = self
                .velocity_b
                .get_or_insert_with(|| Array1::zeros(biases.len()));
            *vb = &*vb * self.momentum - bias_gradients * self.learning_rate;
            *biases = &*biases + &*vb;
        } else {
            *weights = &*weights - &(weight_gradients * self.learning_rate);
            *biases = &*biases - &(bias_gradients * self.learning_rate);
        }
    }

    fn reset(&mut self) {
        self.velocity_w = None;
        self.velocity_b = None;
    }

    fn clone_box(&self) -> Box<dyn Optimizer> {
        Box::new(self.clone())
    }
}

/// Adam optimizer (Adaptive Moment Estimation)
#[derive(Clone)]
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    t: usize,
    m_w: Option<Array2<f64>>,
    v_w: Option<Array2<f64>>,
    m_b: Option<Array1<f64>>,
    v_b: Option<Array1<f64>>,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            t: 0,
            m_w: None,
            v_w: None,
            m_b: None,
            v_b: None,
        }
    }

    pub fn with_betas(mut self, beta1: f64, beta2: f64) -> Self {
        self.beta1 = beta1;
        self.beta2 = beta2;
        self
    }
}

impl Optimizer for Adam {
    fn step(
        &mut self,
        weights: &mut Array2<f64>,
        biases: &mut Array1<f64>,
        weight_gradients: &Array2<f64>,
        bias_gradients: &Array1<f64>,
    ) {
        self.t += 1;
        let bias_correction1 = 1.0 - self.beta1.powi(self.t as i32);
        let bias_correction2 = 1.0 - self.beta2.powi(self.t as i32);

        let m = self
            .m_w
            .get_or_insert_with(|| Array2::zeros(weights.dim()));
        let v = self
            .v_w
            .get_or_insert_with(|| Array2::zeros(weights.dim()));

        *m = &*m * self.beta1 + weight_gradients * (1.0 - self.beta1);
        *v = &*v * self.beta2 + &(weight_gradients * weight_gradients) * (1.0 - self.beta2);

        let m_hat = &*m / bias_correction1;
        let v_hat = &*v / bias_correction2;
        *weights =
            &*weights - &(&m_hat * self.learning_rate / &(v_hat.mapv(f64::sqrt) + self.epsilon));

        let m = self
            .m_b
            .get_or_insert_with(|| Array1::zeros(biases.len()));
        let v = self
            .v_b
            .get_or_insert_with(|| Array1::zeros(biases.len()));

        *m = &*m * self.beta1 + bias_gradients * (1.0 - self.beta1);
        *v = &*v * self.beta2 + &(bias_gradients * bias_gradients) * (1.0 - self.beta2);

        let m_hat = &*m / bias_correction1;
        let v_hat = &*v / bias_correction2;
        *biases =
            &*biases - &(&m_hat * self.learning_rate / &(v_hat.mapv(f64::sqrt) + self.epsilon));
    }

    fn reset(&mut self) {
        self.t = 0;
        self.m_w = None;
        self.v_w = None;
        self.m_b = None;
        self.v_b = None;
    }

    fn clone_box(&self) -> Box<dyn Optimizer> {
        Box::new(self.clone())
    }
}
