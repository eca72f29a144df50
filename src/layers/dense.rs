use rand::Rng;

use crate::{
    activation::activation::ActivationFunction,
    error::NetworkError,
    math::matrix::Matrix,
};

/// Range the initial weights and biases are drawn from.
pub const INIT_RANGE: (f64, f64) = (-0.5, 0.5);

/// One fully connected layer.
///
/// `weights` is `size x input_size` and `biases` is `1 x size`. Both stay
/// `None` until `randomize` runs.
#[derive(Debug, Clone)]
pub struct Layer {
    pub size: usize,
    pub activator: ActivationFunction,
    pub weights: Option<Matrix>,
    pub biases: Option<Matrix>,
}

/// What the forward pass through one layer produced.
#[derive(Debug, Clone)]
pub struct LayerOutput {
    /// Pre-activation `z = W·x + bᵀ`, needed for the derivative.
    pub z: Matrix,
    /// Post-activation `a = f(z)`.
    pub a: Matrix,
}

impl Layer {
    pub fn new(size: usize, activation: ActivationFunction) -> Layer {
        Layer {
            size,
            activator: activation,
            weights: None,
            biases: None,
        }
    }

    /// Allocates fresh parameters for an input of `input_size` neurons.
    pub fn randomize<R: Rng + ?Sized>(&mut self, input_size: usize, rng: &mut R) {
        let (min, max) = INIT_RANGE;

        let mut weights = Matrix::zeros(self.size, input_size);
        let mut biases = Matrix::zeros(1, self.size);
        weights.fill_random(min, max, rng);
        biases.fill_random(min, max, rng);

        self.weights = Some(weights);
        self.biases = Some(biases);
    }

    /// Returns `(weights, biases)`, or `Uninitialized` while the layer is
    /// unset. `index` is the layer's position, used only for the error.
    pub fn params(&self, index: usize) -> Result<(&Matrix, &Matrix), NetworkError> {
        match (self.weights.as_ref(), self.biases.as_ref()) {
            (Some(w), Some(b)) => Ok((w, b)),
            _ => Err(NetworkError::Uninitialized { layer: index }),
        }
    }

    /// Forward pass for one column of inputs: `z = W·x + bᵀ`, `a = f(z)`.
    pub fn feed_from(&self, index: usize, input: &Matrix) -> Result<LayerOutput, NetworkError> {
        let (weights, biases) = self.params(index)?;
        let z = weights.mul(input)?.add(&biases.transpose())?;
        let a = self.activator.apply(&z);
        Ok(LayerOutput { z, a })
    }

    /// Computes `(dC/dW, dC/db)` from the error in activation space.
    /// `dC/db` is returned as a column (`size x 1`).
    pub fn compute_gradients(
        &self,
        delta: &Matrix,
        z: &Matrix,
        input: &Matrix,
    ) -> Result<(Matrix, Matrix), NetworkError> {
        let layer_delta = delta.hadamard(&self.activator.derivative(z))?;
        let weights_grad = layer_delta.mul(&input.transpose())?;
        Ok((weights_grad, layer_delta))
    }

    /// Subtracts `lr`-scaled gradients. `biases_grad` is a column and is
    /// transposed to match the stored row of biases.
    pub fn apply_gradients(
        &mut self,
        index: usize,
        weights_grad: &Matrix,
        biases_grad: &Matrix,
        lr: f64,
    ) -> Result<(), NetworkError> {
        let (weights, biases) = self.params(index)?;
        let new_weights = weights.sub(&weights_grad.mul_scalar(lr))?;
        let new_biases = biases.sub(&biases_grad.mul_scalar(lr).transpose())?;
        self.weights = Some(new_weights);
        self.biases = Some(new_biases);
        Ok(())
    }
}
