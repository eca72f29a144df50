use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    activation::activation::ActivationFunction,
    error::NetworkError,
    layers::dense::Layer,
    math::matrix::Matrix,
};

/// Construction-time settings of a `Network`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub learning_rate: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig { learning_rate: 0.1 }
    }
}

/// Feedforward network trained by online gradient descent.
///
/// Layers live in one `Vec`; the layer before `layers[i]` is `layers[i - 1]`
/// and the first layer reads the raw input of `input_size` values.
#[derive(Debug, Clone)]
pub struct Network {
    input_size: usize,
    config: NetworkConfig,
    layers: Vec<Layer>,
}

impl Network {
    pub fn new(input_size: usize, config: NetworkConfig) -> Network {
        Network {
            input_size,
            config,
            layers: Vec::new(),
        }
    }

    pub fn add_layer(&mut self, size: usize, activation: ActivationFunction) {
        self.layers.push(Layer::new(size, activation));
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn learning_rate(&self) -> f64 {
        self.config.learning_rate
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Mutable access to the layers, e.g. to load known parameters.
    pub fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    /// Neuron count of the last layer, or `input_size` for an empty network.
    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(self.input_size, |l| l.size)
    }

    /// Number of values feeding layer `i`.
    fn fan_in(&self, i: usize) -> usize {
        if i == 0 {
            self.input_size
        } else {
            self.layers[i - 1].size
        }
    }

    /// Initializes every layer from the thread-local RNG.
    pub fn randomize_params(&mut self) {
        self.randomize_params_with(&mut rand::thread_rng());
    }

    /// Initializes every layer, in order, from `rng`. A seeded RNG makes the
    /// resulting parameters reproducible.
    pub fn randomize_params_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for i in 0..self.layers.len() {
            let fan_in = self.fan_in(i);
            self.layers[i].randomize(fan_in, rng);
        }
    }

    /// Forward-only inference. `input` is an `input_size x 1` column; the
    /// result is the last layer's activation.
    pub fn run(&self, input: &Matrix) -> Result<Matrix, NetworkError> {
        if self.layers.is_empty() {
            return Err(NetworkError::NoLayers);
        }

        let mut current = input.clone();
        for (i, layer) in self.layers.iter().enumerate() {
            current = layer.feed_from(i, &current)?.a;
        }
        Ok(current)
    }

    /// One online gradient-descent step on a single `(input, target)` pair.
    pub fn train(&mut self, input: &Matrix, target: &Matrix) -> Result<(), NetworkError> {
        if self.layers.is_empty() {
            return Err(NetworkError::NoLayers);
        }

        // Forward pass, caching z and a for every layer.
        let mut zs: Vec<Matrix> = Vec::with_capacity(self.layers.len());
        let mut activations: Vec<Matrix> = Vec::with_capacity(self.layers.len() + 1);
        activations.push(input.clone());

        for (i, layer) in self.layers.iter().enumerate() {
            let out = layer.feed_from(i, &activations[i])?;
            zs.push(out.z);
            activations.push(out.a);
        }

        // Output error, uniformly scaled by the target's element count.
        let scale = 1.0 / (target.rows() * target.cols()) as f64;
        let mut delta = activations[self.layers.len()].sub(target)?.mul_scalar(scale);

        let lr = self.config.learning_rate;
        for i in (0..self.layers.len()).rev() {
            let (w_grad, b_grad) =
                self.layers[i].compute_gradients(&delta, &zs[i], &activations[i])?;

            // Propagate through the weights as they were before this update.
            let (weights, _) = self.layers[i].params(i)?;
            delta = weights.transpose().mul(&b_grad)?;

            self.layers[i].apply_gradients(i, &w_grad, &b_grad, lr)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn two_layer() -> Network {
        let mut nn = Network::new(4, NetworkConfig::default());
        nn.add_layer(3, ActivationFunction::ReLU);
        nn.add_layer(2, ActivationFunction::Softmax);
        nn
    }

    #[test]
    fn randomize_allocates_shapes_from_neighbours() {
        let mut nn = two_layer();
        nn.randomize_params_with(&mut StdRng::seed_from_u64(1));

        let (w0, b0) = nn.layers()[0].params(0).unwrap();
        assert_eq!((w0.rows(), w0.cols()), (3, 4));
        assert_eq!((b0.rows(), b0.cols()), (1, 3));

        let (w1, b1) = nn.layers()[1].params(1).unwrap();
        assert_eq!((w1.rows(), w1.cols()), (2, 3));
        assert_eq!((b1.rows(), b1.cols()), (1, 2));
    }

    #[test]
    fn run_before_randomize_is_an_error() {
        let nn = two_layer();
        let err = nn.run(&Matrix::zeros(4, 1)).unwrap_err();
        assert_eq!(err, NetworkError::Uninitialized { layer: 0 });
    }

    #[test]
    fn run_on_empty_network_is_an_error() {
        let nn = Network::new(4, NetworkConfig::default());
        assert_eq!(nn.run(&Matrix::zeros(4, 1)).unwrap_err(), NetworkError::NoLayers);
    }

    #[test]
    fn run_does_not_change_parameters() {
        let mut nn = two_layer();
        nn.randomize_params_with(&mut StdRng::seed_from_u64(2));
        let before = nn.layers()[1].weights.clone();
        nn.run(&Matrix::filling(|i, _| i as f64, 4, 1)).unwrap();
        assert_eq!(nn.layers()[1].weights, before);
    }

    #[test]
    fn wrong_input_shape_surfaces_dimension_mismatch() {
        let mut nn = two_layer();
        nn.randomize_params();
        let err = nn.run(&Matrix::zeros(5, 1)).unwrap_err();
        assert!(matches!(err, NetworkError::Matrix(_)));
    }

    #[test]
    fn seeded_initialization_is_reproducible() {
        let mut a = two_layer();
        let mut b = two_layer();
        a.randomize_params_with(&mut StdRng::seed_from_u64(42));
        b.randomize_params_with(&mut StdRng::seed_from_u64(42));
        assert_eq!(a.layers()[0].weights, b.layers()[0].weights);
        assert_eq!(a.layers()[1].biases, b.layers()[1].biases);
    }
}
