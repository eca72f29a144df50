use serde::{Deserialize, Serialize};

use crate::activation::activation::ActivationFunction;
use crate::error::SpecError;
use crate::network::network::{Network, NetworkConfig};

/// Pixels in one 28x28 digit image.
pub const DIGIT_INPUT_SIZE: usize = 28 * 28;
/// One output per digit class.
pub const DIGIT_CLASSES: usize = 10;

/// Describes one layer in a network specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub size: usize,
    pub activation: ActivationFunction,
}

/// A serializable description of a network topology and its learning rate.
///
/// The default is the digit classifier: 784 inputs, one hidden ReLU layer
/// of 10 neurons and a 10-way softmax output, trained at rate 0.1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub input_size: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    pub layers: Vec<LayerSpec>,
}

fn default_learning_rate() -> f64 {
    NetworkConfig::default().learning_rate
}

impl Default for NetworkSpec {
    fn default() -> Self {
        NetworkSpec::single_hidden(10)
    }
}

impl NetworkSpec {
    /// Digit classifier with one hidden ReLU layer of `hidden` neurons.
    pub fn single_hidden(hidden: usize) -> NetworkSpec {
        NetworkSpec {
            input_size: DIGIT_INPUT_SIZE,
            learning_rate: default_learning_rate(),
            layers: vec![
                LayerSpec { size: hidden, activation: ActivationFunction::ReLU },
                LayerSpec { size: DIGIT_CLASSES, activation: ActivationFunction::Softmax },
            ],
        }
    }

    pub fn validate(&self) -> Result<(), SpecError> {
        if self.input_size == 0 {
            return Err(SpecError::Invalid("input_size must be at least 1".to_owned()));
        }
        if self.layers.is_empty() {
            return Err(SpecError::Invalid("at least one layer is required".to_owned()));
        }
        if let Some(i) = self.layers.iter().position(|l| l.size == 0) {
            return Err(SpecError::Invalid(format!("layer {} has size 0", i)));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(SpecError::Invalid(format!(
                "learning_rate must be a positive number, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }

    /// Builds an uninitialized network; call `randomize_params` before use.
    pub fn build(&self) -> Result<Network, SpecError> {
        self.validate()?;
        let mut network = Network::new(
            self.input_size,
            NetworkConfig { learning_rate: self.learning_rate },
        );
        for layer in &self.layers {
            network.add_layer(layer.size, layer.activation);
        }
        Ok(network)
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<(), SpecError> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes and validates a spec from a JSON file.
    pub fn load_json(path: &str) -> Result<NetworkSpec, SpecError> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let spec: NetworkSpec = serde_json::from_reader(reader)?;
        spec.validate()?;
        Ok(spec)
    }
}
