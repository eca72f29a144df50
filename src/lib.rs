pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod dataset;
pub mod train;
pub mod error;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::dense::Layer;
pub use network::network::{Network, NetworkConfig};
pub use network::spec::{LayerSpec, NetworkSpec};
pub use dataset::idx::{decode_buffers, decode_mnist, decode_mnist_from_dir, MnistEntry, Split};
pub use dataset::provider::{ByteProvider, FileProvider, MemoryProvider};
pub use train::trainer::{evaluate, train_from_scratch, train_network, Evaluation, TrainReport};
pub use train::train_config::TrainConfig;
pub use error::{DatasetError, MatrixError, NetworkError, SpecError};
