pub mod network;
pub mod spec;

pub use network::{Network, NetworkConfig};
pub use spec::{LayerSpec, NetworkSpec};
