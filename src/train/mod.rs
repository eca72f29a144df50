pub mod trainer;
pub mod train_config;

pub use trainer::{evaluate, train_from_scratch, train_network, Evaluation, TrainReport};
pub use train_config::TrainConfig;
