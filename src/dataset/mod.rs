pub mod idx;
pub mod provider;

pub use idx::{decode_buffers, decode_mnist, decode_mnist_from_dir, parse_buffers, MnistEntry, Split};
pub use provider::{ByteProvider, FileProvider, MemoryProvider};
