use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};

/// Source of one complete byte buffer.
///
/// This is the decoder's only contact with I/O: a local file, an embedded
/// asset or a download all look the same once `open` resolves. Errors are
/// transport failures and are handed straight back to the caller.
#[async_trait]
pub trait ByteProvider: Send + Sync {
    async fn open(&self) -> io::Result<Vec<u8>>;
}

/// Reads a whole file from disk.
#[derive(Debug, Clone)]
pub struct FileProvider {
    path: PathBuf,
}

impl FileProvider {
    pub fn new(path: impl Into<PathBuf>) -> FileProvider {
        FileProvider { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ByteProvider for FileProvider {
    async fn open(&self) -> io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await.map_err(|e| {
            io::Error::new(e.kind(), format!("cannot read '{}': {}", self.path.display(), e))
        })
    }
}

/// Serves a buffer already held in memory (embedded assets, tests).
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    bytes: Vec<u8>,
}

impl MemoryProvider {
    pub fn new(bytes: impl Into<Vec<u8>>) -> MemoryProvider {
        MemoryProvider { bytes: bytes.into() }
    }
}

#[async_trait]
impl ByteProvider for MemoryProvider {
    async fn open(&self) -> io::Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}
