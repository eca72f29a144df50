use thiserror::Error;

/// Matrix shape as reported in error messages, rendered as `RxC`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// Errors raised by the dense matrix engine.
///
/// Both variants signal a programming or topology error on the caller's
/// side; nothing inside the crate recovers from them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatrixError {
    #[error("matrix dimensions do not match for {op} (this: {left}, that: {right})")]
    DimensionMismatch {
        op: &'static str,
        left: Shape,
        right: Shape,
    },

    #[error("expected {expected} values to build a matrix, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Errors raised by `Network::run` and `Network::train`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error(transparent)]
    Matrix(#[from] MatrixError),

    #[error("layer {layer} has no parameters; call randomize_params() first")]
    Uninitialized { layer: usize },

    #[error("network has no layers")]
    NoLayers,
}

/// Which of the two IDX streams a diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Images,
    Labels,
}

impl std::fmt::Display for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stream::Images => f.write_str("images"),
            Stream::Labels => f.write_str("labels"),
        }
    }
}

/// Format errors found while decoding an IDX image/label pair.
///
/// `decode_buffers` logs these and returns an empty sample list;
/// `parse_buffers` hands them to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatasetError {
    #[error("invalid magic number {found} in {stream} data, expected {expected}")]
    BadMagic {
        stream: Stream,
        found: u32,
        expected: u32,
    },

    #[error("images size ({images}) is different from labels size ({labels})")]
    CountMismatch { images: usize, labels: usize },

    #[error("{stream} data too short: need {needed} bytes, got {actual}")]
    Truncated {
        stream: Stream,
        needed: usize,
        actual: usize,
    },

    #[error("{stream} header declares more data than can be addressed")]
    SizeOverflow { stream: Stream },
}

/// Errors raised while reading or writing a `NetworkSpec` file.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("spec file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("spec file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid network spec: {0}")]
    Invalid(String),
}
