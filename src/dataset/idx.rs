//! Decoder for the MNIST IDX image/label pair.
//!
//! # Label stream layout
//! ```text
//! bytes 0-3:  magic 2049 (big-endian u32)
//! bytes 4-7:  N, number of labels (big-endian u32)
//! bytes 8..:  N bytes, one digit class each
//! ```
//!
//! # Image stream layout
//! ```text
//! bytes  0-3:   magic 2051 (big-endian u32)
//! bytes  4-7:   N, number of images (big-endian u32)
//! bytes  8-11:  rows (big-endian u32)
//! bytes 12-15:  cols (big-endian u32)
//! bytes 16..:   N * rows * cols pixel bytes, image-major then row-major
//! ```
//!
//! Format problems never surface as errors from `decode_mnist` or
//! `decode_buffers`: they are logged and the result is empty.
use serde::Serialize;
use std::io;
use std::path::Path;
use tracing::{error, info};

use crate::dataset::provider::{ByteProvider, FileProvider};
use crate::error::{DatasetError, Stream};
use crate::math::matrix::Matrix;

pub const LABELS_MAGIC: u32 = 2049;
pub const IMAGES_MAGIC: u32 = 2051;

const LABELS_HEADER_LEN: usize = 8;
const IMAGES_HEADER_LEN: usize = 16;

/// One decoded sample. `image` holds `rows * cols` values in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MnistEntry {
    pub label: u8,
    pub image: Vec<f64>,
}

impl MnistEntry {
    /// The image as an `n x 1` column, ready for `Network::run`.
    pub fn input(&self) -> Matrix {
        let n = self.image.len();
        Matrix::filling(|i, _| self.image[i], n, 1)
    }

    /// One-hot `classes x 1` target, or `None` if the label does not fit.
    pub fn one_hot(&self, classes: usize) -> Option<Matrix> {
        let label = self.label as usize;
        if label >= classes {
            return None;
        }
        let mut target = Matrix::zeros(classes, 1);
        target.set(label, 0, 1.0);
        Some(target)
    }
}

/// Labels read from the label stream, already cut to the sample limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    /// Count declared in the header.
    pub declared: usize,
    pub labels: Vec<u8>,
}

fn read_u32_be(bytes: &[u8], offset: usize, stream: Stream) -> Result<u32, DatasetError> {
    match bytes.get(offset..offset + 4) {
        Some(b) => Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]])),
        None => Err(DatasetError::Truncated {
            stream,
            needed: offset + 4,
            actual: bytes.len(),
        }),
    }
}

fn check_magic(bytes: &[u8], stream: Stream, expected: u32) -> Result<(), DatasetError> {
    let found = read_u32_be(bytes, 0, stream)?;
    if found != expected {
        return Err(DatasetError::BadMagic { stream, found, expected });
    }
    Ok(())
}

fn take_count(declared: usize, limit: Option<usize>) -> usize {
    limit.map_or(declared, |l| declared.min(l))
}

/// Validates the label stream and reads up to `limit` labels.
pub fn parse_labels(bytes: &[u8], limit: Option<usize>) -> Result<LabelSet, DatasetError> {
    check_magic(bytes, Stream::Labels, LABELS_MAGIC)?;
    let declared = read_u32_be(bytes, 4, Stream::Labels)? as usize;

    let n = take_count(declared, limit);
    let end = LABELS_HEADER_LEN
        .checked_add(n)
        .ok_or(DatasetError::SizeOverflow { stream: Stream::Labels })?;
    let labels = bytes
        .get(LABELS_HEADER_LEN..end)
        .ok_or(DatasetError::Truncated {
            stream: Stream::Labels,
            needed: end,
            actual: bytes.len(),
        })?
        .to_vec();

    Ok(LabelSet { declared, labels })
}

/// Validates the image stream against `labels` and pairs them up.
pub fn parse_images(
    bytes: &[u8],
    labels: &LabelSet,
    limit: Option<usize>,
) -> Result<Vec<MnistEntry>, DatasetError> {
    check_magic(bytes, Stream::Images, IMAGES_MAGIC)?;
    let declared = read_u32_be(bytes, 4, Stream::Images)? as usize;
    if declared != labels.declared {
        return Err(DatasetError::CountMismatch {
            images: declared,
            labels: labels.declared,
        });
    }

    let rows = read_u32_be(bytes, 8, Stream::Images)? as usize;
    let cols = read_u32_be(bytes, 12, Stream::Images)? as usize;
    let n = take_count(declared, limit);

    // Header fields are untrusted; a size that does not fit in usize can
    // never be backed by the buffer.
    let overflow = DatasetError::SizeOverflow { stream: Stream::Images };
    let pixels = rows.checked_mul(cols).ok_or(overflow.clone())?;
    let end = n
        .checked_mul(pixels)
        .and_then(|len| IMAGES_HEADER_LEN.checked_add(len))
        .ok_or(overflow)?;
    let data = bytes
        .get(IMAGES_HEADER_LEN..end)
        .ok_or(DatasetError::Truncated {
            stream: Stream::Images,
            needed: end,
            actual: bytes.len(),
        })?;

    let entries = (0..n)
        .map(|i| MnistEntry {
            label: labels.labels[i],
            image: data[i * pixels..(i + 1) * pixels]
                .iter()
                .map(|&px| px as f64 / 255.0)
                .collect(),
        })
        .collect();

    info!(samples = n, rows, cols, "decoded IDX dataset");
    Ok(entries)
}

/// Decodes both streams, reporting the first format problem found.
pub fn parse_buffers(
    image_bytes: &[u8],
    label_bytes: &[u8],
    limit: Option<usize>,
) -> Result<Vec<MnistEntry>, DatasetError> {
    let labels = parse_labels(label_bytes, limit)?;
    parse_images(image_bytes, &labels, limit)
}

fn log_and_discard(err: DatasetError) -> Vec<MnistEntry> {
    error!(%err, "failed to decode IDX dataset");
    Vec::new()
}

/// Decodes both streams; any format problem is logged and yields an empty
/// list.
pub fn decode_buffers(
    image_bytes: &[u8],
    label_bytes: &[u8],
    limit: Option<usize>,
) -> Vec<MnistEntry> {
    parse_buffers(image_bytes, label_bytes, limit).unwrap_or_else(log_and_discard)
}

/// Opens the label provider, then the image provider, and decodes them.
///
/// The image provider is not opened when the label stream is already
/// invalid. Transport errors from either provider are returned; format
/// problems are logged and produce an empty list.
pub async fn decode_mnist<I, L>(
    images: &I,
    labels: &L,
    limit: Option<usize>,
) -> io::Result<Vec<MnistEntry>>
where
    I: ByteProvider + ?Sized,
    L: ByteProvider + ?Sized,
{
    let label_bytes = labels.open().await?;
    let label_set = match parse_labels(&label_bytes, limit) {
        Ok(set) => set,
        Err(err) => return Ok(log_and_discard(err)),
    };

    let image_bytes = images.open().await?;
    Ok(parse_images(&image_bytes, &label_set, limit).unwrap_or_else(log_and_discard))
}

/// Which half of the dataset to load from a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Test,
}

impl Split {
    pub fn images_file(&self) -> &'static str {
        match self {
            Split::Train => "train_images",
            Split::Test => "test_images",
        }
    }

    pub fn labels_file(&self) -> &'static str {
        match self {
            Split::Train => "train_labels",
            Split::Test => "test_labels",
        }
    }
}

/// Loads `<dir>/<split>_images` and `<dir>/<split>_labels`.
pub async fn decode_mnist_from_dir(
    dir: impl AsRef<Path>,
    split: Split,
    limit: Option<usize>,
) -> io::Result<Vec<MnistEntry>> {
    let dir = dir.as_ref();
    let images = FileProvider::new(dir.join(split.images_file()));
    let labels = FileProvider::new(dir.join(split.labels_file()));
    decode_mnist(&images, &labels, limit).await
}
