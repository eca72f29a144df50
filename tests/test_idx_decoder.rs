// Tests for the IDX image/label decoder and its byte providers.

use async_trait::async_trait;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};

use digit_nn::dataset::idx::{parse_buffers, IMAGES_MAGIC, LABELS_MAGIC};
use digit_nn::error::Stream;
use digit_nn::{
    decode_buffers, decode_mnist, decode_mnist_from_dir, ByteProvider, DatasetError,
    FileProvider, MemoryProvider, MnistEntry, Split,
};

fn labels_stream(magic: u32, labels: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&magic.to_be_bytes());
    out.extend_from_slice(&(labels.len() as u32).to_be_bytes());
    out.extend_from_slice(labels);
    out
}

fn images_stream(magic: u32, count: u32, rows: u32, cols: u32, pixels: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    for field in [magic, count, rows, cols] {
        out.extend_from_slice(&field.to_be_bytes());
    }
    out.extend_from_slice(pixels);
    out
}

fn two_sample_streams() -> (Vec<u8>, Vec<u8>) {
    let labels = labels_stream(2049, &[3, 7]);
    let images = images_stream(2051, 2, 2, 2, &[255, 0, 0, 255, 0, 0, 0, 0]);
    (images, labels)
}

/// Provider that counts how often it is opened.
struct CountingProvider {
    bytes: Vec<u8>,
    opened: AtomicUsize,
}

#[async_trait]
impl ByteProvider for CountingProvider {
    async fn open(&self) -> io::Result<Vec<u8>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(self.bytes.clone())
    }
}

/// Provider whose transport always fails.
struct BrokenProvider;

#[async_trait]
impl ByteProvider for BrokenProvider {
    async fn open(&self) -> io::Result<Vec<u8>> {
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"))
    }
}

#[test]
fn magic_constants_match_format() {
    assert_eq!(LABELS_MAGIC, 2049);
    assert_eq!(IMAGES_MAGIC, 2051);
}

#[test]
fn decodes_two_samples() {
    let (images, labels) = two_sample_streams();
    let entries = decode_buffers(&images, &labels, None);
    assert_eq!(
        entries,
        vec![
            MnistEntry { label: 3, image: vec![1.0, 0.0, 0.0, 1.0] },
            MnistEntry { label: 7, image: vec![0.0, 0.0, 0.0, 0.0] },
        ]
    );
}

#[test]
fn wrong_labels_magic_yields_empty() {
    let (images, _) = two_sample_streams();
    let labels = labels_stream(1234, &[3, 7]);
    assert!(decode_buffers(&images, &labels, None).is_empty());
    assert_eq!(
        parse_buffers(&images, &labels, None).unwrap_err(),
        DatasetError::BadMagic {
            stream: digit_nn::error::Stream::Labels,
            found: 1234,
            expected: 2049,
        }
    );
}

#[test]
fn wrong_images_magic_yields_empty() {
    let (_, labels) = two_sample_streams();
    let images = images_stream(2049, 2, 2, 2, &[0; 8]);
    assert!(decode_buffers(&images, &labels, None).is_empty());
}

#[test]
fn count_mismatch_yields_empty() {
    let (_, labels) = two_sample_streams();
    let images = images_stream(2051, 3, 2, 2, &[0; 12]);
    assert!(decode_buffers(&images, &labels, None).is_empty());
    assert_eq!(
        parse_buffers(&images, &labels, None).unwrap_err(),
        DatasetError::CountMismatch { images: 3, labels: 2 }
    );
}

#[test]
fn limit_truncates_samples() {
    let (images, labels) = two_sample_streams();
    let entries = decode_buffers(&images, &labels, Some(1));
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].label, 3);

    let all = decode_buffers(&images, &labels, Some(10));
    assert_eq!(all.len(), 2);
}

#[test]
fn truncated_pixel_data_yields_empty() {
    let (_, labels) = two_sample_streams();
    let images = images_stream(2051, 2, 2, 2, &[255, 0, 0]);
    assert!(decode_buffers(&images, &labels, None).is_empty());
    assert!(matches!(
        parse_buffers(&images, &labels, None),
        Err(DatasetError::Truncated { .. })
    ));
}

#[test]
fn oversized_image_header_yields_empty() {
    let labels = labels_stream(2049, &vec![0u8; 65535]);
    // 65535 * 42009217 * 6700417 == u64::MAX, so adding the header length
    // would wrap.
    let exact = images_stream(2051, 65535, 42_009_217, 6_700_417, &[]);
    // Here the pixel count itself does not fit.
    let huge = images_stream(2051, 65535, u32::MAX, u32::MAX, &[]);

    for images in [exact, huge] {
        assert!(decode_buffers(&images, &labels, None).is_empty());
        assert_eq!(
            parse_buffers(&images, &labels, None),
            Err(DatasetError::SizeOverflow { stream: Stream::Images })
        );
    }
}

#[test]
fn pixels_are_scaled_into_unit_range() {
    let labels = labels_stream(2049, &[5]);
    let images = images_stream(2051, 1, 1, 3, &[0, 51, 255]);
    let entries = decode_buffers(&images, &labels, None);
    assert_eq!(entries[0].image, vec![0.0, 0.2, 1.0]);
}

#[tokio::test]
async fn async_decode_matches_buffer_decode() {
    let (images, labels) = two_sample_streams();
    let entries = decode_mnist(
        &MemoryProvider::new(images.clone()),
        &MemoryProvider::new(labels.clone()),
        None,
    )
    .await
    .unwrap();
    assert_eq!(entries, decode_buffers(&images, &labels, None));
}

#[tokio::test]
async fn invalid_labels_skip_opening_images() {
    let (images, _) = two_sample_streams();
    let images = CountingProvider { bytes: images, opened: AtomicUsize::new(0) };
    let labels = MemoryProvider::new(labels_stream(1234, &[3, 7]));

    let entries = decode_mnist(&images, &labels, None).await.unwrap();
    assert!(entries.is_empty());
    assert_eq!(images.opened.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn transport_errors_propagate() {
    let (images, _) = two_sample_streams();
    let err = decode_mnist(&MemoryProvider::new(images), &BrokenProvider, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
}

#[tokio::test]
async fn reads_split_files_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    let (images, labels) = two_sample_streams();
    std::fs::write(dir.path().join("test_images"), &images).unwrap();
    std::fs::write(dir.path().join("test_labels"), &labels).unwrap();

    let entries = decode_mnist_from_dir(dir.path(), Split::Test, None).await.unwrap();
    assert_eq!(entries.len(), 2);

    let missing = decode_mnist_from_dir(dir.path(), Split::Train, None).await;
    assert_eq!(missing.unwrap_err().kind(), io::ErrorKind::NotFound);
}

#[tokio::test]
async fn file_provider_reads_whole_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blob");
    std::fs::write(&path, [1u8, 2, 3]).unwrap();
    let provider = FileProvider::new(&path);
    assert_eq!(provider.path(), path.as_path());
    assert_eq!(provider.open().await.unwrap(), vec![1, 2, 3]);
}
