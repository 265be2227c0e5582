//! Size cap handling through the real image preprocessor

mod common;

use common::*;
use folio_common::Position;
use folio_upload::{ImagePreprocessor, MediaFile, QueueConfig, Status, UploadRequest};
use std::io::Cursor;
use std::sync::Arc;

const ONE_MB: u64 = 1_000_000;

/// ~2MB PNG of pseudo-random pixels (noise doesn't compress)
fn noisy_png() -> MediaFile {
    let mut seed: u32 = 0x2545_f491;
    let img = image::RgbaImage::from_fn(740, 740, |_, _| {
        let mut next = || {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (seed >> 24) as u8
        };
        image::Rgba([next(), next(), next(), next()])
    });

    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    MediaFile::new("noise.png", "image/png", buf.into_inner())
}

fn config(force_reduce_size: bool) -> QueueConfig {
    QueueConfig {
        max_size: Some(ONE_MB),
        force_reduce_size,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_oversized_rejected_without_force_reduce() {
    let file = noisy_png();
    assert!(file.size() > 2 * ONE_MB);

    let document = shared_document();
    let queue = queue_with(&document, config(false), Arc::new(ImagePreprocessor::new()));
    let uploader = Arc::new(RecordingUploader::default());

    let id = queue.add(UploadRequest::new(file, Position::root(0), uploader.clone()));
    queue.wait_idle().await;

    assert_eq!(queue.snapshot(&id).unwrap().status, Status::Failed);
    assert!(uploader.names().is_empty());
}

#[tokio::test]
async fn test_oversized_reduced_with_force_reduce() {
    let file = noisy_png();
    let original = file.size();

    let document = shared_document();
    let queue = queue_with(&document, config(true), Arc::new(ImagePreprocessor::new()));
    let uploader = Arc::new(RecordingUploader::default());

    let id = queue.add(UploadRequest::new(file, Position::root(0), uploader.clone()));
    queue.wait_idle().await;

    let snapshot = queue.snapshot(&id).unwrap();
    assert_eq!(snapshot.status, Status::Success);
    assert_eq!(snapshot.original_size, original);

    let uploaded = uploader.calls.lock().unwrap()[0].clone();
    assert!(uploaded.size() <= ONE_MB, "uploaded {} bytes", uploaded.size());
    assert_eq!(uploaded.mime, "image/jpeg");
    assert_eq!(uploaded.name, "noise.jpg");
    assert_eq!(snapshot.compressed_size, Some(uploaded.size()));

    assert_eq!(images(&document)[0].src, "https://cdn.test/noise.jpg");
}
