//! # Image Preprocessing
//!
//! Oversized images are downscaled and re-encoded as JPEG until they fit the
//! byte cap.
//!
//! ## Algorithm
//!
//! 1. Pixel budget = `max_size / ESTIMATED_BYTES_PER_PIXEL`
//! 2. If the natural area fits the budget, keep the dimensions (re-encode only);
//!    otherwise scale both sides by `sqrt(budget / area)`
//! 3. Encode at each of `JPEG_QUALITIES`; stop at the first that fits
//! 4. Still too large: shrink by `SHRINK_FACTOR` per step (never below
//!    `MIN_DIMENSION`) at the lowest quality
//! 5. Nothing fits: return the smallest encoding produced
//!
//! Decoding and encoding are CPU bound and run on the blocking pool. The
//! cancellation token is checked before decode, after decode and after every
//! encode.

use crate::error::{UploadError, UploadResult};
use crate::file::MediaFile;
use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use tokio_util::sync::CancellationToken;

pub const ESTIMATED_BYTES_PER_PIXEL: f64 = 0.25;
pub const JPEG_QUALITIES: [u8; 4] = [85, 75, 60, 45];
pub const SHRINK_FACTOR: f64 = 0.85;
pub const MIN_DIMENSION: u32 = 16;

/// Turns an incoming file into the file that gets uploaded
#[async_trait]
pub trait Preprocess: Send + Sync {
    async fn resize(
        &self,
        file: MediaFile,
        max_size: Option<u64>,
        force_reduce: bool,
        token: &CancellationToken,
    ) -> UploadResult<MediaFile>;
}

/// Returns the cap to reduce to, `None` when the file can go through as is
pub fn check_size(size: u64, max_size: Option<u64>, force_reduce: bool) -> UploadResult<Option<u64>> {
    match max_size {
        Some(limit) if size > limit => {
            if force_reduce {
                Ok(Some(limit))
            } else {
                Err(UploadError::size_limit(size, limit))
            }
        }
        _ => Ok(None),
    }
}

/// Target dimensions for the first encode
pub fn plan_resize(width: u32, height: u32, max_size: u64) -> (u32, u32) {
    let budget = max_size as f64 / ESTIMATED_BYTES_PER_PIXEL;
    let area = width as f64 * height as f64;
    if area <= budget {
        return (width, height);
    }

    let scale = (budget / area).sqrt();
    (
        ((width as f64 * scale).floor() as u32).max(1),
        ((height as f64 * scale).floor() as u32).max(1),
    )
}

fn shrink(width: u32, height: u32) -> (u32, u32) {
    let step = |side: u32| ((side as f64 * SHRINK_FACTOR).floor() as u32).max(MIN_DIMENSION.min(side));
    (step(width), step(height))
}

fn checkpoint(token: &CancellationToken) -> UploadResult<()> {
    if token.is_cancelled() {
        Err(UploadError::Cancelled)
    } else {
        Ok(())
    }
}

fn encode_jpeg(image: &RgbImage, quality: u8) -> UploadResult<Vec<u8>> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality).encode_image(image)?;
    Ok(buf)
}

/// Blocking decode + reduce loop
pub fn reduce(bytes: &[u8], max_size: u64, token: &CancellationToken) -> UploadResult<Vec<u8>> {
    checkpoint(token)?;
    let decoded = image::load_from_memory(bytes)?;
    checkpoint(token)?;

    let (width, height) = plan_resize(decoded.width(), decoded.height(), max_size);
    let mut current = if (width, height) == (decoded.width(), decoded.height()) {
        decoded.to_rgb8()
    } else {
        image::imageops::thumbnail(&decoded.to_rgb8(), width, height)
    };
    drop(decoded);

    let mut smallest: Option<Vec<u8>> = None;
    let mut keep_smallest = |encoded: Vec<u8>| -> Option<Vec<u8>> {
        if encoded.len() as u64 <= max_size {
            return Some(encoded);
        }
        if smallest.as_ref().map_or(true, |s| encoded.len() < s.len()) {
            smallest = Some(encoded);
        }
        None
    };

    for quality in JPEG_QUALITIES {
        let encoded = encode_jpeg(&current, quality)?;
        checkpoint(token)?;
        if let Some(fits) = keep_smallest(encoded) {
            return Ok(fits);
        }
    }

    let lowest = JPEG_QUALITIES[JPEG_QUALITIES.len() - 1];
    loop {
        let (w, h) = current.dimensions();
        let (next_w, next_h) = shrink(w, h);
        if (next_w, next_h) == (w, h) {
            break;
        }
        current = image::imageops::thumbnail(&current, next_w, next_h);

        let encoded = encode_jpeg(&current, lowest)?;
        checkpoint(token)?;
        if let Some(fits) = keep_smallest(encoded) {
            return Ok(fits);
        }
    }

    drop(keep_smallest);
    smallest.ok_or_else(|| UploadError::CompressionFailure("no encoding produced".to_string()))
}

/// Default preprocessor backed by the `image` crate
#[derive(Debug, Clone, Default)]
pub struct ImagePreprocessor;

impl ImagePreprocessor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Preprocess for ImagePreprocessor {
    async fn resize(
        &self,
        file: MediaFile,
        max_size: Option<u64>,
        force_reduce: bool,
        token: &CancellationToken,
    ) -> UploadResult<MediaFile> {
        let Some(limit) = check_size(file.size(), max_size, force_reduce)? else {
            return Ok(file);
        };
        checkpoint(token)?;

        let bytes = file.bytes.clone();
        let worker_token = token.clone();
        let encoded = tokio::task::spawn_blocking(move || reduce(&bytes, limit, &worker_token))
            .await
            .map_err(|e| UploadError::CompressionFailure(e.to_string()))??;

        tracing::debug!(
            "[Preprocess] {} reduced {} -> {} bytes (cap {})",
            file.name,
            file.size(),
            encoded.len(),
            limit
        );

        Ok(MediaFile::new(
            file.renamed_with_extension("jpg"),
            "image/jpeg",
            encoded,
        ))
    }
}
