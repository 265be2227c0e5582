//! Editor-facing entry point for inserting images.
//!
//! Drop, paste and the file picker all funnel into [`upload_images_from`],
//! which applies the per-gesture limits before anything reaches the queue.

use crate::config::AcceptPattern;
use crate::error::CommandError;
use crate::file::MediaFile;
use crate::queue::UploadQueue;
use crate::task::{TaskId, UploadRequest};
use crate::uploader::Uploader;
use folio_common::Position;
use std::sync::Arc;

/// Where a batch of files came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadSource {
    Drop,
    Paste,
    Picker,
}

impl std::fmt::Display for UploadSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            UploadSource::Drop => "drop",
            UploadSource::Paste => "paste",
            UploadSource::Picker => "picker",
        })
    }
}

pub fn upload_images(
    queue: &UploadQueue,
    files: Vec<MediaFile>,
    position: Position,
    uploader: Arc<dyn Uploader>,
) -> Result<Vec<TaskId>, CommandError> {
    upload_images_from(UploadSource::Picker, queue, files, position, uploader)
}

/// Filter, cap and enqueue `files` at consecutive positions starting at `position`
pub fn upload_images_from(
    source: UploadSource,
    queue: &UploadQueue,
    files: Vec<MediaFile>,
    position: Position,
    uploader: Arc<dyn Uploader>,
) -> Result<Vec<TaskId>, CommandError> {
    let config = queue.config();
    let accept = AcceptPattern::parse(&config.accept);
    let offered = files.len();

    let mut accepted: Vec<MediaFile> = files
        .into_iter()
        .filter(|file| accept.matches(&file.mime, &file.name))
        .collect();
    if accepted.is_empty() {
        return Err(CommandError::NoAcceptedFiles(offered));
    }

    if config.max_files_per_drop > 0 {
        accepted.truncate(config.max_files_per_drop);
    }

    if let Some(limit) = config.max_embeddings {
        let current = queue.document().embed_count();
        if current >= limit {
            return Err(CommandError::EmbedLimitReached { current, limit });
        }
        accepted.truncate(limit - current);
    }

    tracing::info!(
        "[upload_images] {} of {} files from {}",
        accepted.len(),
        offered,
        source
    );

    let ids = accepted
        .into_iter()
        .enumerate()
        .map(|(i, file)| queue.add(UploadRequest::new(file, position.offset(i), uploader.clone())))
        .collect();

    Ok(ids)
}
