use crate::task::TaskId;
use folio_common::CommonError;
use thiserror::Error;

pub const GENERIC_UPLOAD_ERROR: &str = "Failed to upload image";

/// Failure of a single task. Handled inside the task routine and surfaced
/// only through status snapshots.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UploadError {
    #[error("File is {size} bytes, {overage} over the {limit} byte limit")]
    SizeLimitExceeded { size: u64, limit: u64, overage: u64 },

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("Image processing failed: {0}")]
    CompressionFailure(String),

    #[error("{0}")]
    UploadFailure(String),

    #[error("Uploaded reference failed validation: {0}")]
    InvalidReference(String),

    #[error("Cancelled")]
    Cancelled,

    #[error("Document error: {0}")]
    Document(#[from] CommonError),
}

impl UploadError {
    pub fn size_limit(size: u64, limit: u64) -> Self {
        UploadError::SizeLimitExceeded {
            size,
            limit,
            overage: size.saturating_sub(limit),
        }
    }

    /// Upload failure carrying the uploader's message, or the generic one
    pub fn upload_failure(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            UploadError::UploadFailure(GENERIC_UPLOAD_ERROR.to_string())
        } else {
            UploadError::UploadFailure(message)
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, UploadError::Cancelled)
    }
}

impl From<image::ImageError> for UploadError {
    fn from(e: image::ImageError) -> Self {
        UploadError::CompressionFailure(e.to_string())
    }
}

/// Misuse of the queue API
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueueError {
    #[error("Task not found: {0}")]
    NotFound(TaskId),

    #[error("Task {0} is not in a failed state")]
    NotRetryable(TaskId),

    #[error("Upload queue requires a Tokio runtime")]
    NoRuntime,
}

/// Rejection of an `upload_images` call before anything was queued
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("None of the {0} files match the accepted types")]
    NoAcceptedFiles(usize),

    #[error("Document already holds {current} of {limit} embeds")]
    EmbedLimitReached { current: usize, limit: usize },
}

pub type UploadResult<T> = Result<T, UploadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_limit_overage() {
        let err = UploadError::size_limit(2_000_000, 1_000_000);
        assert_eq!(
            err,
            UploadError::SizeLimitExceeded {
                size: 2_000_000,
                limit: 1_000_000,
                overage: 1_000_000
            }
        );
    }

    #[test]
    fn test_empty_upload_message_falls_back() {
        assert_eq!(
            UploadError::upload_failure("").to_string(),
            GENERIC_UPLOAD_ERROR
        );
        assert_eq!(UploadError::upload_failure("503").to_string(), "503");
    }
}
