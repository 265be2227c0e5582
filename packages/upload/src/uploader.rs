//! Uploader contract.
//!
//! The transport is entirely the caller's. An uploader receives the
//! processed file plus the task's cancellation token and resolves to the
//! final reference (usually a URL).

use crate::error::{UploadError, UploadResult};
use crate::file::MediaFile;
use async_trait::async_trait;
use std::fmt::Display;
use std::future::Future;
use std::marker::PhantomData;
use tokio_util::sync::CancellationToken;

#[async_trait]
pub trait Uploader: Send + Sync {
    /// Should return early with `UploadError::Cancelled` once `token` fires
    async fn upload(&self, file: MediaFile, token: CancellationToken) -> UploadResult<String>;
}

/// Adapts an async closure into an [`Uploader`]
pub struct FnUploader<F, Fut, E> {
    f: F,
    _marker: PhantomData<fn() -> (Fut, E)>,
}

pub fn uploader_fn<F, Fut, E>(f: F) -> FnUploader<F, Fut, E>
where
    F: Fn(MediaFile, CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, E>> + Send,
    E: Display,
{
    FnUploader {
        f,
        _marker: PhantomData,
    }
}

#[async_trait]
impl<F, Fut, E> Uploader for FnUploader<F, Fut, E>
where
    F: Fn(MediaFile, CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, E>> + Send,
    E: Display,
{
    async fn upload(&self, file: MediaFile, token: CancellationToken) -> UploadResult<String> {
        if token.is_cancelled() {
            return Err(UploadError::Cancelled);
        }
        (self.f)(file, token)
            .await
            .map_err(|e| UploadError::upload_failure(e.to_string()))
    }
}
