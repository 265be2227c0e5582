//! Uploader that "hosts" files by copying them into a local directory.

use async_trait::async_trait;
use folio_upload::{CancellationToken, MediaFile, UploadError, UploadResult, Uploader};
use std::path::{Path, PathBuf};
use url::Url;

pub struct DirectoryUploader {
    dir: PathBuf,
}

impl DirectoryUploader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn target_for(&self, file: &MediaFile) -> PathBuf {
        let base = Path::new(&file.name)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let unique = uuid::Uuid::new_v4().simple().to_string();
        self.dir.join(format!("{}-{}", &unique[..8], base))
    }
}

fn io_failure(err: std::io::Error) -> UploadError {
    UploadError::upload_failure(err.to_string())
}

#[async_trait]
impl Uploader for DirectoryUploader {
    async fn upload(&self, file: MediaFile, token: CancellationToken) -> UploadResult<String> {
        if token.is_cancelled() {
            return Err(UploadError::Cancelled);
        }

        tokio::fs::create_dir_all(&self.dir).await.map_err(io_failure)?;
        let target = self.target_for(&file);

        tokio::select! {
            _ = token.cancelled() => return Err(UploadError::Cancelled),
            written = tokio::fs::write(&target, &file.bytes[..]) => written.map_err(io_failure)?,
        }

        let absolute = tokio::fs::canonicalize(&target).await.map_err(io_failure)?;
        let url = Url::from_file_path(&absolute).map_err(|_| {
            UploadError::upload_failure(format!("{} is not an absolute path", absolute.display()))
        })?;

        tracing::debug!("[DirectoryUploader] {} -> {}", file.name, url);
        Ok(url.to_string())
    }
}
