//! Post-upload reference validation.
//!
//! An uploader can resolve with something that will never load. The probe
//! checks the returned reference before the placeholder is swapped; the queue
//! bounds it with a hard timeout and treats a timeout as invalid.

use crate::error::{UploadError, UploadResult};
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

#[async_trait]
pub trait ReferenceProbe: Send + Sync {
    /// `Err` carries the reason the reference was rejected
    async fn probe(&self, reference: &str) -> Result<(), String>;
}

/// Structural URL check; `file:` references must exist on disk
#[derive(Debug, Clone, Default)]
pub struct UrlProbe;

#[async_trait]
impl ReferenceProbe for UrlProbe {
    async fn probe(&self, reference: &str) -> Result<(), String> {
        let url = Url::parse(reference).map_err(|e| format!("{}: {}", reference, e))?;

        match url.scheme() {
            "http" | "https" => match url.host_str() {
                Some(host) if !host.is_empty() => Ok(()),
                _ => Err(format!("{}: missing host", reference)),
            },
            "data" => {
                if url.path().contains(',') {
                    Ok(())
                } else {
                    Err(format!("{}: malformed data URL", reference))
                }
            }
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| format!("{}: not a local path", reference))?;
                match tokio::fs::metadata(&path).await {
                    Ok(meta) if meta.is_file() => Ok(()),
                    Ok(_) => Err(format!("{} is not a file", path.display())),
                    Err(e) => Err(format!("{}: {}", path.display(), e)),
                }
            }
            other => Err(format!("{}: unsupported scheme '{}'", reference, other)),
        }
    }
}

/// Run `probe` under `timeout`; a timeout is an invalid reference
pub async fn validate_reference(
    probe: &dyn ReferenceProbe,
    reference: &str,
    timeout: Duration,
) -> UploadResult<()> {
    match tokio::time::timeout(timeout, probe.probe(reference)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(reason)) => Err(UploadError::InvalidReference(reason)),
        Err(_) => Err(UploadError::InvalidReference(format!(
            "{} did not load within {}ms",
            reference,
            timeout.as_millis()
        ))),
    }
}
