#![allow(dead_code)]

use async_trait::async_trait;
use folio_common::{DocumentTree, ImageAttrs, Node};
use folio_editor::{Document, SharedDocument};
use folio_upload::{
    CancellationToken, MediaFile, Preprocess, QueueConfig, ReferenceProbe, UploadError,
    UploadQueue, UploadResult, Uploader,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};

pub fn shared_document() -> Arc<SharedDocument> {
    Arc::new(SharedDocument::new(Document::from_tree(
        "doc.json",
        DocumentTree::new(),
    )))
}

pub fn queue_with(
    document: &Arc<SharedDocument>,
    config: QueueConfig,
    preprocessor: Arc<dyn Preprocess>,
) -> UploadQueue {
    UploadQueue::builder(document.clone())
        .config(config)
        .preprocessor(preprocessor)
        .probe(Arc::new(AcceptAll))
        .build()
        .unwrap()
}

pub fn png_file(name: &str) -> MediaFile {
    MediaFile::new(name, "image/png", vec![0u8; 16])
}

/// Image nodes at the root, in document order
pub fn images(document: &SharedDocument) -> Vec<ImageAttrs> {
    document
        .tree()
        .blocks
        .iter()
        .filter_map(|node| match node {
            Node::Image { attrs, .. } => Some(attrs.clone()),
            _ => None,
        })
        .collect()
}

pub async fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for {}", what);
}

/// Returns the file untouched
pub struct PassThrough;

#[async_trait]
impl Preprocess for PassThrough {
    async fn resize(
        &self,
        file: MediaFile,
        _max_size: Option<u64>,
        _force_reduce: bool,
        _token: &CancellationToken,
    ) -> UploadResult<MediaFile> {
        Ok(file)
    }
}

/// Blocks in "compressing" until released or cancelled
#[derive(Default)]
pub struct HoldingPreprocessor {
    pub started: AtomicUsize,
    pub release: Notify,
}

#[async_trait]
impl Preprocess for HoldingPreprocessor {
    async fn resize(
        &self,
        file: MediaFile,
        _max_size: Option<u64>,
        _force_reduce: bool,
        token: &CancellationToken,
    ) -> UploadResult<MediaFile> {
        self.started.fetch_add(1, Ordering::SeqCst);
        tokio::select! {
            _ = token.cancelled() => Err(UploadError::Cancelled),
            _ = self.release.notified() => Ok(file),
        }
    }
}

/// Records calls and answers `https://cdn.test/<name>`
#[derive(Default)]
pub struct RecordingUploader {
    pub calls: Mutex<Vec<MediaFile>>,
}

impl RecordingUploader {
    pub fn names(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|f| f.name.clone()).collect()
    }
}

#[async_trait]
impl Uploader for RecordingUploader {
    async fn upload(&self, file: MediaFile, _token: CancellationToken) -> UploadResult<String> {
        let url = format!("https://cdn.test/{}", file.name);
        self.calls.lock().unwrap().push(file);
        Ok(url)
    }
}

/// Each upload waits for one permit; permits are handed out in arrival order
pub struct GatedUploader {
    pub started: Mutex<Vec<String>>,
    pub gate: Semaphore,
}

impl GatedUploader {
    pub fn new() -> Self {
        Self {
            started: Mutex::new(Vec::new()),
            gate: Semaphore::new(0),
        }
    }

    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }
}

#[async_trait]
impl Uploader for GatedUploader {
    async fn upload(&self, file: MediaFile, token: CancellationToken) -> UploadResult<String> {
        self.started.lock().unwrap().push(file.name.clone());
        tokio::select! {
            _ = token.cancelled() => Err(UploadError::Cancelled),
            permit = self.gate.acquire() => {
                permit.map_err(|e| UploadError::upload_failure(e.to_string()))?.forget();
                Ok(format!("https://cdn.test/{}", file.name))
            }
        }
    }
}

/// Ignores cancellation once started; each call waits for one `release`
#[derive(Default)]
pub struct StubbornUploader {
    pub started: Mutex<Vec<String>>,
    pub release: Notify,
    pub active: AtomicUsize,
    pub peak: AtomicUsize,
}

impl StubbornUploader {
    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }
}

#[async_trait]
impl Uploader for StubbornUploader {
    async fn upload(&self, file: MediaFile, _token: CancellationToken) -> UploadResult<String> {
        self.started.lock().unwrap().push(file.name.clone());
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(active, Ordering::SeqCst);

        self.release.notified().await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(format!("https://cdn.test/{}", file.name))
    }
}

/// Fails the first `failures` calls
pub struct FlakyUploader {
    pub failures: usize,
    pub calls: AtomicUsize,
}

#[async_trait]
impl Uploader for FlakyUploader {
    async fn upload(&self, file: MediaFile, _token: CancellationToken) -> UploadResult<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            Err(UploadError::upload_failure(""))
        } else {
            Ok(format!("https://cdn.test/{}", file.name))
        }
    }
}

pub struct AcceptAll;

#[async_trait]
impl ReferenceProbe for AcceptAll {
    async fn probe(&self, _reference: &str) -> Result<(), String> {
        Ok(())
    }
}

/// A reference that never finishes loading
pub struct NeverLoads;

#[async_trait]
impl ReferenceProbe for NeverLoads {
    async fn probe(&self, _reference: &str) -> Result<(), String> {
        std::future::pending::<()>().await;
        Ok(())
    }
}
