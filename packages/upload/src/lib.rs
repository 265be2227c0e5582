//! # Folio Upload
//!
//! Asynchronous media-upload pipeline for Folio documents.
//!
//! ## Architecture
//!
//! ```text
//! upload_images ──► UploadQueue ──► Preprocess ──► Uploader ──► ReferenceProbe
//!                      │                                             │
//!                      ├── DocumentBinding (placeholders by marker) ◄┘
//!                      └── StatusBroadcaster ──► listeners / ProgressTracker
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_upload::{uploader_fn, MediaFile, UploadQueue, UploadRequest};
//!
//! let queue = UploadQueue::builder(document).config(config).build()?;
//! queue.subscribe(|snapshots| println!("{:?}", snapshots));
//!
//! let uploader = Arc::new(uploader_fn(|file, _token| async move {
//!     my_cdn::put(file).await
//! }));
//! let id = queue.add(UploadRequest::new(file, Position::root(0), uploader));
//! queue.wait_idle().await;
//! ```

pub mod broadcast;
pub mod commands;
pub mod config;
pub mod error;
pub mod file;
pub mod preprocess;
pub mod probe;
pub mod progress;
pub mod queue;
pub mod resources;
pub mod status;
pub mod task;
pub mod uploader;

pub use broadcast::{StatusBroadcaster, SubscriptionId};
pub use commands::{upload_images, upload_images_from, UploadSource};
pub use config::{AcceptPattern, QueueConfig, UploadConstraints};
pub use error::{CommandError, QueueError, UploadError, UploadResult};
pub use file::MediaFile;
pub use preprocess::{ImagePreprocessor, Preprocess};
pub use probe::{validate_reference, ReferenceProbe, UrlProbe};
pub use progress::{ProgressSummary, ProgressTracker};
pub use queue::{UploadQueue, UploadQueueBuilder};
pub use resources::{LocalHandle, LocalResourceRegistry};
pub use status::{Status, StatusSnapshot};
pub use task::{TaskId, UploadRequest};
pub use uploader::{uploader_fn, FnUploader, Uploader};

pub use tokio_util::sync::CancellationToken;
