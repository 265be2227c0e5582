use crate::config::UploadConstraints;
use crate::file::MediaFile;
use crate::uploader::Uploader;
use folio_common::{Marker, Position};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Task identity, stable across retry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// `<file name>-<submission millis>-<sequence>`
    pub(crate) fn generate(file_name: &str, sequence: u64) -> Self {
        Self(format!(
            "{}-{}-{}",
            file_name,
            chrono::Utc::now().timestamp_millis(),
            sequence
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// What a caller hands to [`UploadQueue::add`](crate::UploadQueue::add)
#[derive(Clone)]
pub struct UploadRequest {
    pub file: MediaFile,
    pub position: Position,
    pub uploader: Arc<dyn Uploader>,
    pub id: Option<TaskId>,
    pub constraints: Option<UploadConstraints>,
}

impl UploadRequest {
    pub fn new(file: MediaFile, position: Position, uploader: Arc<dyn Uploader>) -> Self {
        Self {
            file,
            position,
            uploader,
            id: None,
            constraints: None,
        }
    }

    /// Reuse an existing id, e.g. to replace a failed task's entry
    pub fn with_id(mut self, id: impl Into<TaskId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Override the queue-wide constraints for this file
    pub fn with_constraints(mut self, constraints: UploadConstraints) -> Self {
        self.constraints = Some(constraints);
        self
    }
}

/// Everything needed to run (and re-run) one upload
#[derive(Clone)]
pub(crate) struct UploadTask {
    pub id: TaskId,
    pub file: MediaFile,
    pub position: Position,
    pub uploader: Arc<dyn Uploader>,
    pub constraints: UploadConstraints,
    pub marker: Marker,
}

impl fmt::Debug for UploadTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadTask")
            .field("id", &self.id)
            .field("file", &self.file)
            .field("position", &self.position)
            .field("marker", &self.marker)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_id_shape() {
        let id = TaskId::generate("cat.png", 7);
        let s = id.as_str();
        assert!(s.starts_with("cat.png-"));
        assert!(s.ends_with("-7"));
        assert_ne!(TaskId::generate("cat.png", 8), id);
    }

    #[test]
    fn test_task_id_serializes_as_string() {
        let id = TaskId::new("a-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"a-1\"");
    }
}
