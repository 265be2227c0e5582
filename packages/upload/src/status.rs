use crate::task::TaskId;
use serde::{Deserialize, Serialize};

/// Externally visible phase of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Waiting for a concurrency slot
    Queued,
    Compressing,
    Uploading,
    Validating,
    Success,
    Failed,
}

impl Status {
    /// Holding a concurrency slot
    pub fn is_active(self) -> bool {
        matches!(self, Status::Compressing | Status::Uploading | Status::Validating)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Success | Status::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Queued => "queued",
            Status::Compressing => "compressing",
            Status::Uploading => "uploading",
            Status::Validating => "validating",
            Status::Success => "success",
            Status::Failed => "failed",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub id: TaskId,
    pub file_name: String,
    pub status: Status,
    pub original_size: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compressed_size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusSnapshot {
    pub(crate) fn new(id: TaskId, file_name: &str, original_size: u64) -> Self {
        Self {
            id,
            file_name: file_name.to_string(),
            status: Status::Queued,
            original_size,
            compressed_size: None,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_json_shape() {
        let mut snapshot = StatusSnapshot::new(TaskId::new("a"), "a.png", 10);
        snapshot.status = Status::Failed;
        snapshot.error = Some("Failed to upload image".to_string());

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["fileName"], "a.png");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["originalSize"], 10);
        assert!(json.get("compressedSize").is_none());
    }

    #[test]
    fn test_active_statuses() {
        assert!(!Status::Queued.is_active());
        assert!(Status::Uploading.is_active());
        assert!(Status::Failed.is_terminal());
        assert!(!Status::Validating.is_terminal());
    }
}
