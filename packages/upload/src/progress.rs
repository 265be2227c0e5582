//! Progress estimation for upload lists.
//!
//! Snapshots only carry a phase, so percentages are phase floors. A failed
//! task keeps the percentage it reached; a retried one starts over.

use crate::broadcast::SubscriptionId;
use crate::queue::UploadQueue;
use crate::status::{Status, StatusSnapshot};
use crate::task::TaskId;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

fn phase_floor(status: Status) -> Option<u8> {
    match status {
        Status::Queued => Some(0),
        Status::Compressing => Some(8),
        Status::Uploading => Some(30),
        Status::Validating => Some(80),
        Status::Success => Some(100),
        Status::Failed => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub avg_percent: u8,
    pub failed_count: usize,
    pub has_failed: bool,
    pub has_uploading: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    entries: HashMap<TaskId, (Status, u8)>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in a full snapshot list; ids missing from it are dropped
    pub fn observe(&mut self, snapshots: &[StatusSnapshot]) {
        let mut next = HashMap::with_capacity(snapshots.len());
        for snapshot in snapshots {
            let previous = self.entries.get(&snapshot.id);
            let percent = match (phase_floor(snapshot.status), previous) {
                (None, Some((_, pct))) => *pct,
                (None, None) => 0,
                // Retried task starts over
                (Some(floor), Some((Status::Failed, _))) => floor,
                (Some(floor), Some((_, pct))) => floor.max(*pct),
                (Some(floor), None) => floor,
            };
            next.insert(snapshot.id.clone(), (snapshot.status, percent));
        }
        self.entries = next;
    }

    pub fn percent(&self, id: &TaskId) -> Option<u8> {
        self.entries.get(id).map(|(_, pct)| *pct)
    }

    pub fn summary(&self) -> ProgressSummary {
        let total: u32 = self.entries.values().map(|(_, pct)| u32::from(*pct)).sum();
        let avg_percent = if self.entries.is_empty() {
            0
        } else {
            (total / self.entries.len() as u32) as u8
        };
        let failed_count = self
            .entries
            .values()
            .filter(|(status, _)| *status == Status::Failed)
            .count();
        let has_uploading = self
            .entries
            .values()
            .any(|(status, _)| !status.is_terminal());

        ProgressSummary {
            avg_percent,
            failed_count,
            has_failed: failed_count > 0,
            has_uploading,
        }
    }

    /// Keep a shared tracker in sync with `queue`
    pub fn attach(queue: &UploadQueue) -> (Arc<Mutex<ProgressTracker>>, SubscriptionId) {
        let tracker = Arc::new(Mutex::new(ProgressTracker::new()));
        tracker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .observe(&queue.snapshots());

        let sink = tracker.clone();
        let id = queue.subscribe(move |snapshots| {
            sink.lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .observe(snapshots);
        });
        (tracker, id)
    }
}
