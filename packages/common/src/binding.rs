//! # Document Binding
//!
//! The only surface the upload pipeline uses to touch a live document.
//!
//! Every operation is addressed by [`Marker`], never by a stored offset:
//! the user keeps editing while uploads are in flight, so a placeholder's
//! index changes under the queue's feet. Placeholder operations must not be
//! recorded in the document's undo history.

use crate::node::{Locator, Position};
use crate::result::CommonResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable, task-scoped identifier stored on a placeholder node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Marker(String);

impl Marker {
    pub const PREFIX: &'static str = "folio-upload:";

    /// Fresh random marker
    pub fn new() -> Self {
        Self(format!("{}{}", Self::PREFIX, uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Marker {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for Marker {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Attribute set written to a placeholder during reconciliation
#[derive(Debug, Clone, PartialEq)]
pub enum PlaceholderState {
    /// Upload in progress, showing a local preview
    Loading { preview: String },

    /// Upload landed; `src` is the final reference and the marker is dropped
    Ready { src: String },

    /// Upload failed; the marker is kept so a retry can find the node
    Failed { error: String },
}

/// Document operations the upload pipeline depends on
pub trait DocumentBinding: Send + Sync {
    /// Insert a loading image node at `position` (no undo history)
    fn insert_placeholder(
        &self,
        position: &Position,
        marker: &Marker,
        preview: &str,
    ) -> CommonResult<()>;

    /// Scan the current document for the node carrying `marker`
    fn find_by_marker(&self, marker: &Marker) -> Option<Locator>;

    /// Atomically replace the placeholder's attributes (no undo history).
    /// Returns whether a node was found.
    fn update_by_marker(&self, marker: &Marker, state: PlaceholderState) -> bool;

    /// Remove the placeholder (no undo history). Returns whether a node was found.
    fn remove_by_marker(&self, marker: &Marker) -> bool;

    /// Number of embed nodes currently in the document
    fn embed_count(&self) -> usize;
}
