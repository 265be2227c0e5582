//! # Document Handle
//!
//! A Document is a single block tree plus its editing state. Documents can be:
//! - **Memory-backed**: Temporary, for testing or embedding
//! - **File-backed**: Persisted as pretty-printed JSON
//!
//! ## Lifecycle
//!
//! ```text
//! Load → Edit → Save
//!   ↓      ↓      ↓
//! JSON  Mutations JSON
//! ```
//!
//! Every successful mutation bumps `version`. Mutations applied with
//! [`History::Skip`] change the tree without touching undo/redo; the upload
//! pipeline uses this for placeholders.

use crate::{EditorError, Mutation, MutationResult, UndoStack};
use folio_common::DocumentTree;
use std::path::{Path, PathBuf};

/// Whether an applied mutation becomes an undo step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum History {
    Record,
    Skip,
}

/// Editable document
#[derive(Debug)]
pub struct Document {
    /// Path to backing file (informational for memory documents)
    pub path: PathBuf,

    /// Current version number (increments on each applied mutation)
    pub version: u64,

    storage: DocumentStorage,
    history: UndoStack,
}

/// Storage backend for document
#[derive(Debug)]
pub enum DocumentStorage {
    /// In-memory only
    Memory { tree: DocumentTree },

    /// File-backed
    File { tree: DocumentTree, dirty: bool },
}

impl Document {
    /// Memory-backed document wrapping an existing tree
    pub fn from_tree(path: impl Into<PathBuf>, tree: DocumentTree) -> Self {
        Self {
            path: path.into(),
            version: 0,
            storage: DocumentStorage::Memory { tree },
            history: UndoStack::new(),
        }
    }

    /// Memory-backed document parsed from JSON
    pub fn from_json(path: impl Into<PathBuf>, json: &str) -> Result<Self, EditorError> {
        let tree: DocumentTree = serde_json::from_str(json)?;
        Ok(Self::from_tree(path, tree))
    }

    /// Load document from file (file-backed)
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EditorError> {
        let path = path.as_ref().to_path_buf();
        let source = std::fs::read_to_string(&path)?;
        let tree: DocumentTree = serde_json::from_str(&source)?;

        tracing::debug!("[Document] Loaded {} ({} nodes)", path.display(), tree.node_count());

        Ok(Self {
            path,
            version: 0,
            storage: DocumentStorage::File { tree, dirty: false },
            history: UndoStack::new(),
        })
    }

    /// New empty file-backed document. Nothing is written until `save`.
    pub fn create(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            version: 0,
            storage: DocumentStorage::File {
                tree: DocumentTree::new(),
                dirty: true,
            },
            history: UndoStack::new(),
        }
    }

    pub fn tree(&self) -> &DocumentTree {
        match &self.storage {
            DocumentStorage::Memory { tree } | DocumentStorage::File { tree, .. } => tree,
        }
    }

    fn tree_mut(&mut self) -> &mut DocumentTree {
        match &mut self.storage {
            DocumentStorage::Memory { tree } => tree,
            DocumentStorage::File { tree, dirty } => {
                *dirty = true;
                tree
            }
        }
    }

    /// Apply a mutation
    pub fn apply(&mut self, mutation: Mutation, history: History) -> Result<MutationResult, EditorError> {
        // Validate before tree_mut() so a rejected mutation leaves the dirty flag alone
        mutation.validate(self.tree())?;

        match history {
            History::Record => {
                let mut stack = std::mem::take(&mut self.history);
                let result = stack.apply(&mutation, self.tree_mut());
                self.history = stack;
                result?;
            }
            History::Skip => mutation.apply(self.tree_mut())?,
        }

        self.version += 1;
        tracing::trace!("[Document] Applied {} -> v{}", mutation.name(), self.version);

        Ok(MutationResult {
            version: self.version,
        })
    }

    /// Undo the most recent recorded edit. Returns false when there is none.
    pub fn undo(&mut self) -> Result<bool, EditorError> {
        if !self.history.can_undo() {
            return Ok(false);
        }
        let mut stack = std::mem::take(&mut self.history);
        let result = stack.undo(self.tree_mut());
        self.history = stack;
        let undone = result?;
        if undone {
            self.version += 1;
        }
        Ok(undone)
    }

    pub fn redo(&mut self) -> Result<bool, EditorError> {
        if !self.history.can_redo() {
            return Ok(false);
        }
        let mut stack = std::mem::take(&mut self.history);
        let result = stack.redo(self.tree_mut());
        self.history = stack;
        let redone = result?;
        if redone {
            self.version += 1;
        }
        Ok(redone)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Check if document has unsaved changes
    pub fn is_dirty(&self) -> bool {
        match &self.storage {
            DocumentStorage::File { dirty, .. } => *dirty,
            DocumentStorage::Memory { .. } => false,
        }
    }

    pub fn to_json(&self) -> Result<String, EditorError> {
        Ok(serde_json::to_string_pretty(self.tree())?)
    }

    /// Save document to disk (if file-backed)
    pub fn save(&mut self) -> Result<(), EditorError> {
        let json = self.to_json()?;
        match &mut self.storage {
            DocumentStorage::File { dirty, .. } => {
                std::fs::write(&self.path, json)?;
                *dirty = false;
                tracing::debug!("[Document] Saved {}", self.path.display());
                Ok(())
            }
            DocumentStorage::Memory { .. } => Err(EditorError::NotFileBacked),
        }
    }
}
