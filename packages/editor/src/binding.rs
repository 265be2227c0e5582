//! # Shared Document
//!
//! Thread-safe handle to a [`Document`] that the upload queue can drive
//! while the user keeps editing through the same handle.
//!
//! Placeholder operations go through [`History::Skip`]; user edits go
//! through [`SharedDocument::edit`] and are undoable.

use crate::{Document, EditorError, History, Mutation, MutationResult};
use folio_common::{
    walk_node, CommonResult, DocumentBinding, DocumentTree, ImageAttrs, Locator, Marker, Node,
    PlaceholderState, Position, Visitor,
};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
pub struct SharedDocument {
    inner: Arc<Mutex<Document>>,
}

impl SharedDocument {
    pub fn new(document: Document) -> Self {
        Self {
            inner: Arc::new(Mutex::new(document)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Document> {
        // A panic mid-mutation leaves the tree as it was; keep serving it.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run a closure against the document
    pub fn read<R>(&self, f: impl FnOnce(&Document) -> R) -> R {
        f(&self.lock())
    }

    /// Run a closure with exclusive access
    pub fn with<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        f(&mut self.lock())
    }

    /// Apply a user edit (recorded in undo history)
    pub fn edit(&self, mutation: Mutation) -> Result<MutationResult, EditorError> {
        self.lock().apply(mutation, History::Record)
    }

    pub fn undo(&self) -> Result<bool, EditorError> {
        self.lock().undo()
    }

    pub fn redo(&self) -> Result<bool, EditorError> {
        self.lock().redo()
    }

    /// Snapshot of the current tree
    pub fn tree(&self) -> DocumentTree {
        self.lock().tree().clone()
    }

    pub fn version(&self) -> u64 {
        self.lock().version
    }

    pub fn save(&self) -> Result<(), EditorError> {
        self.lock().save()
    }

    fn locate_marker(tree: &DocumentTree, marker: &Marker) -> Option<(Locator, String)> {
        let mut finder = MarkerFinder {
            marker: marker.as_str(),
            found: None,
        };
        finder.visit_tree(tree);
        finder.found
    }

    fn untracked(document: &mut Document, mutation: Mutation) -> CommonResult<()> {
        document.apply(mutation, History::Skip)?;
        Ok(())
    }
}

impl DocumentBinding for SharedDocument {
    fn insert_placeholder(
        &self,
        position: &Position,
        marker: &Marker,
        preview: &str,
    ) -> CommonResult<()> {
        let node = Node::image(ImageAttrs {
            src: preview.to_string(),
            loading: true,
            marker: Some(marker.to_string()),
            ..Default::default()
        });

        let mut document = self.lock();
        Self::untracked(
            &mut document,
            Mutation::InsertNode {
                parent_id: position.parent.clone(),
                index: position.index,
                node,
            },
        )
    }

    fn find_by_marker(&self, marker: &Marker) -> Option<Locator> {
        let document = self.lock();
        Self::locate_marker(document.tree(), marker).map(|(locator, _)| locator)
    }

    fn update_by_marker(&self, marker: &Marker, state: PlaceholderState) -> bool {
        let mut document = self.lock();
        let Some((_, node_id)) = Self::locate_marker(document.tree(), marker) else {
            return false;
        };
        let Some(current) = document.tree().find(&node_id).and_then(Node::image_attrs) else {
            return false;
        };

        let attrs = match state {
            PlaceholderState::Loading { preview } => ImageAttrs {
                src: preview,
                loading: true,
                error: None,
                ..current.clone()
            },
            PlaceholderState::Ready { src } => ImageAttrs {
                src,
                loading: false,
                error: None,
                marker: None,
                ..current.clone()
            },
            PlaceholderState::Failed { error } => ImageAttrs {
                loading: false,
                error: Some(error),
                ..current.clone()
            },
        };

        match Self::untracked(&mut document, Mutation::SetImageAttrs { node_id, attrs }) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("[SharedDocument] Failed to update placeholder {}: {}", marker, e);
                false
            }
        }
    }

    fn remove_by_marker(&self, marker: &Marker) -> bool {
        let mut document = self.lock();
        let Some((_, node_id)) = Self::locate_marker(document.tree(), marker) else {
            return false;
        };
        Self::untracked(&mut document, Mutation::RemoveNode { node_id }).is_ok()
    }

    fn embed_count(&self) -> usize {
        let mut counter = EmbedCounter::default();
        counter.visit_tree(self.lock().tree());
        counter.count
    }
}

/// Finds the first node whose marker matches, stopping the walk once found
struct MarkerFinder<'a> {
    marker: &'a str,
    found: Option<(Locator, String)>,
}

impl Visitor for MarkerFinder<'_> {
    fn visit_node(&mut self, node: &Node, path: &[usize]) {
        if node.marker() == Some(self.marker) {
            self.found = Some((Locator::new(path.to_vec()), node.id().to_string()));
            return;
        }
        walk_node(self, node, path);
    }

    fn done(&self) -> bool {
        self.found.is_some()
    }
}

#[derive(Default)]
struct EmbedCounter {
    count: usize,
}

impl Visitor for EmbedCounter {
    fn visit_node(&mut self, node: &Node, path: &[usize]) {
        if node.is_embed() {
            self.count += 1;
        }
        walk_node(self, node, path);
    }
}
