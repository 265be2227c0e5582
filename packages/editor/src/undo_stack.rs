//! # Undo/Redo Stack
//!
//! User-visible edit history. Every recorded edit keeps the mutation and the
//! inverse computed from the tree just before it ran; undo applies the
//! inverse, redo the mutation again. Recording a new edit clears redo.
//!
//! Upload placeholders never pass through this stack. Targets are addressed
//! by node id, but the re-insert index stored by the inverse of a remove or
//! move is a plain offset: if placeholders were inserted ahead of it in the
//! meantime, the restored node can land a few slots away from where it was.

use crate::{Mutation, MutationError};
use folio_common::DocumentTree;

/// Undo levels kept before the oldest edit is dropped
pub const MAX_UNDO_LEVELS: usize = 100;

#[derive(Debug, Clone)]
struct Step {
    mutation: Mutation,
    inverse: Mutation,
}

#[derive(Debug, Default)]
pub struct UndoStack {
    undo: Vec<Step>,
    redo: Vec<Step>,
}

impl UndoStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a mutation and record it for undo. Nothing is recorded on failure.
    pub fn apply(&mut self, mutation: &Mutation, tree: &mut DocumentTree) -> Result<(), MutationError> {
        let inverse = mutation.to_inverse(tree)?;
        mutation.apply(tree)?;

        self.undo.push(Step {
            mutation: mutation.clone(),
            inverse,
        });
        if self.undo.len() > MAX_UNDO_LEVELS {
            self.undo.remove(0);
        }
        self.redo.clear();
        Ok(())
    }

    /// Returns false when there is nothing to undo
    pub fn undo(&mut self, tree: &mut DocumentTree) -> Result<bool, MutationError> {
        let Some(step) = self.undo.pop() else {
            return Ok(false);
        };
        // A step whose inverse no longer applies is dropped
        step.inverse.apply(tree)?;
        self.redo.push(step);
        Ok(true)
    }

    pub fn redo(&mut self, tree: &mut DocumentTree) -> Result<bool, MutationError> {
        let Some(step) = self.redo.pop() else {
            return Ok(false);
        };
        step.mutation.apply(tree)?;
        self.undo.push(step);
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo.len()
    }
}
