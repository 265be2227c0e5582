//! # Folio Editor
//!
//! Document editing engine for Folio.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ common: block tree, nodes, binding trait    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: Document lifecycle + mutations      │
//! │  - Load/save JSON documents                 │
//! │  - Apply mutations with validation          │
//! │  - Undo/redo of user edits                  │
//! │  - SharedDocument for concurrent writers    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ upload: placeholders via DocumentBinding    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_editor::{Document, History, Mutation};
//!
//! let mut doc = Document::load("notes.json")?;
//!
//! doc.apply(
//!     Mutation::UpdateText {
//!         node_id: "p-123".to_string(),
//!         content: "Hello".to_string(),
//!     },
//!     History::Record,
//! )?;
//!
//! doc.save()?;
//! ```

mod binding;
mod document;
mod errors;
mod mutations;
mod undo_stack;

pub use binding::SharedDocument;
pub use document::{Document, DocumentStorage, History};
pub use errors::EditorError;
pub use mutations::{Mutation, MutationError, MutationResult};
pub use undo_stack::{UndoStack, MAX_UNDO_LEVELS};
