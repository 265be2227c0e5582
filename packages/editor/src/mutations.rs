//! # Document Mutations
//!
//! High-level structural operations on the block tree.
//!
//! ## Design Principles
//!
//! 1. **Id-addressed**: Every mutation names its target by node id, so it
//!    stays meaningful when other edits shift offsets
//! 2. **Validated**: Structural constraints are checked before anything changes
//! 3. **Invertible**: Each mutation can produce its inverse for undo
//!
//! ## Mutation Semantics
//!
//! ### InsertNode
//! - Index is clamped to the container length
//! - Fails if any id in the inserted subtree already exists
//!
//! ### MoveNode
//! - Atomic relocation; the index is interpreted after the node is detached
//! - Fails if the target container is the node itself or one of its descendants
//!
//! ### SetImageAttrs
//! - Atomic replacement of the whole attribute set (last write wins)

use folio_common::{CommonError, DocumentTree, ImageAttrs, Node, NodeId, Position};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Mutation {
    /// Insert a node into a container (root when `parent_id` is `None`)
    InsertNode {
        parent_id: Option<NodeId>,
        index: usize,
        node: Node,
    },

    /// Remove a node and its descendants
    RemoveNode {
        node_id: NodeId,
    },

    /// Move a node to a new container at index
    MoveNode {
        node_id: NodeId,
        new_parent_id: Option<NodeId>,
        index: usize,
    },

    /// Replace the text of a paragraph or heading
    UpdateText {
        node_id: NodeId,
        content: String,
    },

    /// Replace all attributes of an image node
    SetImageAttrs {
        node_id: NodeId,
        attrs: ImageAttrs,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Parent not found: {0}")]
    ParentNotFound(String),

    #[error("Would create cycle")]
    CycleDetected,

    #[error("Node has no text: {0}")]
    NotText(String),

    #[error("Node is not an image: {0}")]
    NotAnImage(String),

    #[error(transparent)]
    Structure(#[from] CommonError),
}

impl Mutation {
    /// Apply mutation to the tree with validation
    pub fn apply(&self, tree: &mut DocumentTree) -> Result<(), MutationError> {
        self.validate(tree)?;

        match self {
            Mutation::InsertNode {
                parent_id,
                index,
                node,
            } => {
                let position = Position {
                    parent: parent_id.clone(),
                    index: *index,
                };
                tree.insert(&position, node.clone())?;
                Ok(())
            }

            Mutation::RemoveNode { node_id } => {
                tree.remove(node_id)?;
                Ok(())
            }

            Mutation::MoveNode {
                node_id,
                new_parent_id,
                index,
            } => {
                let (_, node) = tree.remove(node_id)?;
                let position = Position {
                    parent: new_parent_id.clone(),
                    index: *index,
                };
                tree.insert(&position, node)?;
                Ok(())
            }

            Mutation::UpdateText { node_id, content } => {
                match tree.find_mut(node_id) {
                    Some(Node::Paragraph { text, .. }) | Some(Node::Heading { text, .. }) => {
                        *text = content.clone();
                        Ok(())
                    }
                    Some(_) => Err(MutationError::NotText(node_id.clone())),
                    None => Err(MutationError::NodeNotFound(node_id.clone())),
                }
            }

            Mutation::SetImageAttrs { node_id, attrs } => match tree.find_mut(node_id) {
                Some(Node::Image { attrs: current, .. }) => {
                    *current = attrs.clone();
                    Ok(())
                }
                Some(_) => Err(MutationError::NotAnImage(node_id.clone())),
                None => Err(MutationError::NodeNotFound(node_id.clone())),
            },
        }
    }

    /// Validate without applying
    pub fn validate(&self, tree: &DocumentTree) -> Result<(), MutationError> {
        match self {
            Mutation::InsertNode { parent_id, .. } => {
                if let Some(parent_id) = parent_id {
                    if !tree.contains(parent_id) {
                        return Err(MutationError::ParentNotFound(parent_id.clone()));
                    }
                }
                tree.container(parent_id.as_deref())?;
                Ok(())
            }

            Mutation::RemoveNode { node_id } => {
                if !tree.contains(node_id) {
                    return Err(MutationError::NodeNotFound(node_id.clone()));
                }
                Ok(())
            }

            Mutation::MoveNode {
                node_id,
                new_parent_id,
                ..
            } => {
                if !tree.contains(node_id) {
                    return Err(MutationError::NodeNotFound(node_id.clone()));
                }
                if let Some(parent_id) = new_parent_id {
                    if !tree.contains(parent_id) {
                        return Err(MutationError::ParentNotFound(parent_id.clone()));
                    }
                    if tree.is_within(parent_id, node_id) {
                        return Err(MutationError::CycleDetected);
                    }
                }
                tree.container(new_parent_id.as_deref())?;
                Ok(())
            }

            Mutation::UpdateText { node_id, .. } => match tree.find(node_id) {
                Some(Node::Paragraph { .. }) | Some(Node::Heading { .. }) => Ok(()),
                Some(_) => Err(MutationError::NotText(node_id.clone())),
                None => Err(MutationError::NodeNotFound(node_id.clone())),
            },

            Mutation::SetImageAttrs { node_id, .. } => match tree.find(node_id) {
                Some(Node::Image { .. }) => Ok(()),
                Some(_) => Err(MutationError::NotAnImage(node_id.clone())),
                None => Err(MutationError::NodeNotFound(node_id.clone())),
            },
        }
    }

    /// Build the mutation that undoes this one, given the tree before it is applied
    pub fn to_inverse(&self, tree: &DocumentTree) -> Result<Mutation, MutationError> {
        self.validate(tree)?;

        match self {
            Mutation::InsertNode { node, .. } => Ok(Mutation::RemoveNode {
                node_id: node.id().to_string(),
            }),

            Mutation::RemoveNode { node_id } => {
                let position = tree
                    .position_of(node_id)
                    .ok_or_else(|| MutationError::NodeNotFound(node_id.clone()))?;
                let node = tree
                    .find(node_id)
                    .ok_or_else(|| MutationError::NodeNotFound(node_id.clone()))?;
                Ok(Mutation::InsertNode {
                    parent_id: position.parent,
                    index: position.index,
                    node: node.clone(),
                })
            }

            Mutation::MoveNode { node_id, .. } => {
                let position = tree
                    .position_of(node_id)
                    .ok_or_else(|| MutationError::NodeNotFound(node_id.clone()))?;
                Ok(Mutation::MoveNode {
                    node_id: node_id.clone(),
                    new_parent_id: position.parent,
                    index: position.index,
                })
            }

            Mutation::UpdateText { node_id, .. } => match tree.find(node_id) {
                Some(Node::Paragraph { text, .. }) | Some(Node::Heading { text, .. }) => {
                    Ok(Mutation::UpdateText {
                        node_id: node_id.clone(),
                        content: text.clone(),
                    })
                }
                _ => Err(MutationError::NotText(node_id.clone())),
            },

            Mutation::SetImageAttrs { node_id, .. } => match tree.find(node_id) {
                Some(Node::Image { attrs, .. }) => Ok(Mutation::SetImageAttrs {
                    node_id: node_id.clone(),
                    attrs: attrs.clone(),
                }),
                _ => Err(MutationError::NotAnImage(node_id.clone())),
            },
        }
    }

    /// Debug name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::InsertNode { .. } => "insert_node",
            Mutation::RemoveNode { .. } => "remove_node",
            Mutation::MoveNode { .. } => "move_node",
            Mutation::UpdateText { .. } => "update_text",
            Mutation::SetImageAttrs { .. } => "set_image_attrs",
        }
    }
}

/// Result of applying a mutation
#[derive(Debug, Clone)]
pub struct MutationResult {
    /// New version number
    pub version: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> DocumentTree {
        DocumentTree::from_blocks(vec![
            Node::Paragraph {
                id: "p1".to_string(),
                text: "Hello".to_string(),
            },
            Node::Blockquote {
                id: "q1".to_string(),
                children: vec![Node::Paragraph {
                    id: "p2".to_string(),
                    text: "Quoted".to_string(),
                }],
            },
        ])
    }

    #[test]
    fn test_mutation_serialization() {
        let mutation = Mutation::UpdateText {
            node_id: "p1".to_string(),
            content: "Hello World".to_string(),
        };

        let json = serde_json::to_string(&mutation).unwrap();
        let deserialized: Mutation = serde_json::from_str(&json).unwrap();

        assert_eq!(mutation, deserialized);
    }

    #[test]
    fn test_validation_rejects_empty_ids() {
        let mutation = Mutation::UpdateText {
            node_id: "".to_string(),
            content: "test".to_string(),
        };

        assert!(mutation.validate(&tree()).is_err());
    }

    #[test]
    fn test_move_into_own_descendant_is_cycle() {
        let mutation = Mutation::MoveNode {
            node_id: "q1".to_string(),
            new_parent_id: Some("q1".to_string()),
            index: 0,
        };

        assert_eq!(mutation.validate(&tree()), Err(MutationError::CycleDetected));
    }

    #[test]
    fn test_set_image_attrs_on_paragraph_fails() {
        let mut doc = tree();
        let mutation = Mutation::SetImageAttrs {
            node_id: "p1".to_string(),
            attrs: ImageAttrs::new("a.png"),
        };

        assert_eq!(
            mutation.apply(&mut doc),
            Err(MutationError::NotAnImage("p1".to_string()))
        );
    }

    #[test]
    fn test_remove_inverse_restores_position() {
        let mut doc = tree();
        let mutation = Mutation::RemoveNode {
            node_id: "p2".to_string(),
        };

        let inverse = mutation.to_inverse(&doc).unwrap();
        mutation.apply(&mut doc).unwrap();
        assert!(!doc.contains("p2"));

        inverse.apply(&mut doc).unwrap();
        assert_eq!(doc.position_of("p2"), Some(Position::within("q1", 0)));
    }
}
