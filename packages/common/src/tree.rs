//! # Document Tree
//!
//! Root container of block nodes plus structural lookups. All lookups are
//! by node id and scan the tree; nothing caches offsets, so callers always
//! see the current structure.

use crate::error::CommonError;
use crate::node::{Locator, Node, Position};
use crate::result::CommonResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DocumentTree {
    #[serde(default)]
    pub blocks: Vec<Node>,
}

impl DocumentTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_blocks(blocks: Vec<Node>) -> Self {
        Self { blocks }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&Node> {
        find_in(&self.blocks, id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Node> {
        find_in_mut(&mut self.blocks, id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Current path of a node
    pub fn locate(&self, id: &str) -> Option<Locator> {
        let mut path = Vec::new();
        if locate_in(&self.blocks, id, &mut path) {
            Some(Locator::new(path))
        } else {
            None
        }
    }

    pub fn node_at(&self, locator: &Locator) -> Option<&Node> {
        let (first, rest) = locator.path.split_first()?;
        let mut node = self.blocks.get(*first)?;
        for index in rest {
            node = node.children()?.get(*index)?;
        }
        Some(node)
    }

    /// Container and index a node currently sits at
    pub fn position_of(&self, id: &str) -> Option<Position> {
        let locator = self.locate(id)?;
        let (index, parent_path) = locator.path.split_last()?;

        let parent = if parent_path.is_empty() {
            None
        } else {
            let parent = self.node_at(&Locator::new(parent_path.to_vec()))?;
            Some(parent.id().to_string())
        };

        Some(Position {
            parent,
            index: *index,
        })
    }

    /// Children of the container at `parent` (the root when `None`)
    pub fn container(&self, parent: Option<&str>) -> CommonResult<&Vec<Node>> {
        match parent {
            None => Ok(&self.blocks),
            Some(parent_id) => {
                let node = self
                    .find(parent_id)
                    .ok_or_else(|| CommonError::ContainerNotFound(parent_id.to_string()))?;
                node.children()
                    .ok_or_else(|| CommonError::NotAContainer(parent_id.to_string()))
            }
        }
    }

    pub fn container_mut(&mut self, parent: Option<&str>) -> CommonResult<&mut Vec<Node>> {
        match parent {
            None => Ok(&mut self.blocks),
            Some(parent_id) => {
                let node = self
                    .find_mut(parent_id)
                    .ok_or_else(|| CommonError::ContainerNotFound(parent_id.to_string()))?;
                node.children_mut()
                    .ok_or_else(|| CommonError::NotAContainer(parent_id.to_string()))
            }
        }
    }

    /// Insert a node, clamping the index. Returns the index actually used.
    pub fn insert(&mut self, position: &Position, node: Node) -> CommonResult<usize> {
        if let Some(duplicate) = first_duplicate_id(self, &node) {
            return Err(CommonError::DuplicateId(duplicate));
        }

        let children = self.container_mut(position.parent.as_deref())?;
        let index = position.index.min(children.len());
        children.insert(index, node);
        Ok(index)
    }

    /// Detach a node (and its descendants), returning where it was
    pub fn remove(&mut self, id: &str) -> CommonResult<(Position, Node)> {
        let position = self
            .position_of(id)
            .ok_or_else(|| CommonError::NodeNotFound(id.to_string()))?;
        let children = self.container_mut(position.parent.as_deref())?;
        let node = children.remove(position.index);
        Ok((position, node))
    }

    /// True when `id` is `ancestor_id` or sits somewhere below it
    pub fn is_within(&self, id: &str, ancestor_id: &str) -> bool {
        self.find(ancestor_id)
            .map(|ancestor| ancestor.id() == id || find_in_children(ancestor, id).is_some())
            .unwrap_or(false)
    }

    /// Total number of nodes in the tree
    pub fn node_count(&self) -> usize {
        fn count(nodes: &[Node]) -> usize {
            nodes
                .iter()
                .map(|n| 1 + n.children().map(|c| count(c)).unwrap_or(0))
                .sum()
        }
        count(&self.blocks)
    }
}

fn find_in<'a>(nodes: &'a [Node], id: &str) -> Option<&'a Node> {
    for node in nodes {
        if node.id() == id {
            return Some(node);
        }
        if let Some(found) = find_in_children(node, id) {
            return Some(found);
        }
    }
    None
}

fn find_in_children<'a>(node: &'a Node, id: &str) -> Option<&'a Node> {
    node.children().and_then(|children| find_in(children, id))
}

fn find_in_mut<'a>(nodes: &'a mut [Node], id: &str) -> Option<&'a mut Node> {
    for node in nodes.iter_mut() {
        if node.id() == id {
            return Some(node);
        }
        if let Some(children) = node.children_mut() {
            if let Some(found) = find_in_mut(children, id) {
                return Some(found);
            }
        }
    }
    None
}

fn locate_in(nodes: &[Node], id: &str, path: &mut Vec<usize>) -> bool {
    for (index, node) in nodes.iter().enumerate() {
        path.push(index);
        if node.id() == id {
            return true;
        }
        if let Some(children) = node.children() {
            if locate_in(children, id, path) {
                return true;
            }
        }
        path.pop();
    }
    false
}

fn first_duplicate_id(tree: &DocumentTree, node: &Node) -> Option<String> {
    if tree.contains(node.id()) {
        return Some(node.id().to_string());
    }
    node.children()
        .into_iter()
        .flatten()
        .find_map(|child| first_duplicate_id(tree, child))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ImageAttrs;

    fn sample() -> DocumentTree {
        DocumentTree::from_blocks(vec![
            Node::Paragraph {
                id: "p1".to_string(),
                text: "Intro".to_string(),
            },
            Node::Blockquote {
                id: "q1".to_string(),
                children: vec![
                    Node::Paragraph {
                        id: "p2".to_string(),
                        text: "Quoted".to_string(),
                    },
                    Node::Image {
                        id: "img1".to_string(),
                        attrs: ImageAttrs::new("a.png"),
                    },
                ],
            },
        ])
    }

    #[test]
    fn test_locate_nested_node() {
        let tree = sample();
        assert_eq!(tree.locate("img1"), Some(Locator::new(vec![1, 1])));
        assert_eq!(tree.locate("p1"), Some(Locator::new(vec![0])));
        assert_eq!(tree.locate("missing"), None);

        let node = tree.node_at(&Locator::new(vec![1, 1])).unwrap();
        assert_eq!(node.id(), "img1");
    }

    #[test]
    fn test_position_of() {
        let tree = sample();
        assert_eq!(tree.position_of("p2"), Some(Position::within("q1", 0)));
        assert_eq!(tree.position_of("q1"), Some(Position::root(1)));
    }

    #[test]
    fn test_insert_clamps_index() {
        let mut tree = sample();
        let index = tree
            .insert(&Position::root(99), Node::paragraph("tail"))
            .unwrap();
        assert_eq!(index, 2);
        assert_eq!(tree.blocks.len(), 3);
    }

    #[test]
    fn test_insert_rejects_duplicate_id() {
        let mut tree = sample();
        let dup = Node::Paragraph {
            id: "p2".to_string(),
            text: "again".to_string(),
        };
        assert_eq!(
            tree.insert(&Position::root(0), dup),
            Err(CommonError::DuplicateId("p2".to_string()))
        );
    }

    #[test]
    fn test_insert_into_leaf_fails() {
        let mut tree = sample();
        let result = tree.insert(&Position::within("p1", 0), Node::paragraph("x"));
        assert_eq!(result, Err(CommonError::NotAContainer("p1".to_string())));
    }

    #[test]
    fn test_remove_returns_position() {
        let mut tree = sample();
        let (position, node) = tree.remove("img1").unwrap();
        assert_eq!(position, Position::within("q1", 1));
        assert_eq!(node.id(), "img1");
        assert!(!tree.contains("img1"));
        assert_eq!(tree.node_count(), 3);
    }

    #[test]
    fn test_is_within() {
        let tree = sample();
        assert!(tree.is_within("p2", "q1"));
        assert!(tree.is_within("q1", "q1"));
        assert!(!tree.is_within("p1", "q1"));
    }
}
