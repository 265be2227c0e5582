use crate::node::Node;
use crate::tree::DocumentTree;

/// Visitor pattern for traversing document nodes immutably
///
/// The default implementations walk the entire tree depth-first. `path` is
/// the node's current locator path (child indices from the root).
pub trait Visitor: Sized {
    fn visit_tree(&mut self, tree: &DocumentTree) {
        walk_tree(self, tree);
    }

    fn visit_node(&mut self, node: &Node, path: &[usize]) {
        walk_node(self, node, path);
    }

    /// Return `true` to stop the walk early
    fn done(&self) -> bool {
        false
    }
}

pub fn walk_tree<V: Visitor>(visitor: &mut V, tree: &DocumentTree) {
    let mut path = Vec::with_capacity(4);
    walk_children(visitor, &tree.blocks, &mut path);
}

pub fn walk_node<V: Visitor>(visitor: &mut V, node: &Node, path: &[usize]) {
    if let Some(children) = node.children() {
        let mut path = path.to_vec();
        walk_children(visitor, children, &mut path);
    }
}

fn walk_children<V: Visitor>(visitor: &mut V, nodes: &[Node], path: &mut Vec<usize>) {
    for (index, node) in nodes.iter().enumerate() {
        if visitor.done() {
            return;
        }
        path.push(index);
        visitor.visit_node(node, path);
        path.pop();
    }
}
