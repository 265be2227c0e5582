//! Tests for mutation sequences
//!
//! - Move + delete chains
//! - Undo/redo sequences
//! - Document integrity after operations

use folio_common::{DocumentTree, ImageAttrs, Node, Position};
use folio_editor::{Mutation, UndoStack};

fn sample() -> DocumentTree {
    DocumentTree::from_blocks(vec![
        Node::Blockquote {
            id: "q1".to_string(),
            children: vec![Node::Paragraph {
                id: "p1".to_string(),
                text: "Child 1".to_string(),
            }],
        },
        Node::Paragraph {
            id: "p2".to_string(),
            text: "Child 2".to_string(),
        },
    ])
}

#[test]
fn test_move_then_delete_sequence() {
    let mut doc = sample();
    let mut stack = UndoStack::new();

    stack
        .apply(
            &Mutation::MoveNode {
                node_id: "p2".to_string(),
                new_parent_id: Some("q1".to_string()),
                index: 1,
            },
            &mut doc,
        )
        .unwrap();
    assert_eq!(doc.position_of("p2"), Some(Position::within("q1", 1)));

    // Deleting the quote takes the moved paragraph with it
    stack
        .apply(
            &Mutation::RemoveNode {
                node_id: "q1".to_string(),
            },
            &mut doc,
        )
        .unwrap();
    assert!(!doc.contains("p1"));
    assert!(!doc.contains("p2"));

    stack.undo(&mut doc).unwrap();
    assert!(doc.contains("p1"));
    assert!(doc.contains("p2"));

    stack.undo(&mut doc).unwrap();
    assert_eq!(doc, sample());
}

#[test]
fn test_multiple_text_updates_with_undo_redo() {
    let mut doc = sample();
    let mut stack = UndoStack::new();

    for i in 1..=3 {
        stack
            .apply(
                &Mutation::UpdateText {
                    node_id: "p2".to_string(),
                    content: format!("v{}", i),
                },
                &mut doc,
            )
            .unwrap();
    }

    let text = |doc: &DocumentTree| match doc.find("p2") {
        Some(Node::Paragraph { text, .. }) => text.clone(),
        _ => String::new(),
    };

    assert_eq!(text(&doc), "v3");
    stack.undo(&mut doc).unwrap();
    stack.undo(&mut doc).unwrap();
    assert_eq!(text(&doc), "v1");
    stack.redo(&mut doc).unwrap();
    assert_eq!(text(&doc), "v2");
}

#[test]
fn test_undo_survives_untracked_inserts() {
    let mut doc = sample();
    let mut stack = UndoStack::new();

    stack
        .apply(
            &Mutation::RemoveNode {
                node_id: "p2".to_string(),
            },
            &mut doc,
        )
        .unwrap();

    // An untracked insert (as the upload queue does) shifts root offsets
    Mutation::InsertNode {
        parent_id: None,
        index: 0,
        node: Node::Image {
            id: "img1".to_string(),
            attrs: ImageAttrs::new("blob:folio/1"),
        },
    }
    .apply(&mut doc)
    .unwrap();

    stack.undo(&mut doc).unwrap();
    assert!(doc.contains("p2"));
    assert!(doc.contains("img1"));
    assert_eq!(doc.node_count(), 4);
}

#[test]
fn test_failed_undo_step_reports_error() {
    let mut doc = sample();
    let mut stack = UndoStack::new();

    stack
        .apply(
            &Mutation::UpdateText {
                node_id: "p1".to_string(),
                content: "changed".to_string(),
            },
            &mut doc,
        )
        .unwrap();

    // Someone else deleted the node the undo step targets
    Mutation::RemoveNode {
        node_id: "q1".to_string(),
    }
    .apply(&mut doc)
    .unwrap();

    assert!(stack.undo(&mut doc).is_err());
}

#[test]
fn test_failed_undo_step_is_dropped() {
    let mut doc = sample();
    let mut stack = UndoStack::new();

    stack
        .apply(
            &Mutation::UpdateText {
                node_id: "p1".to_string(),
                content: "first".to_string(),
            },
            &mut doc,
        )
        .unwrap();
    stack
        .apply(
            &Mutation::RemoveNode {
                node_id: "p2".to_string(),
            },
            &mut doc,
        )
        .unwrap();

    // Restoring p2 collides with a node that reused its id
    Mutation::InsertNode {
        parent_id: None,
        index: 0,
        node: Node::Paragraph {
            id: "p2".to_string(),
            text: "impostor".to_string(),
        },
    }
    .apply(&mut doc)
    .unwrap();

    assert!(stack.undo(&mut doc).is_err());
    assert_eq!(stack.undo_levels(), 1);

    // The older step is still reachable
    assert!(stack.undo(&mut doc).unwrap());
    assert!(!stack.can_undo());
}
