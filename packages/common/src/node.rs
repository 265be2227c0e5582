//! # Document Nodes
//!
//! Block-level node model shared by the editor and the upload pipeline.
//!
//! Only `Blockquote` can hold children. `Image` and `Embed` count as embeds
//! for the document-wide embed limit.

use serde::{Deserialize, Serialize};

pub type NodeId = String;

/// Generate a fresh node id with a readable prefix (`img-3f2a...`)
pub fn new_node_id(prefix: &str) -> NodeId {
    format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
}

/// Attributes of an image block
///
/// A node with `marker` set is an upload placeholder owned by the upload
/// queue. The marker is cleared once the upload lands.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageAttrs {
    pub src: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,

    #[serde(default)]
    pub loading: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
}

impl ImageAttrs {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    Paragraph {
        id: NodeId,
        text: String,
    },

    Heading {
        id: NodeId,
        level: u8,
        text: String,
    },

    Blockquote {
        id: NodeId,
        children: Vec<Node>,
    },

    Image {
        id: NodeId,
        attrs: ImageAttrs,
    },

    /// External embed (video, iframe)
    Embed {
        id: NodeId,
        url: String,
    },
}

impl Node {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Node::Paragraph {
            id: new_node_id("p"),
            text: text.into(),
        }
    }

    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Node::Heading {
            id: new_node_id("h"),
            level,
            text: text.into(),
        }
    }

    pub fn blockquote(children: Vec<Node>) -> Self {
        Node::Blockquote {
            id: new_node_id("quote"),
            children,
        }
    }

    pub fn image(attrs: ImageAttrs) -> Self {
        Node::Image {
            id: new_node_id("img"),
            attrs,
        }
    }

    pub fn embed(url: impl Into<String>) -> Self {
        Node::Embed {
            id: new_node_id("embed"),
            url: url.into(),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Node::Paragraph { id, .. }
            | Node::Heading { id, .. }
            | Node::Blockquote { id, .. }
            | Node::Image { id, .. }
            | Node::Embed { id, .. } => id,
        }
    }

    pub fn children(&self) -> Option<&Vec<Node>> {
        match self {
            Node::Blockquote { children, .. } => Some(children),
            _ => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Blockquote { children, .. } => Some(children),
            _ => None,
        }
    }

    pub fn is_embed(&self) -> bool {
        matches!(self, Node::Image { .. } | Node::Embed { .. })
    }

    pub fn image_attrs(&self) -> Option<&ImageAttrs> {
        match self {
            Node::Image { attrs, .. } => Some(attrs),
            _ => None,
        }
    }

    /// Marker of an upload placeholder, if this node is one
    pub fn marker(&self) -> Option<&str> {
        self.image_attrs().and_then(|attrs| attrs.marker.as_deref())
    }

    /// Short label used by the CLI tree printer
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Paragraph { .. } => "paragraph",
            Node::Heading { .. } => "heading",
            Node::Blockquote { .. } => "blockquote",
            Node::Image { .. } => "image",
            Node::Embed { .. } => "embed",
        }
    }
}

/// Insertion point: a container (root when `parent` is `None`) and a child index
///
/// The index is clamped to the container length on insert.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,
    pub index: usize,
}

impl Position {
    pub fn root(index: usize) -> Self {
        Self {
            parent: None,
            index,
        }
    }

    pub fn within(parent: impl Into<NodeId>, index: usize) -> Self {
        Self {
            parent: Some(parent.into()),
            index,
        }
    }

    /// Same container, `n` slots further along
    pub fn offset(&self, n: usize) -> Self {
        Self {
            parent: self.parent.clone(),
            index: self.index + n,
        }
    }
}

/// Current address of a node: child indices from the root down
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Locator {
    pub path: Vec<usize>,
}

impl Locator {
    pub fn new(path: Vec<usize>) -> Self {
        Self { path }
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }
}
