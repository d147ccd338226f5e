use serde::{Deserialize, Serialize};

use crate::document::{Document, TreeError};
use crate::node::{ColorType, LinkNode, Node, NodeKey, TextFormat};

const DEFAULT_SCHEMA: &str = "inferno-editor";
const DEFAULT_VERSION: u32 = 1;

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

fn default_version() -> u32 {
    DEFAULT_VERSION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorValue {
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_version")]
    pub version: u32,
    pub root: NodeValue,
}

impl EditorValue {
    pub fn new(blocks: impl IntoIterator<Item = NodeValue>) -> Self {
        Self {
            schema: default_schema(),
            version: default_version(),
            root: NodeValue::new(Node::Root).with_children(blocks),
        }
    }

    pub fn from_document(doc: &Document) -> Self {
        Self {
            schema: default_schema(),
            version: default_version(),
            root: doc.to_value(),
        }
    }

    pub fn to_document(&self) -> Result<Document, TreeError> {
        Document::from_value(&self.root)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// A node with its subtree, detached from any arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeValue {
    #[serde(flatten)]
    pub node: Node,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeValue>,
}

impl NodeValue {
    pub fn new(node: Node) -> Self {
        Self {
            node,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = NodeValue>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn paragraph(children: impl IntoIterator<Item = NodeValue>) -> Self {
        Self::new(Node::paragraph()).with_children(children)
    }

    pub fn heading(level: u8, children: impl IntoIterator<Item = NodeValue>) -> Self {
        Self::new(Node::heading(level)).with_children(children)
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(Node::text(text))
    }

    pub fn bold_text(text: impl Into<String>) -> Self {
        Self::new(Node::formatted_text(text, TextFormat::bold()))
    }

    pub fn colored(text: impl Into<String>, color_id: &str, color_type: ColorType) -> Self {
        Self::new(Node::colored_text(
            text,
            color_id,
            color_type,
            TextFormat::default(),
        ))
    }

    pub fn link(url: &str, children: impl IntoIterator<Item = NodeValue>) -> Self {
        Self::new(Node::link(LinkNode::new(url))).with_children(children)
    }

    pub fn text_content(&self) -> String {
        match self.node.text_str() {
            Some(text) => text.to_string(),
            None => self.children.iter().map(NodeValue::text_content).collect(),
        }
    }
}

impl Document {
    /// Builds a document from a root value. A non-root value becomes the only block.
    pub fn from_value(value: &NodeValue) -> Result<Self, TreeError> {
        let mut doc = Document::new();
        let root = doc.root();
        if value.node == Node::Root {
            for child in &value.children {
                doc.insert_value(root, child)?;
            }
        } else {
            doc.insert_value(root, value)?;
        }
        Ok(doc)
    }

    /// Creates `value`'s subtree and appends it under `parent`.
    pub fn insert_value(
        &mut self,
        parent: NodeKey,
        value: &NodeValue,
    ) -> Result<NodeKey, TreeError> {
        let key = self.create(value.node.clone());
        self.append(parent, &[key])?;
        for child in &value.children {
            self.insert_value(key, child)?;
        }
        Ok(key)
    }

    pub fn to_value(&self) -> NodeValue {
        self.node_value(self.root())
            .unwrap_or_else(|| NodeValue::new(Node::Root))
    }

    pub fn node_value(&self, key: NodeKey) -> Option<NodeValue> {
        let node = self.get(key)?.clone();
        let children = self
            .children(key)
            .iter()
            .filter_map(|child| self.node_value(*child))
            .collect();
        Some(NodeValue { node, children })
    }
}
