use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::node::{NodeKey, TextFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub key: NodeKey,
    pub offset: usize,
}

impl Point {
    pub fn new(key: NodeKey, offset: usize) -> Self {
        Self { key, offset }
    }

    pub fn is_before(&self, other: &Point, doc: &Document) -> bool {
        if self.key == other.key {
            return self.offset < other.offset;
        }
        doc.is_before(self.key, other.key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeSelection {
    pub anchor: Point,
    pub focus: Point,
    #[serde(default)]
    pub format: TextFormat,
}

impl RangeSelection {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self {
            anchor,
            focus,
            format: TextFormat::default(),
        }
    }

    pub fn collapsed(point: Point) -> Self {
        Self::new(point, point)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn is_backward(&self, doc: &Document) -> bool {
        self.focus.is_before(&self.anchor, doc)
    }

    /// (start, end) in document order.
    pub fn ordered(&self, doc: &Document) -> (Point, Point) {
        if self.anchor.is_before(&self.focus, doc) {
            (self.anchor, self.focus)
        } else {
            (self.focus, self.anchor)
        }
    }

    pub fn references(&self, key: NodeKey) -> bool {
        self.anchor.key == key || self.focus.key == key
    }

    /// Nodes covered by the selection in document order.
    ///
    /// Containers entered between the two endpoints are included; ancestors of the start node
    /// are not. When several nodes are covered, an end point sitting at offset 0 does not cover
    /// its node, and neither does a start point sitting at the end of its text.
    pub fn nodes(&self, doc: &Document) -> Vec<NodeKey> {
        let (start, end) = self.ordered(doc);
        if start.key == end.key {
            return vec![start.key];
        }

        let order = doc.descendants(doc.root());
        let (Some(start_ix), Some(end_ix)) = (
            order.iter().position(|k| *k == start.key),
            order.iter().position(|k| *k == end.key),
        ) else {
            return Vec::new();
        };
        if start_ix > end_ix {
            return Vec::new();
        }

        let mut nodes = order[start_ix..=end_ix].to_vec();
        if nodes.len() > 1 && end.offset == 0 {
            nodes.pop();
        }
        if nodes.len() > 1 && start.offset >= doc.text_len(start.key) {
            nodes.remove(0);
        }
        nodes
    }
}
