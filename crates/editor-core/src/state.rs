use serde::{Deserialize, Serialize};

use crate::document::{Document, TreeError};
use crate::node::{NodeKey, char_len, char_slice};
use crate::selection::{Point, RangeSelection};

/// Derived facts about the current selection, refreshed on every selection change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionFacts {
    pub has_same_parent_block_node: bool,
    pub is_link_node: bool,
}

impl Default for SelectionFacts {
    fn default() -> Self {
        Self {
            has_same_parent_block_node: true,
            is_link_node: false,
        }
    }
}

/// The snapshot a single update works on.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorState {
    pub doc: Document,
    pub selection: Option<RangeSelection>,
    pub facts: SelectionFacts,
    pub(crate) version: u64,
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new(Document::new())
    }
}

impl EditorState {
    pub fn new(doc: Document) -> Self {
        Self {
            doc,
            selection: None,
            facts: SelectionFacts::default(),
            version: 0,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn selection_nodes(&self) -> Vec<NodeKey> {
        self.selection
            .as_ref()
            .map(|sel| sel.nodes(&self.doc))
            .unwrap_or_default()
    }

    pub fn set_selection(&mut self, selection: RangeSelection) -> Result<(), TreeError> {
        let anchor = self.clamp_point(selection.anchor)?;
        let focus = self.clamp_point(selection.focus)?;
        self.selection = Some(RangeSelection {
            anchor,
            focus,
            format: selection.format,
        });
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    fn clamp_point(&self, point: Point) -> Result<Point, TreeError> {
        let node = self.doc.node(point.key)?;
        let Some(text) = node.text_str() else {
            return Err(TreeError::NotTextBearing(point.key));
        };
        Ok(Point::new(point.key, point.offset.min(char_len(text))))
    }

    pub(crate) fn point_is_valid(&self, point: &Point) -> bool {
        self.doc.is_attached(point.key)
            && self
                .doc
                .get(point.key)
                .and_then(|n| n.text_str())
                .is_some_and(|text| point.offset <= char_len(text))
    }

    /// Collapses the selection at the end of the last text under `key`.
    pub fn select_end(&mut self, key: NodeKey) {
        self.selection = self.doc.last_text_descendant(key).map(|text| {
            let offset = self.doc.text_len(text);
            RangeSelection::collapsed(Point::new(text, offset))
        });
    }

    /// `Document::replace` that keeps selection points on the replacement node.
    pub fn replace_node(&mut self, old: NodeKey, new: NodeKey) -> Result<(), TreeError> {
        self.doc.replace(old, new)?;
        let Some(sel) = self.selection.as_mut() else {
            return Ok(());
        };
        if !sel.references(old) {
            return Ok(());
        }
        let Some(len) = self.doc.get(new).and_then(|n| n.text_str()).map(char_len) else {
            self.selection = None;
            return Ok(());
        };
        for point in [&mut sel.anchor, &mut sel.focus] {
            if point.key == old {
                *point = Point::new(new, point.offset.min(len));
            }
        }
        Ok(())
    }

    /// Splits a text-bearing node in place at the given character offsets.
    ///
    /// The first piece keeps the original key. Returns the keys of all pieces in order.
    pub fn split_text(
        &mut self,
        key: NodeKey,
        offsets: &[usize],
    ) -> Result<Vec<NodeKey>, TreeError> {
        let node = self.doc.node(key)?.clone();
        let Some(text) = node.text_str().map(str::to_owned) else {
            return Err(TreeError::NotTextBearing(key));
        };
        let len = char_len(&text);

        let mut bounds: Vec<usize> = offsets
            .iter()
            .copied()
            .filter(|o| *o > 0 && *o < len)
            .collect();
        bounds.sort_unstable();
        bounds.dedup();
        if bounds.is_empty() {
            return Ok(vec![key]);
        }

        let mut edges = Vec::with_capacity(bounds.len() + 2);
        edges.push(0);
        edges.extend(bounds);
        edges.push(len);

        let mut pieces = vec![key];
        self.doc
            .set_node(key, node.with_text(char_slice(&text, edges[0], edges[1])))?;
        let mut last = key;
        for window in edges.windows(2).skip(1) {
            let piece = self
                .doc
                .create(node.with_text(char_slice(&text, window[0], window[1])));
            self.doc.insert_after(last, piece)?;
            pieces.push(piece);
            last = piece;
        }

        if let Some(sel) = self.selection.as_mut() {
            let end = (!sel.is_collapsed()).then(|| sel.ordered(&self.doc).1);
            for point in [&mut sel.anchor, &mut sel.focus] {
                if point.key != key {
                    continue;
                }
                let is_end = end == Some(*point);
                let piece_ix = edges[1..edges.len() - 1]
                    .iter()
                    .filter(|b| if is_end { point.offset > **b } else { point.offset >= **b })
                    .count();
                *point = Point::new(pieces[piece_ix], point.offset - edges[piece_ix]);
            }
        }

        Ok(pieces)
    }
}
