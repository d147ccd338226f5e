//! Selection partitioning.
//!
//! A range selection is cut into three ordered groups of nodes: content before the selection,
//! the selection itself, and content after it. Nodes under the two split points are rebuilt
//! from scratch; untouched siblings are carried over by key. Concatenating the three groups
//! reproduces the text of the original content.

use crate::document::{Document, TreeError};
use crate::node::{Node, NodeKey, char_len, char_slice};
use crate::state::EditorState;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeGroups {
    pub before: Vec<NodeKey>,
    pub selected: Vec<NodeKey>,
    pub after: Vec<NodeKey>,
}

impl NodeGroups {
    pub fn text_content(&self, doc: &Document) -> String {
        self.before
            .iter()
            .chain(&self.selected)
            .chain(&self.after)
            .map(|key| doc.text_content(*key))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartitionOptions {
    /// Rebuild decorations (color, enclosing link) on the selected fragments as well.
    /// Off by default so callers can put a fresh decoration over plain content.
    pub include_selected_decorations: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitSpan {
    pub before: Option<NodeKey>,
    pub selected: Option<NodeKey>,
    pub after: Option<NodeKey>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Before,
    After,
}

/// Cuts a text-bearing node into fresh `[0, start)`, `[start, end)` and `[end, len)` nodes.
///
/// Empty fragments are not created. Fragments keep the source's format and, for colored
/// text, its color. `end` defaults to the node length; offsets are clamped. The source node
/// is left as is.
pub fn split_span(
    doc: &mut Document,
    key: NodeKey,
    start: usize,
    end: Option<usize>,
) -> Result<SplitSpan, TreeError> {
    let node = doc.node(key)?.clone();
    let Some(text) = node.text_str() else {
        return Err(TreeError::NotTextBearing(key));
    };
    let len = char_len(text);
    let end = end.unwrap_or(len).min(len);
    let start = start.min(end);

    let mut fragment =
        |from: usize, to: usize| doc.create(node.with_text(char_slice(text, from, to)));

    Ok(SplitSpan {
        before: (start > 0).then(|| fragment(0, start)),
        selected: (end > start).then(|| fragment(start, end)),
        after: (end < len).then(|| fragment(end, len)),
    })
}

/// Rebuilds the decoration `key` had in the context of `parent`.
///
/// Colored text is recreated with the same color and format. When `parent` is a link, the
/// (possibly recreated) node is moved into a new link with the same attributes, and the new
/// link is returned.
pub fn decorate(
    doc: &mut Document,
    key: NodeKey,
    parent: Option<NodeKey>,
) -> Result<NodeKey, TreeError> {
    let mut decorated = key;
    if let Some(colored) = doc.node(key)?.as_colored() {
        let colored = Node::ColoredText(colored.clone());
        decorated = doc.create(colored);
    }

    let link = parent
        .and_then(|p| doc.get(p))
        .and_then(Node::as_link)
        .cloned();
    match link {
        Some(link) => {
            let wrapper = doc.create(Node::Link(link));
            doc.append(wrapper, &[decorated])?;
            Ok(wrapper)
        }
        None => Ok(decorated),
    }
}

/// Pushes the siblings of `from` in `direction` onto `target`, each decorated for `parent`.
///
/// When `parent` is a link, the link's own siblings are pushed as well, undecorated: before
/// the node's siblings for [`Direction::Before`], after them for [`Direction::After`].
pub fn collect_siblings(
    doc: &mut Document,
    from: NodeKey,
    direction: Direction,
    parent: Option<NodeKey>,
    target: &mut Vec<NodeKey>,
) -> Result<(), TreeError> {
    let link_parent = parent.filter(|p| doc.get(*p).is_some_and(Node::is_link));

    if let (Direction::Before, Some(link)) = (direction, link_parent) {
        target.extend(doc.previous_siblings(link));
    }

    let siblings = match direction {
        Direction::Before => doc.previous_siblings(from),
        Direction::After => doc.next_siblings(from),
    };
    for sibling in siblings {
        let decorated = decorate(doc, sibling, parent)?;
        target.push(decorated);
    }

    if let (Direction::After, Some(link)) = (direction, link_parent) {
        target.extend(doc.next_siblings(link));
    }
    Ok(())
}

fn push_selected(
    doc: &mut Document,
    key: NodeKey,
    parent: Option<NodeKey>,
    target: &mut Vec<NodeKey>,
    options: PartitionOptions,
) -> Result<(), TreeError> {
    if options.include_selected_decorations {
        let decorated = decorate(doc, key, parent)?;
        target.push(decorated);
    } else {
        target.push(key);
    }
    Ok(())
}

fn push_decorated(
    doc: &mut Document,
    key: Option<NodeKey>,
    parent: Option<NodeKey>,
    target: &mut Vec<NodeKey>,
) -> Result<(), TreeError> {
    if let Some(key) = key {
        let decorated = decorate(doc, key, parent)?;
        target.push(decorated);
    }
    Ok(())
}

/// Partitions the current range selection into before/selected/after groups.
///
/// Without a range selection all three groups are empty.
pub fn partition(
    state: &mut EditorState,
    options: PartitionOptions,
) -> Result<NodeGroups, TreeError> {
    let mut groups = NodeGroups::default();
    let Some(sel) = state.selection.clone() else {
        return Ok(groups);
    };
    let doc = &mut state.doc;

    let is_before = sel.anchor.is_before(&sel.focus, doc);
    let (start, end) = if is_before {
        (sel.anchor, sel.focus)
    } else {
        (sel.focus, sel.anchor)
    };
    let start_parent = doc.parent(start.key);
    let end_parent = doc.parent(end.key);

    if start_parent == end_parent {
        let parent = start_parent;
        collect_siblings(doc, start.key, Direction::Before, parent, &mut groups.before)?;

        if start.key == end.key {
            let split = split_span(doc, start.key, start.offset, Some(end.offset))?;
            push_decorated(doc, split.before, parent, &mut groups.before)?;
            if let Some(selected) = split.selected {
                push_selected(doc, selected, parent, &mut groups.selected, options)?;
            }
            push_decorated(doc, split.after, parent, &mut groups.after)?;
        } else {
            let start_split = split_span(doc, start.key, start.offset, None)?;
            push_decorated(doc, start_split.before, parent, &mut groups.before)?;
            if let Some(selected) = start_split.selected {
                push_selected(doc, selected, parent, &mut groups.selected, options)?;
            }

            let mut current = doc.next_sibling(start.key);
            while let Some(key) = current {
                if key == end.key {
                    break;
                }
                // Decorating may move `key` into a new link, so look ahead first.
                current = doc.next_sibling(key);
                if doc.node(key)?.is_text_bearing() {
                    push_selected(doc, key, parent, &mut groups.selected, options)?;
                } else {
                    let own_parent = doc.parent(key);
                    let decorated = decorate(doc, key, own_parent)?;
                    groups.selected.push(decorated);
                }
            }

            let end_split = split_span(doc, end.key, 0, Some(end.offset))?;
            if let Some(selected) = end_split.selected {
                push_selected(doc, selected, parent, &mut groups.selected, options)?;
            }
            push_decorated(doc, end_split.after, parent, &mut groups.after)?;
        }

        collect_siblings(doc, end.key, Direction::After, parent, &mut groups.after)?;
    } else {
        collect_siblings(doc, start.key, Direction::Before, start_parent, &mut groups.before)?;

        let start_split = split_span(doc, start.key, start.offset, None)?;
        push_decorated(doc, start_split.before, start_parent, &mut groups.before)?;
        if let Some(selected) = start_split.selected {
            push_selected(doc, selected, start_parent, &mut groups.selected, options)?;
        }

        let mut current = doc.next_sibling(start.key);
        let mut at_parent_level = false;
        if current.is_none() {
            at_parent_level = true;
            current = start_parent.and_then(|p| doc.next_sibling(p));
        }

        while let Some(key) = current {
            if Some(key) == end_parent || key == end.key {
                break;
            }
            current = doc.next_sibling(key);
            if at_parent_level && doc.node(key)?.is_link() {
                for child in doc.children(key).to_vec() {
                    push_selected(doc, child, Some(key), &mut groups.selected, options)?;
                }
            } else {
                groups.selected.push(key);
            }
        }

        let end_split = split_span(doc, end.key, 0, Some(end.offset))?;
        if let Some(selected) = end_split.selected {
            push_selected(doc, selected, end_parent, &mut groups.selected, options)?;
        }
        push_decorated(doc, end_split.after, end_parent, &mut groups.after)?;

        collect_siblings(doc, end.key, Direction::After, end_parent, &mut groups.after)?;
    }

    log::trace!(
        "partitioned selection: {} before, {} selected, {} after",
        groups.before.len(),
        groups.selected.len(),
        groups.after.len()
    );
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{ColorType, LinkNode, TextFormat};

    #[test]
    fn decorate_wraps_each_call_in_its_own_link() {
        let mut doc = Document::new();
        let link = doc.create(Node::link(LinkNode::new("https://a.com")));
        let a = doc.create(Node::text("a"));
        let b = doc.create(Node::text("b"));
        doc.append(link, &[a, b]).unwrap();

        let wrapped_a = decorate(&mut doc, a, Some(link)).unwrap();
        let wrapped_b = decorate(&mut doc, b, Some(link)).unwrap();

        assert_ne!(wrapped_a, wrapped_b);
        assert_eq!(doc.children(wrapped_a), &[a]);
        assert_eq!(doc.children(wrapped_b), &[b]);
        assert!(doc.children(link).is_empty());
        assert_eq!(doc.get(wrapped_a).and_then(Node::as_link).unwrap().url, "https://a.com");
    }

    #[test]
    fn decorate_recreates_colored_text() {
        let mut doc = Document::new();
        let red = doc.create(Node::colored_text("x", "red", ColorType::Text, TextFormat::bold()));

        let copy = decorate(&mut doc, red, None).unwrap();

        assert_ne!(copy, red);
        assert_eq!(doc.get(copy), doc.get(red));
    }
}
