use crate::command::{
    CommandSpec, EditorPlugin, NodeTransform, Priority, SELECTION_CHANGE_COMMAND,
};
use crate::document::TreeError;
use crate::node::{Node, NodeKey, TextNode, char_len};
use crate::selection::Point;
use crate::state::{EditorState, SelectionFacts};

pub(crate) struct CorePlugin;

impl EditorPlugin for CorePlugin {
    fn id(&self) -> &'static str {
        "core"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new(SELECTION_CHANGE_COMMAND, "Track selection", |state, _args| {
                state.facts = selection_facts(state);
                Ok(false)
            })
            .description("Recompute block/link facts for the current selection.")
            .priority(Priority::Low),
        ]
    }

    fn node_transforms(&self) -> Vec<Box<dyn NodeTransform>> {
        vec![Box::new(NormalizeTextSiblings)]
    }
}

pub fn selection_facts(state: &EditorState) -> SelectionFacts {
    let Some(sel) = state.selection.as_ref() else {
        return SelectionFacts {
            has_same_parent_block_node: false,
            is_link_node: false,
        };
    };
    let doc = &state.doc;
    let has_same_parent_block_node =
        match (doc.nearest_block(sel.anchor.key), doc.nearest_block(sel.focus.key)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        };
    let is_link_node = doc
        .parent(sel.anchor.key)
        .and_then(|p| doc.get(p))
        .is_some_and(Node::is_link);
    SelectionFacts {
        has_same_parent_block_node,
        is_link_node,
    }
}

/// Drops stray empty text leaves and merges adjacent plain text leaves with equal format.
struct NormalizeTextSiblings;

impl NodeTransform for NormalizeTextSiblings {
    fn id(&self) -> &'static str {
        "core.normalize_text_siblings"
    }

    fn applies_to(&self, node: &Node) -> bool {
        matches!(node, Node::Text(_))
    }

    fn run(&self, state: &mut EditorState, key: NodeKey) -> Result<(), TreeError> {
        let Some(Node::Text(text)) = state.doc.get(key) else {
            return Ok(());
        };

        if text.text.is_empty() {
            let referenced = state.selection.as_ref().is_some_and(|s| s.references(key));
            if !referenced && state.doc.parent(key).is_some() {
                state.doc.remove(key)?;
            }
            return Ok(());
        }

        let mut target = key;
        if let Some(prev) = state.doc.previous_sibling(key) {
            if mergeable(state, prev, key) {
                merge_into(state, prev, key)?;
                target = prev;
            }
        }
        while let Some(next) = state.doc.next_sibling(target) {
            if !mergeable(state, target, next) {
                break;
            }
            merge_into(state, target, next)?;
        }
        Ok(())
    }
}

fn mergeable(state: &EditorState, left: NodeKey, right: NodeKey) -> bool {
    match (state.doc.get(left), state.doc.get(right)) {
        (Some(Node::Text(l)), Some(Node::Text(r))) => l.format == r.format,
        _ => false,
    }
}

fn merge_into(state: &mut EditorState, left: NodeKey, right: NodeKey) -> Result<(), TreeError> {
    let (Some(Node::Text(l)), Some(Node::Text(r))) = (state.doc.get(left), state.doc.get(right))
    else {
        return Ok(());
    };
    let shift = char_len(&l.text);
    let merged = Node::Text(TextNode {
        text: format!("{}{}", l.text, r.text),
        format: l.format,
    });
    state.doc.set_node(left, merged)?;
    state.doc.remove(right)?;

    if let Some(sel) = state.selection.as_mut() {
        for point in [&mut sel.anchor, &mut sel.focus] {
            if point.key == right {
                *point = Point::new(left, point.offset + shift);
            }
        }
    }
    log::trace!("merged text {right} into {left}");
    Ok(())
}
