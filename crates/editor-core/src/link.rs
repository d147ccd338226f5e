use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::command::{CommandError, CommandSpec, EditorPlugin, NodeTransform, decode_payload};
use crate::document::{Document, TreeError};
use crate::node::{LinkNode, Node, NodeKey};
use crate::split::{PartitionOptions, partition};
use crate::state::EditorState;

pub const APPLY_LINK_COMMAND: &str = "link.apply";
pub const REMOVE_LINK_COMMAND: &str = "link.remove";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,
}

impl LinkOptions {
    pub fn new_tab(open_in_new_tab: bool) -> Self {
        Self {
            target: Some(if open_in_new_tab { "_blank" } else { "_self" }.to_string()),
            ..Self::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        let title = title.into();
        self.title = (!title.is_empty()).then_some(title);
        self
    }

    fn into_link(self, url: impl Into<String>) -> LinkNode {
        LinkNode {
            url: url.into(),
            target: self.target,
            rel: self.rel,
            title: self.title,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkPayload {
    pub url: String,
    #[serde(flatten)]
    pub options: LinkOptions,
}

pub fn link_args(url: &str, options: &LinkOptions) -> Value {
    serde_json::to_value(LinkPayload {
        url: url.to_string(),
        options: options.clone(),
    })
    .unwrap_or(Value::Null)
}

pub(crate) struct LinkPlugin;

impl EditorPlugin for LinkPlugin {
    fn id(&self) -> &'static str {
        "link"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new(APPLY_LINK_COMMAND, "Apply link", |state, args| {
                let payload: LinkPayload = decode_payload(APPLY_LINK_COMMAND, args)?;
                handle_link(state, &payload.url, payload.options)
            })
            .description("Link the selection, or unlink it if it already points at this URL.")
            .keywords(["link", "url", "hyperlink"]),
            CommandSpec::new(REMOVE_LINK_COMMAND, "Remove link", |state, _args| {
                toggle_link(state, None)
            })
            .description("Remove every link touching the selection.")
            .keywords(["link", "unlink", "url", "hyperlink"]),
        ]
    }

    fn node_transforms(&self) -> Vec<Box<dyn NodeTransform>> {
        vec![Box::new(MergeAdjacentLinks)]
    }
}

pub fn handle_link(
    state: &mut EditorState,
    url: &str,
    options: LinkOptions,
) -> Result<bool, CommandError> {
    let Some(sel) = state.selection.as_ref() else {
        log::debug!("link: no range selection");
        return Ok(false);
    };
    if sel.is_collapsed() {
        log::debug!("link: collapsed selection");
        return Ok(false);
    }

    let link = if is_link_active(state, url) {
        None
    } else {
        Some(options.into_link(url))
    };

    if state.facts.has_same_parent_block_node {
        rebuild_block_with_link(state, link)
    } else {
        log::debug!("link: selection spans blocks, using range toggle");
        toggle_link(state, link)
    }
}

/// True when every selected text node already sits inside a link to `url`.
pub fn is_link_active(state: &EditorState, url: &str) -> bool {
    let doc = &state.doc;
    let mut texts = state
        .selection_nodes()
        .into_iter()
        .filter(|k| doc.get(*k).is_some_and(Node::is_text_bearing))
        .peekable();
    texts.peek().is_some()
        && texts.all(|key| {
            doc.find_matching_parent(key, Node::is_link)
                .and_then(|l| doc.get(l))
                .and_then(Node::as_link)
                .is_some_and(|l| l.url == url)
        })
}

/// Rebuilds the anchor's block as before + selected (wrapped in `link`, if any) + after.
fn rebuild_block_with_link(
    state: &mut EditorState,
    link: Option<LinkNode>,
) -> Result<bool, CommandError> {
    let Some(anchor) = state.selection.as_ref().map(|s| s.anchor.key) else {
        return Ok(false);
    };
    let Some(block) = state.doc.nearest_block(anchor) else {
        log::debug!("link: anchor has no block ancestor");
        return Ok(false);
    };
    let expected = state.doc.text_content(block);

    let mut working = state.clone();
    let groups = partition(&mut working, PartitionOptions::default())?;
    if groups.selected.is_empty() {
        return Ok(false);
    }
    if groups.text_content(&working.doc) != expected {
        log::warn!("link: partition of block {block} does not cover its content");
        return Ok(false);
    }

    *state = working;
    let doc = &mut state.doc;
    doc.clear(block)?;
    doc.append(block, &groups.before)?;
    match link {
        Some(link) => {
            let wrapper = doc.create(Node::Link(link));
            for key in groups.selected {
                if doc.node(key)?.is_link() {
                    let children = doc.children(key).to_vec();
                    doc.append(wrapper, &children)?;
                } else {
                    doc.append(wrapper, &[key])?;
                }
            }
            doc.append(block, &[wrapper])?;
        }
        None => doc.append(block, &groups.selected)?,
    }
    doc.append(block, &groups.after)?;
    state.select_end(block);
    Ok(true)
}

/// Range toggle that works across blocks without partitioning.
///
/// `Some(link)` wraps the selected leaves (runs of siblings share one new link) or updates the
/// link they already sit in. `None` unwraps every link touching the selection.
pub fn toggle_link(state: &mut EditorState, link: Option<LinkNode>) -> Result<bool, CommandError> {
    let Some(sel) = state.selection.clone() else {
        return Ok(false);
    };

    if sel.is_collapsed() {
        let Some(parent) = state
            .doc
            .parent(sel.anchor.key)
            .filter(|p| state.doc.get(*p).is_some_and(Node::is_link))
        else {
            return Ok(false);
        };
        match link {
            Some(link) => state.doc.set_node(parent, Node::Link(link))?,
            None => unwrap_link(state, parent)?,
        }
        return Ok(true);
    }

    let (start, end) = sel.ordered(&state.doc);
    if start.key == end.key {
        state.split_text(start.key, &[start.offset, end.offset])?;
    } else {
        state.split_text(end.key, &[end.offset])?;
        state.split_text(start.key, &[start.offset])?;
    }

    let leaves: Vec<NodeKey> = state
        .selection_nodes()
        .into_iter()
        .filter(|k| {
            state
                .doc
                .get(*k)
                .is_some_and(|n| n.is_text_bearing() || matches!(n, Node::Void(v) if v.inline))
        })
        .collect();

    let Some(link) = link else {
        let mut links: Vec<NodeKey> = Vec::new();
        for key in &leaves {
            if let Some(l) = state.doc.find_matching_parent(*key, Node::is_link) {
                if !links.contains(&l) {
                    links.push(l);
                }
            }
        }
        for l in &links {
            unwrap_link(state, *l)?;
        }
        return Ok(!links.is_empty());
    };

    let doc = &mut state.doc;
    let mut changed = false;
    let mut open: Option<NodeKey> = None;
    for key in leaves {
        let parent = doc.parent(key);
        if let Some(existing) = parent.and_then(|p| doc.get(p)).and_then(Node::as_link) {
            if *existing != link {
                if let Some(parent) = parent {
                    doc.set_node(parent, Node::Link(link.clone()))?;
                }
                changed = true;
            }
            open = None;
            continue;
        }

        if let Some(current) = open.filter(|l| doc.previous_sibling(key) == Some(*l)) {
            doc.append(current, &[key])?;
        } else {
            let wrapper = doc.create(Node::Link(link.clone()));
            doc.insert_before(key, wrapper)?;
            doc.append(wrapper, &[key])?;
            open = Some(wrapper);
        }
        changed = true;
    }
    Ok(changed)
}

fn unwrap_link(state: &mut EditorState, link: NodeKey) -> Result<(), TreeError> {
    let doc = &mut state.doc;
    for child in doc.children(link).to_vec() {
        doc.insert_before(link, child)?;
    }
    doc.remove(link)
}

/// Folds a link into identical-URL neighbours so back-to-back links to one target collapse.
struct MergeAdjacentLinks;

impl NodeTransform for MergeAdjacentLinks {
    fn id(&self) -> &'static str {
        "link.merge_adjacent"
    }

    fn applies_to(&self, node: &Node) -> bool {
        node.is_link()
    }

    fn run(&self, state: &mut EditorState, key: NodeKey) -> Result<(), TreeError> {
        let doc = &mut state.doc;
        let Some(url) = doc.get(key).and_then(Node::as_link).map(|l| l.url.clone()) else {
            return Ok(());
        };
        let mut current = key;
        if let Some(prev) = doc.previous_sibling(key).filter(|p| links_to(doc, *p, &url)) {
            let children = doc.children(key).to_vec();
            doc.append(prev, &children)?;
            doc.remove(key)?;
            current = prev;
        }
        while let Some(next) = doc.next_sibling(current).filter(|n| links_to(doc, *n, &url)) {
            let children = doc.children(next).to_vec();
            doc.append(current, &children)?;
            doc.remove(next)?;
        }
        if current != key {
            log::trace!("merged link {key} into {current}");
        }
        Ok(())
    }
}

fn links_to(doc: &Document, key: NodeKey, url: &str) -> bool {
    doc.get(key)
        .and_then(Node::as_link)
        .is_some_and(|l| l.url == url)
}

/// Absolute URLs a URL parser accepts, plus `/` and `#` references.
pub fn is_valid_url(url: &str) -> bool {
    url.starts_with('/') || url.starts_with('#') || Url::parse(url).is_ok()
}
