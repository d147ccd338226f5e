use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::command::{CommandError, CommandSpec, EditorPlugin, decode_payload};
use crate::node::{ColorType, ColoredTextNode, Node, NodeKey, TextNode};
use crate::split::{PartitionOptions, partition};
use crate::state::EditorState;

pub const APPLY_COLOR_COMMAND: &str = "color.apply";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPayload {
    #[serde(rename = "colorId")]
    pub color_id: String,
    #[serde(rename = "type")]
    pub color_type: ColorType,
}

pub(crate) struct ColorPlugin;

impl EditorPlugin for ColorPlugin {
    fn id(&self) -> &'static str {
        "color"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new(APPLY_COLOR_COMMAND, "Apply color", |state, args| {
                let payload: ColorPayload = decode_payload(APPLY_COLOR_COMMAND, args)?;
                handle_color(state, &payload.color_id, payload.color_type)
            })
            .description("Color the selection, or remove the color if it is already applied.")
            .keywords(["color", "highlight", "background", "text color"]),
        ]
    }
}

pub fn color_args(color_id: &str, color_type: ColorType) -> Value {
    serde_json::json!({ "colorId": color_id, "type": color_type })
}

/// Toggles `color_id` on the current selection.
///
/// When every selected node already carries this exact color it is removed; otherwise the
/// selection's block is rebuilt with the selected content colored.
pub fn handle_color(
    state: &mut EditorState,
    color_id: &str,
    color_type: ColorType,
) -> Result<bool, CommandError> {
    let Some(sel) = state.selection.clone() else {
        log::debug!("color: no range selection");
        return Ok(false);
    };

    let nodes = sel.nodes(&state.doc);
    if should_unwrap(state, &nodes, color_id, color_type) {
        unwrap_colored_nodes(state, &nodes)?;
        return Ok(true);
    }

    let doc = &state.doc;
    let Some(block) = doc.nearest_block(sel.anchor.key) else {
        log::debug!("color: anchor has no block ancestor");
        return Ok(false);
    };
    if doc.nearest_block(sel.focus.key) != Some(block) {
        log::debug!("color: selection spans several blocks");
        return Ok(false);
    }

    let expected = doc.text_content(block);
    // Partition a copy so a rejected partition leaves `state` untouched.
    let mut working = state.clone();
    let groups = partition(
        &mut working,
        PartitionOptions {
            include_selected_decorations: true,
        },
    )?;
    if groups.text_content(&working.doc) != expected {
        log::warn!("color: partition of block {block} does not cover its content");
        return Ok(false);
    }

    *state = working;
    state.doc.clear(block)?;
    let selected = transform_nodes(state, &groups.selected, color_id, color_type)?;
    state.doc.append(block, &groups.before)?;
    state.doc.append(block, &selected)?;
    state.doc.append(block, &groups.after)?;
    state.select_end(block);
    Ok(true)
}

fn should_unwrap(
    state: &EditorState,
    nodes: &[NodeKey],
    color_id: &str,
    color_type: ColorType,
) -> bool {
    let mut texts = nodes
        .iter()
        .filter_map(|key| state.doc.get(*key))
        .filter(|node| node.is_text_bearing())
        .peekable();
    texts.peek().is_some()
        && texts.all(|node| {
            node.as_colored()
                .is_some_and(|c| c.highlight_color == color_id && c.color_type == color_type)
        })
}

fn unwrap_colored_nodes(state: &mut EditorState, nodes: &[NodeKey]) -> Result<(), CommandError> {
    for &key in nodes {
        let Some(colored) = state.doc.get(key).and_then(Node::as_colored) else {
            continue;
        };
        let plain = Node::Text(TextNode {
            text: colored.text.clone(),
            format: colored.format,
        });
        let plain = state.doc.create(plain);
        state.replace_node(key, plain)?;
    }
    Ok(())
}

fn transform_nodes(
    state: &mut EditorState,
    nodes: &[NodeKey],
    color_id: &str,
    color_type: ColorType,
) -> Result<Vec<NodeKey>, CommandError> {
    let doc = &mut state.doc;
    let mut out = Vec::with_capacity(nodes.len());
    for &key in nodes {
        let transformed = match doc.node(key)? {
            Node::ColoredText(colored) => {
                if colored.highlight_color != color_id || colored.color_type != color_type {
                    let recolored = Node::ColoredText(ColoredTextNode {
                        highlight_color: color_id.to_string(),
                        color_type,
                        ..colored.clone()
                    });
                    doc.set_node(key, recolored)?;
                }
                key
            }
            Node::Text(text) => {
                let colored =
                    Node::colored_text(text.text.clone(), color_id, color_type, text.format);
                doc.create(colored)
            }
            Node::Link(link) => {
                let link = link.clone();
                let wrapper = doc.create(Node::Link(link));
                for child in doc.children(key).to_vec() {
                    let child_node = doc.node(child)?;
                    let colored = child_node.text_str().map(|text| {
                        Node::colored_text(text, color_id, color_type, child_node.format())
                    });
                    let moved = match colored {
                        Some(colored) => doc.create(colored),
                        None => child,
                    };
                    doc.append(wrapper, &[moved])?;
                }
                wrapper
            }
            _ => key,
        };
        out.push(transformed);
    }
    Ok(out)
}

/// Color of the first colored node in the selection.
pub fn current_color(state: &EditorState) -> Option<(String, ColorType)> {
    state.selection_nodes().into_iter().find_map(|key| {
        state
            .doc
            .get(key)
            .and_then(Node::as_colored)
            .map(|c| (c.highlight_color.clone(), c.color_type))
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorItem {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub color_type: ColorType,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPalette {
    pub colors: Vec<ColorItem>,
    pub dark_colors: Vec<ColorItem>,
}

// (id, name, light text, light bg, dark text, dark bg)
const DEFAULT_COLORS: &[(&str, &str, &str, &str, &str, &str)] = &[
    ("cl-primary", "primary", "#2563eb", "#dbeafe", "#3b82f6", "#1e40af"),
    ("cl-secondary", "secondary", "#475569", "#e2e8f0", "#cbd5e1", "#475569"),
    ("cl-brand", "brand", "#7c3aed", "#e7d3ff", "#a855f7", "#6b21a8"),
    ("cl-extra-1", "color1", "#dc2626", "#fee2e2", "#f87171", "#7f1d1d"),
    ("cl-extra-2", "color2", "#ea580c", "#fed7aa", "#fb923c", "#9a3412"),
    ("cl-extra-3", "color3", "#d97706", "#fef3c7", "#fbbf24", "#92400e"),
    ("cl-extra-4", "color4", "#ca8a04", "#fef9c3", "#facc15", "#854d0e"),
    ("cl-extra-5", "color5", "#65a30d", "#ecfccb", "#a3e635", "#1a2e05"),
    ("cl-extra-6", "color6", "#16a34a", "#dcfce7", "#4ade80", "#14532d"),
    ("cl-extra-7", "color7", "#059669", "#d1fae5", "#34d399", "#064e3b"),
];

impl Default for ColorPalette {
    fn default() -> Self {
        let item = |id: &str, name: &str, color_type, color: &str| ColorItem {
            id: id.to_string(),
            name: name.to_string(),
            color_type,
            color: color.to_string(),
        };
        let mut colors = Vec::new();
        let mut dark_colors = Vec::new();
        for (id, name, text, bg, dark_text, dark_bg) in DEFAULT_COLORS {
            colors.push(item(id, name, ColorType::Text, text));
            colors.push(item(id, name, ColorType::Background, bg));
            dark_colors.push(item(id, name, ColorType::Text, dark_text));
            dark_colors.push(item(id, name, ColorType::Background, dark_bg));
        }
        Self {
            colors,
            dark_colors,
        }
    }
}

impl ColorPalette {
    pub fn text_colors(&self) -> impl Iterator<Item = &ColorItem> {
        self.colors
            .iter()
            .filter(|c| c.color_type == ColorType::Text)
    }

    pub fn background_colors(&self) -> impl Iterator<Item = &ColorItem> {
        self.colors
            .iter()
            .filter(|c| c.color_type == ColorType::Background)
    }

    /// Looks up a color value. `id` may carry the `text-` / `bg-` class prefix.
    pub fn color(&self, id: &str, color_type: ColorType, dark: bool) -> Option<&str> {
        let id = strip_class_prefix(id, color_type);
        let items = if dark { &self.dark_colors } else { &self.colors };
        items
            .iter()
            .find(|c| c.id == id && c.color_type == color_type)
            .map(|c| c.color.as_str())
    }

    pub fn update_color(&mut self, id: &str, color_type: ColorType, color: &str) -> bool {
        update_matching(&mut self.colors, color_type, color, |c| c.id == id)
    }

    pub fn update_dark_color(&mut self, name: &str, color_type: ColorType, color: &str) -> bool {
        update_matching(&mut self.dark_colors, color_type, color, |c| c.name == name)
    }

    pub fn css_class(id: &str, color_type: ColorType) -> String {
        format!("{}-{}", color_type.class_prefix(), id)
    }
}

fn strip_class_prefix(id: &str, color_type: ColorType) -> &str {
    id.strip_prefix(color_type.class_prefix())
        .and_then(|rest| rest.strip_prefix('-'))
        .unwrap_or(id)
}

fn update_matching(
    items: &mut [ColorItem],
    color_type: ColorType,
    color: &str,
    matches: impl Fn(&ColorItem) -> bool,
) -> bool {
    let mut updated = false;
    for item in items
        .iter_mut()
        .filter(|c| c.color_type == color_type && matches(c))
    {
        item.color = color.to_string();
        updated = true;
    }
    updated
}
