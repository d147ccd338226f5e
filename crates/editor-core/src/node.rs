use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub type Attrs = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKey(pub(crate) u32);

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct TextFormat {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub strikethrough: bool,
    #[serde(default)]
    pub code: bool,
    #[serde(default)]
    pub subscript: bool,
    #[serde(default)]
    pub superscript: bool,
}

impl TextFormat {
    pub fn bold() -> Self {
        Self {
            bold: true,
            ..Self::default()
        }
    }

    pub fn italic() -> Self {
        Self {
            italic: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorType {
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "bg")]
    Background,
}

impl ColorType {
    pub fn class_prefix(self) -> &'static str {
        match self {
            ColorType::Text => "text",
            ColorType::Background => "bg",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementNode {
    pub kind: String,
    #[serde(default)]
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub text: String,
    #[serde(default)]
    pub format: TextFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColoredTextNode {
    pub text: String,
    #[serde(default)]
    pub format: TextFormat,
    pub highlight_color: String,
    pub color_type: ColorType,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LinkNode {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl LinkNode {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoidNode {
    pub kind: String,
    #[serde(default)]
    pub inline: bool,
    #[serde(default)]
    pub attrs: Attrs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Root,
    Element(ElementNode),
    Text(TextNode),
    ColoredText(ColoredTextNode),
    Link(LinkNode),
    Void(VoidNode),
}

impl Node {
    pub fn paragraph() -> Self {
        Node::Element(ElementNode {
            kind: "paragraph".to_string(),
            inline: false,
        })
    }

    pub fn heading(level: u8) -> Self {
        Node::Element(ElementNode {
            kind: format!("h{}", level.clamp(1, 6)),
            inline: false,
        })
    }

    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(TextNode {
            text: text.into(),
            format: TextFormat::default(),
        })
    }

    pub fn formatted_text(text: impl Into<String>, format: TextFormat) -> Self {
        Node::Text(TextNode {
            text: text.into(),
            format,
        })
    }

    pub fn colored_text(
        text: impl Into<String>,
        highlight_color: impl Into<String>,
        color_type: ColorType,
        format: TextFormat,
    ) -> Self {
        Node::ColoredText(ColoredTextNode {
            text: text.into(),
            format,
            highlight_color: highlight_color.into(),
            color_type,
        })
    }

    pub fn link(link: LinkNode) -> Self {
        Node::Link(link)
    }

    pub fn is_text_bearing(&self) -> bool {
        matches!(self, Node::Text(_) | Node::ColoredText(_))
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Node::Root | Node::Element(_) | Node::Link(_))
    }

    pub fn is_inline(&self) -> bool {
        match self {
            Node::Root => false,
            Node::Element(el) => el.inline,
            Node::Text(_) | Node::ColoredText(_) | Node::Link(_) => true,
            Node::Void(v) => v.inline,
        }
    }

    /// Non-inline container: the root, paragraphs, headings and friends.
    pub fn is_block(&self) -> bool {
        self.is_container() && !self.is_inline()
    }

    pub fn is_link(&self) -> bool {
        matches!(self, Node::Link(_))
    }

    pub fn is_colored(&self) -> bool {
        matches!(self, Node::ColoredText(_))
    }

    pub fn as_link(&self) -> Option<&LinkNode> {
        match self {
            Node::Link(link) => Some(link),
            _ => None,
        }
    }

    pub fn as_colored(&self) -> Option<&ColoredTextNode> {
        match self {
            Node::ColoredText(colored) => Some(colored),
            _ => None,
        }
    }

    pub fn text_str(&self) -> Option<&str> {
        match self {
            Node::Text(t) => Some(&t.text),
            Node::ColoredText(t) => Some(&t.text),
            _ => None,
        }
    }

    pub fn format(&self) -> TextFormat {
        match self {
            Node::Text(t) => t.format,
            Node::ColoredText(t) => t.format,
            _ => TextFormat::default(),
        }
    }

    /// Same node kind and decoration, different text. Non text-bearing nodes are returned as is.
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        match self {
            Node::Text(t) => Node::Text(TextNode {
                text: text.into(),
                format: t.format,
            }),
            Node::ColoredText(t) => Node::ColoredText(ColoredTextNode {
                text: text.into(),
                ..t.clone()
            }),
            other => other.clone(),
        }
    }

    pub fn with_format(&self, format: TextFormat) -> Self {
        match self {
            Node::Text(t) => Node::Text(TextNode {
                text: t.text.clone(),
                format,
            }),
            Node::ColoredText(t) => Node::ColoredText(ColoredTextNode {
                format,
                ..t.clone()
            }),
            other => other.clone(),
        }
    }
}

pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Slices `s` by character offsets, clamping both ends to the string.
pub(crate) fn char_slice(s: &str, start: usize, end: usize) -> &str {
    let len = char_len(s);
    let end = end.min(len);
    let start = start.min(end);
    let byte = |ix: usize| s.char_indices().nth(ix).map(|(b, _)| b).unwrap_or(s.len());
    &s[byte(start)..byte(end)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_slice_respects_multibyte_boundaries() {
        assert_eq!(char_slice("héllo", 1, 3), "él");
        assert_eq!(char_slice("héllo", 3, 99), "lo");
        assert_eq!(char_slice("héllo", 4, 2), "");
    }

    #[test]
    fn with_format_keeps_text_and_color() {
        let colored = Node::colored_text("abc", "red", ColorType::Text, TextFormat::default());

        let bold = colored.with_format(TextFormat::bold());

        assert_eq!(bold.text_str(), Some("abc"));
        assert_eq!(bold.format(), TextFormat::bold());
        assert_eq!(bold.as_colored().map(|c| c.highlight_color.as_str()), Some("red"));
        assert_eq!(Node::paragraph().with_format(TextFormat::bold()), Node::paragraph());
    }

    #[test]
    fn color_type_uses_short_background_tag() {
        assert_eq!(
            serde_json::to_string(&ColorType::Background).unwrap(),
            "\"bg\""
        );
    }
}
