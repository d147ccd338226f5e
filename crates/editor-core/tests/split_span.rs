use inferno_editor_core::{
    ColorType, Document, Node, NodeKey, TextFormat, TreeError, split_span,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn text_of(doc: &Document, key: Option<NodeKey>) -> String {
    key.map(|k| doc.text_content(k)).unwrap_or_default()
}

#[rstest]
#[case(0, 0)]
#[case(0, 6)]
#[case(2, 4)]
#[case(3, 3)]
#[case(1, 6)]
#[case(6, 6)]
fn split_span_keeps_every_character(#[case] start: usize, #[case] end: usize) {
    let mut doc = Document::new();
    let key = doc.create(Node::text("abcdef"));

    let span = split_span(&mut doc, key, start, Some(end)).unwrap();

    let joined = format!(
        "{}{}{}",
        text_of(&doc, span.before),
        text_of(&doc, span.selected),
        text_of(&doc, span.after)
    );
    assert_eq!(joined, "abcdef");
    assert_eq!(span.before.is_some(), start > 0);
    assert_eq!(span.selected.is_some(), end > start);
    assert_eq!(span.after.is_some(), end < 6);
}

#[test]
fn zero_width_split_has_no_selected_fragment() {
    let mut doc = Document::new();
    let key = doc.create(Node::text("abcdef"));

    let span = split_span(&mut doc, key, 2, Some(2)).unwrap();

    assert_eq!(span.selected, None);
    assert_eq!(text_of(&doc, span.before), "ab");
    assert_eq!(text_of(&doc, span.after), "cdef");
}

#[test]
fn fragments_keep_format_and_source_is_untouched() {
    let mut doc = Document::new();
    let key = doc.create(Node::formatted_text("abcdef", TextFormat::bold()));

    let span = split_span(&mut doc, key, 1, Some(4)).unwrap();

    for fragment in [span.before, span.selected, span.after] {
        let fragment = fragment.unwrap();
        assert_ne!(fragment, key);
        assert!(doc.get(fragment).unwrap().format().bold);
    }
    assert_eq!(doc.get(key).unwrap().text_str(), Some("abcdef"));
}

#[test]
fn colored_source_yields_independently_colored_fragments() {
    let mut doc = Document::new();
    let key = doc.create(Node::colored_text(
        "abcdef",
        "red",
        ColorType::Text,
        TextFormat::italic(),
    ));

    let span = split_span(&mut doc, key, 2, Some(3)).unwrap();
    let fragments = [span.before.unwrap(), span.selected.unwrap(), span.after.unwrap()];

    assert_eq!(
        fragments.iter().collect::<std::collections::HashSet<_>>().len(),
        3
    );
    for fragment in fragments {
        let colored = doc.get(fragment).unwrap().as_colored().unwrap();
        assert_eq!(colored.highlight_color, "red");
        assert_eq!(colored.color_type, ColorType::Text);
        assert!(colored.format.italic);
    }
}

#[test]
fn offsets_are_clamped() {
    let mut doc = Document::new();
    let key = doc.create(Node::text("abcdef"));

    let span = split_span(&mut doc, key, 4, Some(99)).unwrap();
    assert_eq!(text_of(&doc, span.selected), "ef");
    assert_eq!(span.after, None);

    let span = split_span(&mut doc, key, 5, Some(2)).unwrap();
    assert_eq!(span.selected, None);
    assert_eq!(text_of(&doc, span.before), "ab");
    assert_eq!(text_of(&doc, span.after), "cdef");
}

#[test]
fn offsets_count_characters() {
    let mut doc = Document::new();
    let key = doc.create(Node::text("héllo"));

    let span = split_span(&mut doc, key, 1, Some(2)).unwrap();

    assert_eq!(text_of(&doc, span.before), "h");
    assert_eq!(text_of(&doc, span.selected), "é");
    assert_eq!(text_of(&doc, span.after), "llo");
}

#[test]
fn end_defaults_to_node_length() {
    let mut doc = Document::new();
    let key = doc.create(Node::text("abcdef"));

    let span = split_span(&mut doc, key, 3, None).unwrap();

    assert_eq!(text_of(&doc, span.selected), "def");
    assert_eq!(span.after, None);
}

#[test]
fn elements_cannot_be_split() {
    let mut doc = Document::new();
    let key = doc.create(Node::paragraph());

    assert_eq!(
        split_span(&mut doc, key, 0, None),
        Err(TreeError::NotTextBearing(key))
    );
}
