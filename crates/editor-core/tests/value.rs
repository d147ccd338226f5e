use inferno_editor_core::{
    ColorType, Document, Editor, EditorValue, Node, NodeValue, PluginRegistry,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn sample() -> EditorValue {
    EditorValue::new([
        NodeValue::heading(2, [NodeValue::text("Title")]),
        NodeValue::paragraph([
            NodeValue::bold_text("bold "),
            NodeValue::colored("tinted", "cl-brand", ColorType::Background),
            NodeValue::link("https://x.com", [NodeValue::text(" link")]),
        ]),
    ])
}

#[test]
fn value_survives_json() {
    let value = sample();

    let json = value.to_json_pretty().unwrap();
    let parsed = EditorValue::from_json_str(&json).unwrap();

    assert_eq!(parsed, value);
}

#[test]
fn nodes_are_tagged_by_type() {
    let value = serde_json::to_value(NodeValue::paragraph([NodeValue::colored(
        "x",
        "cl-primary",
        ColorType::Text,
    )]))
    .unwrap();

    assert_eq!(value["type"], "element");
    assert_eq!(value["kind"], "paragraph");
    assert_eq!(value["children"][0]["type"], "colored_text");
    assert_eq!(value["children"][0]["highlight_color"], "cl-primary");
    assert_eq!(value["children"][0]["color_type"], "text");
}

#[test]
fn schema_and_version_have_defaults() {
    let json = json!({
        "root": {
            "type": "root",
            "children": [
                { "type": "element", "kind": "paragraph", "children": [
                    { "type": "text", "text": "hi" }
                ]}
            ]
        }
    });

    let value: EditorValue = serde_json::from_value(json).unwrap();

    assert_eq!(value.schema, "inferno-editor");
    assert_eq!(value.version, 1);
    assert_eq!(
        value.root.children,
        vec![NodeValue::paragraph([NodeValue::text("hi")])]
    );
}

#[test]
fn document_round_trips_through_values() {
    let value = sample();

    let doc = value.to_document().unwrap();

    assert_eq!(doc.to_value(), value.root);
    assert_eq!(doc.text_content(doc.root()), "Titlebold tinted link");
}

#[test]
fn a_bare_block_becomes_the_only_child_of_root() {
    let doc = Document::from_value(&NodeValue::paragraph([NodeValue::text("solo")])).unwrap();

    let blocks = doc.children(doc.root());
    assert_eq!(blocks.len(), 1);
    assert_eq!(doc.text_content(blocks[0]), "solo");
}

#[test]
fn leaves_cannot_hold_children() {
    let bad = NodeValue::text("leaf").with_children([NodeValue::text("child")]);

    assert!(Document::from_value(&bad).is_err());
}

#[test]
fn editor_exports_what_it_imported() {
    let value = sample();

    let editor = Editor::from_value(&value, PluginRegistry::richtext()).unwrap();

    assert_eq!(editor.to_value(), value);
    assert_eq!(
        editor.doc().get(editor.doc().find_text("Title").unwrap()),
        Some(&Node::text("Title"))
    );
}
