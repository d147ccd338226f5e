use inferno_editor_core::{
    Direction, EditorState, EditorValue, Node, NodeGroups, NodeKey, NodeValue, PartitionOptions,
    Point, RangeSelection, collect_siblings, partition,
};
use pretty_assertions::assert_eq;

fn state_with(blocks: impl IntoIterator<Item = NodeValue>) -> EditorState {
    let doc = EditorValue::new(blocks).to_document().unwrap();
    EditorState::new(doc)
}

fn select(state: &mut EditorState, anchor: (&str, usize), focus: (&str, usize)) {
    let a = state.doc.find_text(anchor.0).unwrap();
    let f = state.doc.find_text(focus.0).unwrap();
    state
        .set_selection(RangeSelection::new(
            Point::new(a, anchor.1),
            Point::new(f, focus.1),
        ))
        .unwrap();
}

fn texts(state: &EditorState, keys: &[NodeKey]) -> Vec<String> {
    keys.iter().map(|k| state.doc.text_content(*k)).collect()
}

fn link_url(state: &EditorState, key: NodeKey) -> Option<String> {
    state
        .doc
        .get(key)
        .and_then(Node::as_link)
        .map(|l| l.url.clone())
}

const INCLUDE: PartitionOptions = PartitionOptions {
    include_selected_decorations: true,
};

#[test]
fn without_selection_all_groups_are_empty() {
    let mut state = state_with([NodeValue::paragraph([NodeValue::text("abc")])]);

    let groups = partition(&mut state, PartitionOptions::default()).unwrap();

    assert_eq!(groups, NodeGroups::default());
}

#[test]
fn single_node_selection_reuses_untouched_siblings() {
    let mut state = state_with([NodeValue::paragraph([
        NodeValue::bold_text("one "),
        NodeValue::text("two three"),
        NodeValue::bold_text(" four"),
    ])]);
    let one = state.doc.find_text("one ").unwrap();
    select(&mut state, ("two three", 0), ("two three", 3));

    let groups = partition(&mut state, PartitionOptions::default()).unwrap();

    assert_eq!(texts(&state, &groups.before), ["one "]);
    assert_eq!(texts(&state, &groups.selected), ["two"]);
    assert_eq!(texts(&state, &groups.after), [" three", " four"]);
    assert_eq!(groups.before[0], one);
    assert_eq!(groups.text_content(&state.doc), "one two three four");
}

#[test]
fn backward_selection_partitions_like_forward() {
    let blocks = [NodeValue::paragraph([
        NodeValue::bold_text("ab"),
        NodeValue::text("cd"),
    ])];
    let mut forward = state_with(blocks.clone());
    select(&mut forward, ("ab", 1), ("cd", 1));
    let mut backward = state_with(blocks);
    select(&mut backward, ("cd", 1), ("ab", 1));
    assert!(!forward.selection.as_ref().unwrap().is_backward(&forward.doc));
    assert!(backward.selection.as_ref().unwrap().is_backward(&backward.doc));

    let forward_groups = partition(&mut forward, PartitionOptions::default()).unwrap();
    let backward_groups = partition(&mut backward, PartitionOptions::default()).unwrap();

    assert_eq!(texts(&forward, &forward_groups.selected), ["b", "c"]);
    assert_eq!(texts(&backward, &backward_groups.selected), ["b", "c"]);
    assert_eq!(texts(&backward, &backward_groups.before), ["a"]);
    assert_eq!(texts(&backward, &backward_groups.after), ["d"]);
}

#[test]
fn fragments_outside_a_link_stay_linked() {
    let mut state = state_with([NodeValue::paragraph([
        NodeValue::text("see "),
        NodeValue::link("https://docs.rs", [NodeValue::text("the docs")]),
        NodeValue::text("!"),
    ])]);
    select(&mut state, ("the docs", 4), ("the docs", 8));

    let groups = partition(&mut state, PartitionOptions::default()).unwrap();

    assert_eq!(texts(&state, &groups.before), ["see ", "the "]);
    assert_eq!(link_url(&state, groups.before[0]), None);
    assert_eq!(link_url(&state, groups.before[1]).as_deref(), Some("https://docs.rs"));
    assert_eq!(texts(&state, &groups.selected), ["docs"]);
    assert!(state.doc.get(groups.selected[0]).unwrap().is_text_bearing());
    assert_eq!(texts(&state, &groups.after), ["!"]);
}

#[test]
fn selected_fragments_are_decorated_on_request() {
    let mut state = state_with([NodeValue::paragraph([NodeValue::link(
        "https://docs.rs",
        [NodeValue::text("the docs")],
    )])]);
    select(&mut state, ("the docs", 4), ("the docs", 8));

    let groups = partition(&mut state, INCLUDE).unwrap();

    assert_eq!(groups.selected.len(), 1);
    assert_eq!(link_url(&state, groups.selected[0]).as_deref(), Some("https://docs.rs"));
    assert_eq!(texts(&state, &groups.selected), ["docs"]);
}

#[test]
fn colored_siblings_are_recreated() {
    let mut state = state_with([NodeValue::paragraph([
        NodeValue::colored("red", "cl-extra-1", inferno_editor_core::ColorType::Text),
        NodeValue::text("mid"),
    ])]);
    let red = state.doc.find_text("red").unwrap();
    select(&mut state, ("mid", 1), ("mid", 2));

    let groups = partition(&mut state, PartitionOptions::default()).unwrap();

    assert_eq!(texts(&state, &groups.before), ["red", "m"]);
    assert_ne!(groups.before[0], red);
    assert_eq!(state.doc.get(groups.before[0]), state.doc.get(red));
}

#[test]
fn inline_elements_between_endpoints_are_selected_whole() {
    let mut state = state_with([NodeValue::paragraph([
        NodeValue::text("ab"),
        NodeValue::link("https://x.com", [NodeValue::bold_text("cd")]),
        NodeValue::text("ef"),
    ])]);
    let link = state.doc.find_matching_parent(state.doc.find_text("cd").unwrap(), Node::is_link);
    select(&mut state, ("ab", 1), ("ef", 1));

    let groups = partition(&mut state, INCLUDE).unwrap();

    assert_eq!(texts(&state, &groups.before), ["a"]);
    assert_eq!(texts(&state, &groups.selected), ["b", "cd", "e"]);
    assert_eq!(Some(groups.selected[1]), link);
    assert_eq!(texts(&state, &groups.after), ["f"]);
}

#[test]
fn cross_parent_selection_unwraps_links_at_parent_level() {
    let mut state = state_with([NodeValue::paragraph([
        NodeValue::link("https://a.com", [NodeValue::text("click")]),
        NodeValue::link("https://b.com", [NodeValue::text("me")]),
        NodeValue::text(" now"),
    ])]);
    let me = state.doc.find_text("me").unwrap();
    select(&mut state, ("click", 2), (" now", 2));

    let groups = partition(&mut state, PartitionOptions::default()).unwrap();

    assert_eq!(texts(&state, &groups.before), ["cl"]);
    assert_eq!(link_url(&state, groups.before[0]).as_deref(), Some("https://a.com"));
    assert_eq!(texts(&state, &groups.selected), ["ick", "me", " n"]);
    assert_eq!(groups.selected[1], me);
    assert_eq!(texts(&state, &groups.after), ["ow"]);
    assert_eq!(groups.text_content(&state.doc), "clickme now");
}

#[test]
fn cross_parent_unwrapped_children_take_link_decoration_on_request() {
    let mut state = state_with([NodeValue::paragraph([
        NodeValue::link("https://a.com", [NodeValue::text("click")]),
        NodeValue::link("https://b.com", [NodeValue::text("me")]),
        NodeValue::text(" now"),
    ])]);
    select(&mut state, ("click", 2), (" now", 2));

    let groups = partition(&mut state, INCLUDE).unwrap();

    assert_eq!(groups.selected.len(), 3);
    assert_eq!(link_url(&state, groups.selected[0]).as_deref(), Some("https://a.com"));
    assert_eq!(link_url(&state, groups.selected[1]).as_deref(), Some("https://b.com"));
    assert_eq!(link_url(&state, groups.selected[2]), None);
}

#[test]
fn collecting_from_inside_a_link_includes_the_link_siblings() {
    let mut state = state_with([NodeValue::paragraph([
        NodeValue::text("x"),
        NodeValue::link(
            "https://x.com",
            [
                NodeValue::text("a"),
                NodeValue::bold_text("b"),
                NodeValue::text("c"),
            ],
        ),
        NodeValue::text("y"),
    ])]);
    let b = state.doc.find_text("b").unwrap();
    let link = state.doc.parent(b);
    let doc = &mut state.doc;

    let mut before = Vec::new();
    collect_siblings(doc, b, Direction::Before, link, &mut before).unwrap();
    let mut after = Vec::new();
    collect_siblings(doc, b, Direction::After, link, &mut after).unwrap();

    assert_eq!(texts(&state, &before), ["x", "a"]);
    assert_eq!(link_url(&state, before[1]).as_deref(), Some("https://x.com"));
    assert_eq!(texts(&state, &after), ["c", "y"]);
    assert_eq!(link_url(&state, after[0]).as_deref(), Some("https://x.com"));
    assert_eq!(link_url(&state, after[1]), None);
}
