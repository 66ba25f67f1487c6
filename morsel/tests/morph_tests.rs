//! End-to-end morph behavior through the public API.

use facet_testhelpers::test;
use morsel::{Dom, DomError, Event, LiveValue, Mutation, NodeId};
use std::cell::Cell;
use std::rc::Rc;

fn empty_body() -> (Dom, NodeId) {
    let dom = Dom::parse_document("<html><body></body></html>");
    let body = dom.body().unwrap();
    (dom, body)
}

fn todo_list(dom: &mut Dom, items: &[(&str, &str)]) -> NodeId {
    let children: Vec<NodeId> = items
        .iter()
        .map(|&(key, text)| {
            dom.element("li")
                .key(key)
                .attr("class", "todo")
                .text(text)
                .build()
                .unwrap()
        })
        .collect();
    dom.element("ul").attr("id", "todos").children(children).build().unwrap()
}

#[test]
fn test_keyed_list_scenario() {
    let (mut dom, body) = empty_body();
    let first = todo_list(&mut dom, &[("1", "A"), ("2", "B")]);
    dom.morph(body, first).unwrap();

    let ul = dom.first_child(body).unwrap();
    let b = dom.last_child(ul).unwrap();

    let next = todo_list(&mut dom, &[("2", "B2"), ("3", "C")]);
    dom.morph(body, next).unwrap();

    assert_eq!(dom.first_child(body), Some(ul));
    assert_eq!(dom.first_child(ul), Some(b));
    assert_eq!(
        dom.to_html(),
        r#"<ul id="todos"><li class="todo">B2</li><li class="todo">C</li></ul>"#
    );
}

#[test]
fn test_morph_is_idempotent() {
    let (mut dom, body) = empty_body();
    let items = [("a", "Write"), ("b", "Test"), ("c", "Ship")];
    let first = todo_list(&mut dom, &items);
    dom.morph(body, first).unwrap();

    let again = todo_list(&mut dom, &items);
    dom.observe();
    dom.morph(body, again).unwrap();
    assert_eq!(dom.take_records(), Vec::<Mutation>::new());
}

#[test]
fn test_reorder_only_moves() {
    let (mut dom, body) = empty_body();
    let first = todo_list(&mut dom, &[("a", "A"), ("b", "B"), ("c", "C"), ("d", "D")]);
    dom.morph(body, first).unwrap();
    let ul = dom.first_child(body).unwrap();
    let before = dom.child_ids(ul);

    let next = todo_list(&mut dom, &[("d", "D"), ("b", "B"), ("a", "A"), ("c", "C")]);
    dom.observe();
    dom.morph(body, next).unwrap();

    let records = dom.take_records();
    assert!(records.iter().all(|m| matches!(m, Mutation::Insert { .. })));
    let after = dom.child_ids(ul);
    assert_eq!(after, vec![before[3], before[1], before[0], before[2]]);
    assert_eq!(
        dom.to_html(),
        r#"<ul id="todos"><li class="todo">D</li><li class="todo">B</li><li class="todo">A</li><li class="todo">C</li></ul>"#
    );
}

#[test]
fn test_focus_and_scroll_survive_reuse() {
    let (mut dom, body) = empty_body();
    let input = dom.element("input").attr("name", "q").build().unwrap();
    let list = dom.element("div").attr("class", "results").build().unwrap();
    dom.morph(body, vec![input, list]).unwrap();

    dom.focus(input).unwrap();
    dom.set_scroll_position(list, 120, 0).unwrap();

    let next_input = dom
        .element("input")
        .attr("name", "q")
        .attr("placeholder", "Search")
        .build()
        .unwrap();
    let next_list = dom.element("div").attr("class", "results").text("3 hits").build().unwrap();
    dom.morph(body, vec![next_input, next_list]).unwrap();

    assert_eq!(dom.active_element(), Some(input));
    assert_eq!(dom.scroll_position(list), Some((120, 0)));
    assert_eq!(dom.attribute(input, "placeholder"), Some("Search"));
}

#[test]
fn test_focus_lost_when_node_removed() {
    let (mut dom, body) = empty_body();
    let input = dom.element("input").build().unwrap();
    dom.morph(body, input).unwrap();
    dom.focus(input).unwrap();

    let next = dom.element("p").text("done").build().unwrap();
    dom.morph(body, next).unwrap();

    assert_eq!(dom.active_element(), None);
    assert!(dom.is_removed(input));
}

#[test]
fn test_keep_node_is_opaque() {
    let (mut dom, body) = empty_body();
    let editor = dom.element("div").key("editor").keep().build().unwrap();
    let header = dom.element("h1").text("Doc").build().unwrap();
    dom.morph(body, vec![header, editor]).unwrap();

    // Third-party code fills the kept node
    let canvas = dom.create_element("canvas");
    dom.append_child(editor, canvas).unwrap();
    dom.set_attribute(editor, "data-ready", "1").unwrap();

    let header = dom.element("h1").text("Doc v2").build().unwrap();
    let editor_again = dom.element("div").key("editor").keep().build().unwrap();
    dom.morph(body, vec![header, editor_again]).unwrap();
    assert_eq!(dom.first_child(editor), Some(canvas));
    assert_eq!(dom.attribute(editor, "data-ready"), Some("1"));

    // Even without a counterpart it stays
    let header = dom.element("h1").text("Doc v3").build().unwrap();
    dom.morph(body, header).unwrap();
    assert_eq!(dom.last_child(body), Some(editor));
    assert_eq!(
        dom.to_html(),
        r#"<h1>Doc v3</h1><div data-ready="1"><canvas></canvas></div>"#
    );
}

#[test]
fn test_handlers_follow_the_new_tree() {
    let (mut dom, body) = empty_body();
    let count = Rc::new(Cell::new(0));

    let make_button = |dom: &mut Dom, step: i32| {
        let count = count.clone();
        dom.element("button")
            .on("click", move |_: &Event| count.set(count.get() + step))
            .text("+")
            .build()
            .unwrap()
    };

    let first = make_button(&mut dom, 1);
    dom.morph(body, first).unwrap();
    let button = dom.first_child(body).unwrap();
    dom.dispatch_event(button, Event::new("click")).unwrap();

    let second = make_button(&mut dom, 10);
    dom.morph(body, second).unwrap();
    dom.dispatch_event(button, Event::new("click")).unwrap();

    assert_eq!(count.get(), 11);
    assert_eq!(dom.listeners(button).len(), 1);
}

#[test]
fn test_assigned_properties_follow_the_new_tree() {
    let (mut dom, body) = empty_body();
    let config = LiveValue::new(("theme", "dark"));
    let first = dom.element("x-widget").prop("config", config.clone()).build().unwrap();
    dom.morph(body, first).unwrap();
    let widget = dom.first_child(body).unwrap();

    let next = dom.element("x-widget").prop("config", config.clone()).build().unwrap();
    dom.observe();
    dom.morph(body, next).unwrap();
    assert!(dom.take_records().is_empty());
    assert_eq!(
        dom.property(widget, "config")
            .and_then(|v| v.downcast_ref::<(&str, &str)>()),
        Some(&("theme", "dark"))
    );
}

#[test]
fn test_morph_array_and_fragment_agree() {
    let (mut dom, body) = empty_body();
    let a = dom.element("p").text("a").build().unwrap();
    let b = dom.element("p").text("b").build().unwrap();
    dom.morph(body, [a, b]).unwrap();
    let array_html = dom.to_html();

    let (mut other, other_body) = empty_body();
    let frag = other.fragment();
    let a = other.element("p").text("a").build().unwrap();
    let b = other.element("p").text("b").build().unwrap();
    other.append_child(frag, a).unwrap();
    other.append_child(frag, b).unwrap();
    other.morph(other_body, frag).unwrap();

    assert_eq!(array_html, other.to_html());
}

#[test]
fn test_errors_surface_from_dom_operations() {
    let (mut dom, body) = empty_body();
    let next = dom.element("p").build().unwrap();
    dom.dispose(next);
    assert_eq!(dom.morph(body, next), Err(DomError::Removed));
}

#[test]
fn test_new_tree_is_freed() {
    let (mut dom, body) = empty_body();
    let first = todo_list(&mut dom, &[("a", "A")]);
    dom.morph(body, first).unwrap();
    let allocated = dom.arena_len();

    for _ in 0..10 {
        let next = todo_list(&mut dom, &[("a", "A")]);
        dom.morph(body, next).unwrap();
    }

    // Freed slots are reused, so repeated morphs do not grow the arena
    assert!(dom.arena_len() <= allocated + 3);
}

#[test]
fn test_records_name_the_patched_node() {
    let (mut dom, body) = empty_body();
    let first = dom.element("input").attr("class", "a").build().unwrap();
    dom.morph(body, first).unwrap();
    let input = dom.first_child(body).unwrap();

    let next = dom
        .element("input")
        .attr("class", "b")
        .prop("model", LiveValue::new(1u8))
        .build()
        .unwrap();
    dom.observe();
    dom.morph(body, next).unwrap();

    let records = dom.take_records();
    assert!(!records.is_empty());
    assert!(records.iter().all(|m| m.node() == input));
    assert_eq!(records.iter().filter(|m| m.is_attribute()).count(), 1);
    assert_eq!(records.iter().filter(|m| m.is_property()).count(), 1);
    assert!(records.iter().all(|m| !m.is_structural()));
}

#[test]
fn test_unkeyed_keep_survives_rerenders() {
    let (mut dom, body) = empty_body();
    let render = |dom: &mut Dom, title: &str| {
        let header = dom.element("h1").text(title).build().unwrap();
        let editor = dom.element("div").keep().build().unwrap();
        vec![header, editor]
    };

    let first = render(&mut dom, "Doc");
    dom.morph(body, first).unwrap();
    let editor = dom.last_child(body).unwrap();
    let canvas = dom.create_element("canvas");
    dom.append_child(editor, canvas).unwrap();

    let next = render(&mut dom, "Doc");
    dom.observe();
    dom.morph(body, next).unwrap();
    assert!(dom.take_records().is_empty());

    let next = render(&mut dom, "Doc v2");
    dom.morph(body, next).unwrap();
    assert_eq!(dom.child_count(body), 2);
    assert_eq!(dom.last_child(body), Some(editor));
    assert_eq!(dom.to_html(), "<h1>Doc v2</h1><div><canvas></canvas></div>");
}

#[test]
fn test_fragment_and_nodes_mix_in_one_list() {
    let (mut dom, body) = empty_body();
    let frag = dom.fragment();
    let a = dom.element("p").text("a").build().unwrap();
    let b = dom.element("p").text("b").build().unwrap();
    dom.append_child(frag, a).unwrap();
    dom.append_child(frag, b).unwrap();
    let c = dom.element("p").text("c").build().unwrap();

    dom.morph(body, vec![c, frag]).unwrap();
    assert_eq!(dom.to_html(), "<p>c</p><p>a</p><p>b</p>");
    assert_eq!(dom.previous_sibling(a), Some(c));
}
