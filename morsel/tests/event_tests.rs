//! Event dispatch through native listeners and the event record.

use facet_testhelpers::test;
use morsel::{Dom, Event, Handler, Listener, NodeId};
use std::cell::RefCell;
use std::rc::Rc;

type Log = Rc<RefCell<Vec<String>>>;

fn recorder(log: &Log, label: &'static str) -> Handler {
    let log = log.clone();
    Handler::new(move |event: &Event| {
        log.borrow_mut()
            .push(format!("{label}:{}", event.event_type()));
    })
}

/// `<div><p><b>` with a bound `click` handler on each level.
fn nested(log: &Log) -> (Dom, [NodeId; 3]) {
    let mut dom = Dom::parse_document("<html><body><div><p><b>x</b></p></div></body></html>");
    let div = dom.first_child(dom.body().unwrap()).unwrap();
    let p = dom.first_child(div).unwrap();
    let b = dom.first_child(p).unwrap();
    for (node, label) in [(div, "div"), (p, "p"), (b, "b")] {
        dom.bind_event(node, "click", recorder(log, label)).unwrap();
    }
    (dom, [div, p, b])
}

#[test]
fn test_bubbles_from_target_to_ancestors() {
    let log = Log::default();
    let (dom, [_, _, b]) = nested(&log);

    let event = dom.dispatch_event(b, Event::new("click")).unwrap();
    assert_eq!(*log.borrow(), ["b:click", "p:click", "div:click"]);
    assert_eq!(event.target(), Some(b));
    assert_eq!(event.current_target(), None);
}

#[test]
fn test_stop_propagation() {
    let log = Log::default();
    let (mut dom, [_, p, b]) = nested(&log);
    dom.bind_event(p, "click", |event: &Event| event.stop_propagation())
        .unwrap();

    dom.dispatch_event(b, Event::new("click")).unwrap();
    assert_eq!(*log.borrow(), ["b:click"]);
}

#[test]
fn test_non_bubbling_event_stays_on_target() {
    let log = Log::default();
    let (mut dom, [div, p, b]) = nested(&log);
    for node in [div, p, b] {
        dom.bind_event(node, "focus", recorder(&log, "f")).unwrap();
    }

    dom.dispatch_event(p, Event::non_bubbling("focus")).unwrap();
    assert_eq!(*log.borrow(), ["f:focus"]);
}

#[test]
fn test_native_and_dispatcher_run_in_registration_order() {
    let log = Log::default();
    let (mut dom, [_, _, b]) = nested(&log);
    dom.add_event_listener(b, "click", Listener::Native(recorder(&log, "native")))
        .unwrap();

    let event = Event::new("click");
    event.stop_propagation();
    let event = dom.dispatch_event(b, event).unwrap();
    assert!(event.propagation_stopped());
    assert_eq!(*log.borrow(), ["b:click", "native:click"]);
}

#[test]
fn test_prevent_default_is_reported() {
    let mut dom = Dom::parse_document("<html><body><a href=\"/x\">go</a></body></html>");
    let a = dom.first_child(dom.body().unwrap()).unwrap();
    dom.bind_event(a, "click", |event: &Event| event.prevent_default())
        .unwrap();

    let event = dom.dispatch_event(a, Event::new("click")).unwrap();
    assert!(event.default_prevented());
}

#[test]
fn test_unbind_removes_dispatcher() {
    let log = Log::default();
    let (mut dom, [_, _, b]) = nested(&log);
    dom.unbind_event(b, "click").unwrap();

    assert!(dom.listeners(b).is_empty());
    dom.dispatch_event(b, Event::new("click")).unwrap();
    assert_eq!(*log.borrow(), ["p:click", "div:click"]);
}
