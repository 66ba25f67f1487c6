//! Event handlers, the per-node event record, and native listeners.
//!
//! Every element has two layers:
//!
//! - the **native** listener list ([`Listener`]), which is what
//!   [`Dom::dispatch_event`](crate::Dom::dispatch_event) walks, and
//! - the **event record** ([`EventRecord`]), the producer-facing map of
//!   event type to the handler that should currently run.
//!
//! The two are connected by [`Listener::Dispatcher`]: at most one per event
//! type is ever registered natively, and it forwards to whatever handler the
//! record holds at dispatch time. Swapping a handler therefore only touches
//! the record, never the native registration.

use crate::{Dom, DomError, Mutation, NodeId, Stem};
use indexmap::IndexMap;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

#[allow(unused_imports)]
use crate::tracing_macros::trace;

/// A callback invoked for a dispatched event.
///
/// Equality is identity: two handlers are the same only if they share the
/// same allocation.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&Event)>);

impl Handler {
    pub fn new(f: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn ptr_eq(&self, other: &Handler) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({:p})", Rc::as_ptr(&self.0))
    }
}

impl<F> From<F> for Handler
where
    F: Fn(&Event) + 'static,
{
    fn from(f: F) -> Self {
        Self::new(f)
    }
}

/// A natively registered listener.
#[derive(Clone, Debug)]
pub enum Listener {
    /// The stable forwarder installed by the morph engine and the builder.
    Dispatcher,
    /// A listener added directly, outside the event record (e.g. by a
    /// third-party widget). The differ never touches these.
    Native(Handler),
}

impl Listener {
    /// Whether registering `other` would duplicate this listener.
    pub fn same_as(&self, other: &Listener) -> bool {
        match (self, other) {
            (Listener::Dispatcher, Listener::Dispatcher) => true,
            (Listener::Native(a), Listener::Native(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

/// Ordered map from event type to the currently active handler.
#[derive(Clone, Debug, Default)]
pub struct EventRecord(IndexMap<Stem, Handler>);

impl EventRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, event_type: &str) -> Option<&Handler> {
        self.0.get(event_type)
    }

    pub fn contains(&self, event_type: &str) -> bool {
        self.0.contains_key(event_type)
    }

    /// Stores `handler`, returning the previous one for that type.
    pub fn insert(&mut self, event_type: Stem, handler: Handler) -> Option<Handler> {
        self.0.insert(event_type, handler)
    }

    pub fn remove(&mut self, event_type: &str) -> Option<Handler> {
        self.0.shift_remove(event_type)
    }

    pub fn types(&self) -> impl Iterator<Item = &Stem> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Stem, &Handler)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An event travelling from its target up through its ancestors.
#[derive(Debug)]
pub struct Event {
    event_type: Stem,
    bubbles: bool,
    target: Cell<Option<NodeId>>,
    current_target: Cell<Option<NodeId>>,
    propagation_stopped: Cell<bool>,
    default_prevented: Cell<bool>,
}

impl Event {
    /// A bubbling event of the given type.
    pub fn new(event_type: impl Into<Stem>) -> Self {
        Self {
            event_type: event_type.into(),
            bubbles: true,
            target: Cell::new(None),
            current_target: Cell::new(None),
            propagation_stopped: Cell::new(false),
            default_prevented: Cell::new(false),
        }
    }

    /// An event that only reaches listeners on its target (like `focus`).
    pub fn non_bubbling(event_type: impl Into<Stem>) -> Self {
        Self {
            bubbles: false,
            ..Self::new(event_type)
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    /// The node the event was dispatched at.
    pub fn target(&self) -> Option<NodeId> {
        self.target.get()
    }

    /// The node whose listener is currently running.
    pub fn current_target(&self) -> Option<NodeId> {
        self.current_target.get()
    }

    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub(crate) fn set_target(&self, target: NodeId) {
        self.target.set(Some(target));
    }

    pub(crate) fn set_current_target(&self, node: Option<NodeId>) {
        self.current_target.set(node);
    }
}

impl Dom {
    /// Register a native listener. Registering the same listener twice for
    /// the same type is a no-op.
    pub fn add_event_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        listener: Listener,
    ) -> Result<(), DomError> {
        let elem = self.element_mut(node)?;
        if elem
            .listeners
            .iter()
            .any(|(t, l)| t == event_type && l.same_as(&listener))
        {
            return Ok(());
        }
        elem.listeners.push((Stem::from(event_type), listener));
        self.record(|| Mutation::AddListener {
            node,
            event_type: Stem::from(event_type),
        });
        Ok(())
    }

    /// Unregister a native listener previously added with the same arguments.
    pub fn remove_event_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        listener: &Listener,
    ) -> Result<(), DomError> {
        let elem = self.element_mut(node)?;
        let Some(pos) = elem
            .listeners
            .iter()
            .position(|(t, l)| t == event_type && l.same_as(listener))
        else {
            return Ok(());
        };
        elem.listeners.remove(pos);
        self.record(|| Mutation::RemoveListener {
            node,
            event_type: Stem::from(event_type),
        });
        Ok(())
    }

    /// Native listeners of `node`, in registration order.
    pub fn listeners(&self, node: NodeId) -> &[(Stem, Listener)] {
        self.element_data(node)
            .map(|elem| elem.listeners.as_slice())
            .unwrap_or_default()
    }

    /// Set the handler for `event_type` in the node's event record,
    /// registering the dispatcher the first time the type is bound.
    pub fn bind_event(
        &mut self,
        node: NodeId,
        event_type: &str,
        handler: impl Into<Handler>,
    ) -> Result<(), DomError> {
        let elem = self.element_mut(node)?;
        let previous = elem.events.insert(Stem::from(event_type), handler.into());
        if previous.is_none() {
            self.add_event_listener(node, event_type, Listener::Dispatcher)?;
        }
        Ok(())
    }

    /// Drop the record entry for `event_type` and its dispatcher.
    pub fn unbind_event(&mut self, node: NodeId, event_type: &str) -> Result<(), DomError> {
        if self.element_mut(node)?.events.remove(event_type).is_some() {
            self.remove_event_listener(node, event_type, &Listener::Dispatcher)?;
        }
        Ok(())
    }

    pub fn event_record(&self, node: NodeId) -> Option<&EventRecord> {
        self.element_data(node).map(|elem| &elem.events)
    }

    /// Dispatch `event` at `target`, then bubble it through the ancestors
    /// unless it does not bubble or propagation was stopped.
    ///
    /// Returns the event so callers can inspect `default_prevented`.
    pub fn dispatch_event(&self, target: NodeId, event: Event) -> Result<Event, DomError> {
        self.node(target)?;
        event.set_target(target);
        trace!(?target, event_type = event.event_type(), "dispatch");

        let path: Vec<NodeId> = if event.bubbles() {
            target.ancestors(&self.arena).collect()
        } else {
            vec![target]
        };

        for node in path {
            let Some(elem) = self.element_data(node) else {
                continue;
            };
            // Collected up front: handlers only see the event, never the tree
            let handlers: Vec<Handler> = elem
                .listeners
                .iter()
                .filter(|(t, _)| t == event.event_type())
                .filter_map(|(_, listener)| match listener {
                    Listener::Dispatcher => elem.events.get(event.event_type()).cloned(),
                    Listener::Native(handler) => Some(handler.clone()),
                })
                .collect();
            if handlers.is_empty() {
                continue;
            }
            event.set_current_target(Some(node));
            for handler in handlers {
                handler.call(&event);
            }
            if event.propagation_stopped() {
                break;
            }
        }

        event.set_current_target(None);
        Ok(event)
    }
}
