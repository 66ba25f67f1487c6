use super::Morpher;
use crate::events::{EventRecord, Listener};
use crate::{DomError, NodeId, Stem};

#[allow(unused_imports)]
use crate::tracing_macros::trace;

impl Morpher<'_> {
    /// Reconcile the event record of `old` with that of `next`.
    ///
    /// Only the dispatcher registration changes natively, and only for event
    /// types that appear or disappear. Swapping the handler of a type that
    /// is bound on both sides is just a record update.
    pub(crate) fn morph_events(&mut self, old: NodeId, next: NodeId) -> Result<(), DomError> {
        let (Some(old_elem), Some(next_elem)) =
            (self.dom.element_data(old), self.dom.element_data(next))
        else {
            return Err(DomError::NotAnElement);
        };
        if old_elem.events.is_empty() && next_elem.events.is_empty() {
            return Ok(());
        }

        let record: EventRecord = next_elem.events.clone();
        let dropped: Vec<Stem> = old_elem
            .events
            .types()
            .filter(|t| !record.contains(t))
            .cloned()
            .collect();
        let added: Vec<Stem> = record
            .types()
            .filter(|t| !old_elem.events.contains(t))
            .cloned()
            .collect();

        for event_type in &dropped {
            trace!(?old, %event_type, "unbind");
            self.dom
                .remove_event_listener(old, event_type, &Listener::Dispatcher)?;
        }
        self.dom.element_mut(old)?.events = record;
        for event_type in &added {
            trace!(?old, %event_type, "bind");
            self.dom
                .add_event_listener(old, event_type, Listener::Dispatcher)?;
        }
        Ok(())
    }
}
