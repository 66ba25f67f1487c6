use super::Morpher;
use crate::props::{LiveValue, PropRecord};
use crate::{DomError, NodeId, Stem};

#[allow(unused_imports)]
use crate::tracing_macros::trace;

impl Morpher<'_> {
    /// Reconcile properties assigned by the producer.
    ///
    /// Only names in a property record are ever touched; properties set on
    /// the live node by anyone else are left as they are. Values are
    /// compared by identity, so re-assigning the same object is free.
    pub(crate) fn morph_js_props(&mut self, old: NodeId, next: NodeId) -> Result<(), DomError> {
        let (Some(old_elem), Some(next_elem)) =
            (self.dom.element_data(old), self.dom.element_data(next))
        else {
            return Err(DomError::NotAnElement);
        };
        if old_elem.props.is_empty() && next_elem.props.is_empty() {
            return Ok(());
        }

        let record: PropRecord = next_elem.props.clone();
        let dropped: Vec<Stem> = old_elem
            .props
            .names()
            .filter(|name| !record.contains(name))
            .cloned()
            .collect();
        let assigned: Vec<(Stem, LiveValue)> = record
            .iter()
            .filter(|(name, value)| {
                !old_elem
                    .properties
                    .get(name.as_str())
                    .is_some_and(|current| current.ptr_eq(value))
            })
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        for name in &dropped {
            trace!(?old, %name, "remove property");
            self.dom.remove_property(old, name)?;
        }
        for (name, value) in assigned {
            trace!(?old, %name, "set property");
            self.dom.set_property(old, &name, value)?;
        }
        self.dom.element_mut(old)?.props = record;
        Ok(())
    }
}
