use super::Morpher;
use crate::props::DomProp;
use crate::{DomError, NodeId};

#[allow(unused_imports)]
use crate::tracing_macros::trace;

impl Morpher<'_> {
    /// Copy the effective form state of `next` onto `old`.
    ///
    /// Attributes only seed these properties, so after user input the live
    /// value of `old` can disagree with every attribute in sight. Comparing
    /// effective values covers both the typed-into input and the attribute
    /// that changed underneath it.
    ///
    /// This runs before the children are morphed. For `<select>` and
    /// `<option>` the effective value of `old` is therefore read from its old
    /// options, and a difference pins `next`'s value as live state on `old`.
    /// That is intended: the pinned value equals what the new tree renders,
    /// and later morphs keep comparing against it.
    pub(crate) fn morph_dom_props(&mut self, old: NodeId, next: NodeId) -> Result<(), DomError> {
        for prop in DomProp::ALL {
            let Some(wanted) = self.dom.dom_prop(next, prop) else {
                continue;
            };
            let current = self.dom.dom_prop(old, prop);
            if current.as_ref() != Some(&wanted) {
                trace!(?old, prop = prop.name(), "set dom prop");
                self.dom.set_dom_prop(old, prop, wanted)?;
            }
        }
        Ok(())
    }
}
