//! Fluent construction of detached element trees.
//!
//! This is the producer side of a morph: build the desired tree with
//! [`Dom::element`], then hand it to [`Dom::morph`]. Markers (`key`,
//! `keep`), event bindings and assigned properties are recorded exactly the
//! way the morph engine expects to find them.

use crate::events::Handler;
use crate::props::{DomProp, DomPropValue, LiveValue};
use crate::{Dom, DomError, Namespace, NodeId, Stem};

/// Builder returned by [`Dom::element`].
///
/// Errors are deferred: the first failing step is reported by
/// [`build`](ElementBuilder::build) and later steps are skipped.
#[must_use = "call .build() to get the element"]
pub struct ElementBuilder<'a> {
    dom: &'a mut Dom,
    node: NodeId,
    error: Option<DomError>,
}

impl Dom {
    /// Start building a detached HTML element.
    pub fn element(&mut self, tag: &str) -> ElementBuilder<'_> {
        self.element_ns(tag, Namespace::Html)
    }

    pub fn element_ns(&mut self, tag: &str, ns: Namespace) -> ElementBuilder<'_> {
        let node = self.create_element_ns(tag, ns);
        ElementBuilder {
            dom: self,
            node,
            error: None,
        }
    }
}

impl<'a> ElementBuilder<'a> {
    fn step(mut self, f: impl FnOnce(&mut Dom, NodeId) -> Result<(), DomError>) -> Self {
        if self.error.is_none()
            && let Err(err) = f(&mut *self.dom, self.node)
        {
            self.error = Some(err);
        }
        self
    }

    pub fn attr(self, name: &str, value: &str) -> Self {
        self.step(|dom, node| dom.set_attribute(node, name, value))
    }

    pub fn key(self, key: impl Into<Stem>) -> Self {
        let key = key.into();
        self.step(|dom, node| dom.set_key(node, Some(key)))
    }

    /// Mark the element as owned by someone else: once in the live tree,
    /// morphs never touch it.
    pub fn keep(self) -> Self {
        self.step(|dom, node| dom.set_keep(node, true))
    }

    /// Bind `handler` for `event_type` through the event record.
    pub fn on(self, event_type: &str, handler: impl Into<Handler>) -> Self {
        let handler = handler.into();
        self.step(|dom, node| dom.bind_event(node, event_type, handler))
    }

    /// Assign a live property and mirror it in the property record.
    pub fn prop(self, name: &str, value: LiveValue) -> Self {
        self.step(|dom, node| dom.assign_property(node, name, value))
    }

    pub fn value(self, value: &str) -> Self {
        self.dom_prop(DomProp::Value, value)
    }

    pub fn checked(self, checked: bool) -> Self {
        self.dom_prop(DomProp::Checked, checked)
    }

    pub fn selected(self, selected: bool) -> Self {
        self.dom_prop(DomProp::Selected, selected)
    }

    pub fn indeterminate(self, indeterminate: bool) -> Self {
        self.dom_prop(DomProp::Indeterminate, indeterminate)
    }

    pub fn dom_prop(self, prop: DomProp, value: impl Into<DomPropValue>) -> Self {
        let value = value.into();
        self.step(|dom, node| dom.set_dom_prop(node, prop, value))
    }

    /// Append an already-built node (element, text, comment or fragment).
    pub fn child(self, child: NodeId) -> Self {
        self.step(|dom, node| dom.append_child(node, child))
    }

    pub fn children(self, children: impl IntoIterator<Item = NodeId>) -> Self {
        children.into_iter().fold(self, ElementBuilder::child)
    }

    pub fn text(self, text: &str) -> Self {
        self.step(|dom, node| {
            let text = dom.text(text);
            dom.append_child(node, text)
        })
    }

    /// Replace the children with parsed markup and mark the element as
    /// carrying an HTML blob.
    pub fn inner_html(self, html: &str) -> Self {
        self.step(|dom, node| {
            dom.clear_children(node)?;
            for child in dom.parse_fragment(html) {
                dom.append_child(node, child)?;
            }
            dom.set_raw_html(node, true)
        })
    }

    /// The element being built, for callers that need it mid-build.
    pub fn id(&self) -> NodeId {
        self.node
    }

    pub fn build(self) -> Result<NodeId, DomError> {
        match self.error {
            None => Ok(self.node),
            Some(err) => {
                self.dom.dispose(self.node);
                Err(err)
            }
        }
    }
}
