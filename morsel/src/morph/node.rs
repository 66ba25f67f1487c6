//! Patching one matched pair of nodes.

use super::Morpher;
use crate::dom::NodeKind;
use crate::{DomError, NodeId};

#[allow(unused_imports)]
use crate::tracing_macros::{debug, trace};

impl Morpher<'_> {
    /// Bring `old` in line with `next`, keeping `old`'s identity.
    ///
    /// `old` and `next` must be compatible (same node kind, same tag for
    /// elements); the children reconciler only pairs compatible nodes.
    pub(crate) fn morph_node(&mut self, old: NodeId, next: NodeId) -> Result<(), DomError> {
        if old == next {
            return Ok(());
        }

        match &self.dom.node(next)?.kind {
            NodeKind::Text(text) | NodeKind::Comment(text) => {
                if self.dom.text_data(old) != Some(text.as_str()) {
                    let text = text.clone();
                    self.dom.set_text(old, &text)?;
                }
                Ok(())
            }
            NodeKind::Element(_) => self.morph_element(old, next),
            NodeKind::Document | NodeKind::Fragment => Ok(()),
        }
    }

    fn morph_element(&mut self, old: NodeId, next: NodeId) -> Result<(), DomError> {
        self.morph_attributes(old, next)?;
        self.morph_events(old, next)?;
        self.morph_dom_props(old, next)?;
        self.morph_js_props(old, next)?;
        self.sync_markers(old, next)?;

        if self.dom.is_raw_html(next) {
            return self.replace_raw_html(old, next);
        }
        if self.dom.is_self_managed(old) {
            trace!(?old, "self-managed, children left alone");
            return Ok(());
        }

        let children = self.dom.child_ids(next);
        self.depth += 1;
        let result = self.morph_children(old, &children);
        self.depth -= 1;
        result
    }

    fn sync_markers(&mut self, old: NodeId, next: NodeId) -> Result<(), DomError> {
        let key = self.dom.key(next).cloned();
        let keep = self.dom.is_keep(next);
        let raw_html = self.dom.is_raw_html(next);
        self.dom.set_key(old, key)?;
        self.dom.set_keep(old, keep)?;
        self.dom.set_raw_html(old, raw_html)
    }

    /// Swap in `next`'s children wholesale when the markup differs.
    fn replace_raw_html(&mut self, old: NodeId, next: NodeId) -> Result<(), DomError> {
        if self.dom.inner_html(old) == self.dom.inner_html(next) {
            return Ok(());
        }
        debug!(?old, "raw html changed, replacing children");
        self.dom.clear_children(old)?;
        for child in self.dom.child_ids(next) {
            self.dom.append_child(old, child)?;
        }
        Ok(())
    }
}
