//! Child-list reconciliation for one level of the tree.

use super::Morpher;
use crate::dom::NodeKind;
use crate::{DomError, NodeId, Stem};
use rapidhash::{RapidHashMap as HashMap, RapidHashSet as HashSet};

#[allow(unused_imports)]
use crate::tracing_macros::{debug, error, trace};

impl Morpher<'_> {
    /// Make the children of `parent` match `new_children`.
    ///
    /// Keyed old children are claimed by the last new child carrying the same
    /// key. Everything else is paired by position, skipping keep-marked
    /// children and keyed children that are still waiting to be claimed.
    /// Old children left unpaired are removed, unless keep-marked.
    pub(crate) fn morph_children(
        &mut self,
        parent: NodeId,
        new_children: &[NodeId],
    ) -> Result<(), DomError> {
        if let Some(limit) = self.options.depth_limit
            && self.depth > limit
        {
            error!(?parent, limit, "depth limit reached, children left as they are");
            return Ok(());
        }
        debug!(?parent, depth = self.depth, count = new_children.len(), "morph children");

        // Keyed old children; with duplicates the last one wins
        let mut keyed: HashMap<Stem, NodeId> = HashMap::default();
        let mut has_keep = false;
        for child in self.dom.children(parent) {
            if let Some(elem) = self.dom.element_data(child) {
                has_keep |= elem.keep;
                if let Some(key) = &elem.key {
                    keyed.insert(key.clone(), child);
                }
            }
        }

        // Only the last new child with a given key may claim it
        let mut last_by_key: HashMap<Stem, usize> = HashMap::default();
        for (index, &next) in new_children.iter().enumerate() {
            if let Some(key) = self.dom.key(next) {
                last_by_key.insert(key.clone(), index);
            }
        }

        let mut retained: HashSet<NodeId> = HashSet::default();
        let mut cursor = self.dom.first_child(parent);

        for (index, &next) in new_children.iter().enumerate() {
            if let Some(old) = self.claim_keyed(&mut keyed, &last_by_key, index, next) {
                retained.insert(old);
                if cursor == Some(old) {
                    cursor = self.dom.next_sibling(old);
                } else if !self.dom.is_keep(old) {
                    self.dom.insert_before(parent, old, cursor)?;
                }
                if self.dom.is_keep(old) {
                    trace!(?old, "claimed keep node, left untouched");
                } else {
                    trace!(?old, ?next, "keyed match");
                    self.morph_node(old, next)?;
                }
                continue;
            }

            if has_keep
                && self.dom.is_keep(next)
                && let Some(old) = self.find_unkeyed_keep(cursor, &keyed, &retained, next)
            {
                trace!(?old, ?next, "keep node stands in");
                retained.insert(old);
                cursor = self.dom.next_sibling(old);
                continue;
            }

            cursor = self.skip_reserved(cursor, &keyed, has_keep);
            match cursor {
                None => {
                    trace!(?next, "append");
                    self.dom.append_child(parent, next)?;
                    retained.insert(next);
                }
                Some(old) if self.compatible(old, next) => {
                    trace!(?old, ?next, "positional match");
                    retained.insert(old);
                    cursor = self.dom.next_sibling(old);
                    self.morph_node(old, next)?;
                }
                Some(old) => {
                    trace!(?old, ?next, "incompatible, inserting before");
                    self.dom.insert_before(parent, next, Some(old))?;
                    retained.insert(next);
                }
            }
        }

        for child in self.dom.child_ids(parent) {
            if !retained.contains(&child) && !self.dom.is_keep(child) {
                trace!(?child, "remove");
                self.dom.remove_child(parent, child)?;
            }
        }

        Ok(())
    }

    /// Take the old child keyed like `next`, if `next` is entitled to it.
    fn claim_keyed(
        &self,
        keyed: &mut HashMap<Stem, NodeId>,
        last_by_key: &HashMap<Stem, usize>,
        index: usize,
        next: NodeId,
    ) -> Option<NodeId> {
        let key = self.dom.key(next)?;
        if last_by_key.get(key) != Some(&index) {
            return None;
        }
        let &old = keyed.get(key)?;
        if !self.dom.is_keep(old) && !self.compatible(old, next) {
            // Same key on a different element type: leave it to be swept
            debug!(?old, ?next, %key, "keyed element changed type");
            return None;
        }
        keyed.remove(key);
        Some(old)
    }

    /// Advance past children positional matching must not take.
    fn skip_reserved(
        &self,
        mut cursor: Option<NodeId>,
        keyed: &HashMap<Stem, NodeId>,
        has_keep: bool,
    ) -> Option<NodeId> {
        while let Some(old) = cursor {
            let keep = has_keep && self.dom.is_keep(old);
            let reserved = self
                .dom
                .key(old)
                .is_some_and(|key| keyed.get(key) == Some(&old));
            if !keep && !reserved {
                break;
            }
            cursor = self.dom.next_sibling(old);
        }
        cursor
    }

    /// Among the children positional matching would skip from `cursor`, find
    /// an unkeyed keep node of the same type as `next` to stand in for it.
    fn find_unkeyed_keep(
        &self,
        mut cursor: Option<NodeId>,
        keyed: &HashMap<Stem, NodeId>,
        retained: &HashSet<NodeId>,
        next: NodeId,
    ) -> Option<NodeId> {
        while let Some(old) = cursor {
            if self.dom.is_keep(old) {
                if self.dom.key(old).is_none()
                    && !retained.contains(&old)
                    && self.compatible(old, next)
                {
                    return Some(old);
                }
            } else if !self
                .dom
                .key(old)
                .is_some_and(|key| keyed.get(key) == Some(&old))
            {
                return None;
            }
            cursor = self.dom.next_sibling(old);
        }
        None
    }

    /// Whether `next` can be patched into `old` instead of replacing it.
    fn compatible(&self, old: NodeId, next: NodeId) -> bool {
        if old == next {
            return true;
        }
        let (Some(a), Some(b)) = (self.dom.get(old), self.dom.get(next)) else {
            return false;
        };
        match (&a.kind, &b.kind) {
            (NodeKind::Element(x), NodeKind::Element(y)) => x.tag == y.tag && a.ns == b.ns,
            (NodeKind::Text(_), NodeKind::Text(_)) => true,
            (NodeKind::Comment(_), NodeKind::Comment(_)) => true,
            _ => false,
        }
    }
}
