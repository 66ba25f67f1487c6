//! Journal of applied DOM mutations.
//!
//! Recording is off by default. Call [`Dom::observe`](crate::Dom::observe) to
//! start and [`Dom::take_records`](crate::Dom::take_records) to drain. The
//! journal is purely an observer: every entry describes a change that has
//! already been made to the arena.

use crate::{DomProp, LocalName, NodeId, Stem};

/// A single change made to the live tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// `node` was inserted under `parent` (covers moves of attached nodes).
    Insert { parent: NodeId, node: NodeId },
    /// `node` was removed from `parent` and freed.
    Remove { parent: NodeId, node: NodeId },
    /// Text or comment data changed.
    SetText { node: NodeId },
    SetAttribute { node: NodeId, name: LocalName },
    RemoveAttribute { node: NodeId, name: LocalName },
    AddListener { node: NodeId, event_type: Stem },
    RemoveListener { node: NodeId, event_type: Stem },
    SetDomProp { node: NodeId, prop: DomProp },
    SetProperty { node: NodeId, name: Stem },
    RemoveProperty { node: NodeId, name: Stem },
}

impl Mutation {
    /// The node the mutation was applied to (the child for tree mutations).
    pub fn node(&self) -> NodeId {
        match self {
            Mutation::Insert { node, .. }
            | Mutation::Remove { node, .. }
            | Mutation::SetText { node }
            | Mutation::SetAttribute { node, .. }
            | Mutation::RemoveAttribute { node, .. }
            | Mutation::AddListener { node, .. }
            | Mutation::RemoveListener { node, .. }
            | Mutation::SetDomProp { node, .. }
            | Mutation::SetProperty { node, .. }
            | Mutation::RemoveProperty { node, .. } => *node,
        }
    }

    pub fn is_structural(&self) -> bool {
        matches!(self, Mutation::Insert { .. } | Mutation::Remove { .. })
    }

    pub fn is_attribute(&self) -> bool {
        matches!(
            self,
            Mutation::SetAttribute { .. } | Mutation::RemoveAttribute { .. }
        )
    }

    pub fn is_listener(&self) -> bool {
        matches!(
            self,
            Mutation::AddListener { .. } | Mutation::RemoveListener { .. }
        )
    }

    pub fn is_property(&self) -> bool {
        matches!(
            self,
            Mutation::SetDomProp { .. }
                | Mutation::SetProperty { .. }
                | Mutation::RemoveProperty { .. }
        )
    }
}
