//! In-place reconciliation of a live subtree against a freshly built one.
//!
//! The morph walks both trees one level at a time. At each level the
//! [children reconciler](children) pairs new children with existing ones (by
//! key first, then by position), and every matched pair goes through the
//! [node patcher](node), which runs the four differs:
//!
//! 1. [attributes](attrs)
//! 2. [event handlers](events)
//! 3. [form properties](dom_props)
//! 4. [assigned properties](js_props)
//!
//! and then recurses into the pair's children. Mutations are applied as soon
//! as they are decided; there is no intermediate patch list.
//!
//! Matched nodes keep their [`NodeId`], so everything attached to a node
//! (native listeners, live property values, focus, scroll offsets) survives.

mod attrs;
mod children;
mod dom_props;
mod events;
mod js_props;
mod node;

use crate::{Dom, DomError, NodeId};

#[allow(unused_imports)]
use crate::tracing_macros::{debug, trace};

/// Knobs for a single morph.
#[derive(Clone, Debug)]
pub struct MorphOptions {
    /// Deepest level below the root that gets reconciled (the root's own
    /// children are level 1). Deeper levels are left as they are and an
    /// error is logged. `None` means unlimited.
    pub depth_limit: Option<usize>,

    /// Free whatever remains of the new tree after the morph (default: true).
    pub dispose_new_tree: bool,
}

impl Default for MorphOptions {
    fn default() -> Self {
        Self {
            depth_limit: None,
            dispose_new_tree: true,
        }
    }
}

impl MorphOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth_limit(mut self, limit: usize) -> Self {
        self.depth_limit = Some(limit);
        self
    }

    /// Leave the unused parts of the new tree allocated.
    pub fn keep_new_tree(mut self) -> Self {
        self.dispose_new_tree = false;
        self
    }
}

/// The desired content of the morph root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NewTree {
    /// A single node. A fragment stands for its children.
    Node(NodeId),
    /// An ordered list of nodes. Fragments in the list are flattened.
    Nodes(Vec<NodeId>),
}

impl From<NodeId> for NewTree {
    fn from(node: NodeId) -> Self {
        NewTree::Node(node)
    }
}

impl From<Vec<NodeId>> for NewTree {
    fn from(nodes: Vec<NodeId>) -> Self {
        NewTree::Nodes(nodes)
    }
}

impl From<&[NodeId]> for NewTree {
    fn from(nodes: &[NodeId]) -> Self {
        NewTree::Nodes(nodes.to_vec())
    }
}

impl<const N: usize> From<[NodeId; N]> for NewTree {
    fn from(nodes: [NodeId; N]) -> Self {
        NewTree::Nodes(nodes.to_vec())
    }
}

/// Morph the children of `root` to match `new_tree`, with default options.
pub fn morph(dom: &mut Dom, root: NodeId, new_tree: impl Into<NewTree>) -> Result<(), DomError> {
    morph_with(dom, root, new_tree, &MorphOptions::default())
}

/// Morph the children of `root` to match `new_tree`.
///
/// Only failures of the underlying DOM operations are reported (a removed
/// `root`, a `root` that cannot have children, a new tree containing an
/// ancestor of `root`). Mismatches between the trees are resolved by
/// inserting and removing nodes, never by failing.
pub fn morph_with(
    dom: &mut Dom,
    root: NodeId,
    new_tree: impl Into<NewTree>,
    options: &MorphOptions,
) -> Result<(), DomError> {
    if !dom.node(root)?.kind.is_container() {
        return Err(DomError::NotAContainer);
    }

    let nodes = match new_tree.into() {
        NewTree::Node(node) => vec![node],
        NewTree::Nodes(nodes) => nodes,
    };
    // Fragments stand for their children, wherever they appear in the list
    let mut new_children = Vec::with_capacity(nodes.len());
    let mut fragments = Vec::new();
    for node in nodes {
        dom.node(node)?;
        if dom.is_fragment(node) {
            new_children.extend(dom.children(node));
            fragments.push(node);
        } else {
            new_children.push(node);
        }
    }
    debug!(?root, count = new_children.len(), "morph");

    let result = Morpher {
        dom: &mut *dom,
        options,
        depth: 1,
    }
    .morph_children(root, &new_children);

    if options.dispose_new_tree {
        // Whatever did not end up in the root's tree is garbage now
        let live_root = dom.tree_root(root);
        for node in new_children.into_iter().chain(fragments) {
            if !dom.is_removed(node) && dom.tree_root(node) != live_root {
                dom.dispose(node);
            }
        }
    }

    result
}

impl Dom {
    /// Morph the children of `root` to match `new_tree`, with default options.
    pub fn morph(&mut self, root: NodeId, new_tree: impl Into<NewTree>) -> Result<(), DomError> {
        morph(self, root, new_tree)
    }

    pub fn morph_with(
        &mut self,
        root: NodeId,
        new_tree: impl Into<NewTree>,
        options: &MorphOptions,
    ) -> Result<(), DomError> {
        morph_with(self, root, new_tree, options)
    }
}

/// State carried through one morph call.
pub(crate) struct Morpher<'a> {
    pub(crate) dom: &'a mut Dom,
    pub(crate) options: &'a MorphOptions,
    /// Level of the children currently being reconciled (root's children: 1)
    pub(crate) depth: usize,
}
