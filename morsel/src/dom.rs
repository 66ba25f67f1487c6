//! Arena-based live DOM.
//!
//! All nodes, live and freshly built, live in one indextree [`Arena`]. A
//! [`NodeId`] is the node's identity: the morph engine preserves a node by
//! keeping its `NodeId` in place, and frees nodes it discards. Per-node
//! bookkeeping (event record, property record, markers) sits in the arena
//! slot next to the node's data, so it goes away with the node.
//!
//! Every mutator returns `Result<_, DomError>` and, when [`Dom::observe`] is
//! on, appends a [`Mutation`] to the journal.

use crate::events::{EventRecord, Listener};
use crate::props::{LiveValue, PropRecord};
use crate::{DomError, LocalName, Mutation, Stem};
use facet::Facet;
use indexmap::IndexMap;
use indextree::{Arena, NodeId};
use rapidhash::RapidHashSet as HashSet;
use smallvec::SmallVec;

#[allow(unused_imports)]
use crate::tracing_macros::{debug, trace};

/// The live tree plus everything registered against it.
#[derive(Debug, Clone)]
pub struct Dom {
    /// THE tree - all nodes live here
    pub(crate) arena: Arena<NodeData>,

    /// Document node (parent of `<html>`)
    pub(crate) document: NodeId,

    /// DOCTYPE if present (usually "html")
    pub(crate) doctype: Option<Stem>,

    /// Tags whose elements manage their own children
    pub(crate) self_managed: HashSet<LocalName>,

    pub(crate) active_element: Option<NodeId>,

    /// `Some` while observing
    pub(crate) journal: Option<Vec<Mutation>>,
}

/// What goes in each arena slot
#[derive(Debug, Clone)]
pub struct NodeData {
    pub kind: NodeKind,
    pub ns: Namespace,
}

/// Node types
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Document root (invisible, parent of `<html>`)
    Document,
    /// Detached container whose children move out when it is inserted
    Fragment,
    /// Element with tag, attributes, markers and live state
    Element(ElementData),
    /// Text content
    Text(Stem),
    /// HTML comment
    Comment(Stem),
}

impl NodeKind {
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            NodeKind::Document | NodeKind::Fragment | NodeKind::Element(_)
        )
    }
}

/// Element data: rendered state, producer markers, and live-only state.
#[derive(Debug, Clone)]
pub struct ElementData {
    pub tag: LocalName,

    /// IndexMap preserves insertion order for consistent serialization
    pub attrs: IndexMap<LocalName, Stem>,

    /// Identity key, unique among siblings
    pub key: Option<Stem>,

    /// Never diffed, moved for matching, or removed by morph
    pub keep: bool,

    /// Children were injected as an HTML blob
    pub raw_html: bool,

    /// Natively registered listeners, in registration order
    pub listeners: SmallVec<[(Stem, Listener); 2]>,

    /// Event type -> current handler, read by [`Listener::Dispatcher`]
    pub events: EventRecord,

    pub live: LiveState,

    /// Live property bag, including properties set outside the record
    pub properties: IndexMap<Stem, LiveValue>,

    /// Properties the producer assigned, mirrored for the differ
    pub props: PropRecord,
}

impl ElementData {
    pub fn new(tag: LocalName) -> Self {
        Self {
            tag,
            attrs: IndexMap::new(),
            key: None,
            keep: false,
            raw_html: false,
            listeners: SmallVec::new(),
            events: EventRecord::new(),
            live: LiveState::default(),
            properties: IndexMap::new(),
            props: PropRecord::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&Stem> {
        self.attrs.get(&LocalName::from(name))
    }
}

/// Live-only element state.
///
/// `None` means the property was never written and still reflects its
/// attribute (or content, for `<textarea>`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveState {
    pub value: Option<Stem>,
    pub checked: Option<bool>,
    pub selected: Option<bool>,
    pub indeterminate: bool,
    pub scroll_top: i32,
    pub scroll_left: i32,
}

/// XML namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Facet)]
#[repr(u8)]
pub enum Namespace {
    #[default]
    Html,
    Svg,
    MathMl,
}

impl Namespace {
    pub fn from_url(url: &str) -> Self {
        match url {
            "http://www.w3.org/1999/xhtml" => Namespace::Html,
            "http://www.w3.org/2000/svg" => Namespace::Svg,
            "http://www.w3.org/1998/Math/MathML" => Namespace::MathMl,
            _ => Namespace::Html, // default
        }
    }

    pub fn url(&self) -> &'static str {
        match self {
            Namespace::Html => "http://www.w3.org/1999/xhtml",
            Namespace::Svg => "http://www.w3.org/2000/svg",
            Namespace::MathMl => "http://www.w3.org/1998/Math/MathML",
        }
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    /// An empty document: a document node and nothing else.
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let document = arena.new_node(NodeData {
            kind: NodeKind::Document,
            ns: Namespace::Html,
        });
        Self::from_parts(arena, document, None)
    }

    pub(crate) fn from_parts(
        arena: Arena<NodeData>,
        document: NodeId,
        doctype: Option<Stem>,
    ) -> Self {
        Self {
            arena,
            document,
            doctype,
            self_managed: HashSet::default(),
            active_element: None,
            journal: None,
        }
    }

    pub fn document(&self) -> NodeId {
        self.document
    }

    pub fn doctype(&self) -> Option<&str> {
        self.doctype.as_deref()
    }

    /// The `<html>` element if present
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(self.document)
            .find(|&id| self.has_tag(id, "html"))
    }

    /// Get the `<body>` element if present
    pub fn body(&self) -> Option<NodeId> {
        let html = self.document_element()?;
        self.children(html).find(|&id| self.has_tag(id, "body"))
    }

    /// Get the `<head>` element if present
    pub fn head(&self) -> Option<NodeId> {
        let html = self.document_element()?;
        self.children(html).find(|&id| self.has_tag(id, "head"))
    }

    /// Number of allocated slots, including freed ones awaiting reuse.
    pub fn arena_len(&self) -> usize {
        self.arena.count()
    }

    // ------------------------------------------------------------------
    // Node access
    // ------------------------------------------------------------------

    /// Get node data, or `None` if the node has been removed.
    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        if id.is_removed(&self.arena) {
            None
        } else {
            Some(self.arena[id].get())
        }
    }

    pub(crate) fn node(&self, id: NodeId) -> Result<&NodeData, DomError> {
        self.get(id).ok_or(DomError::Removed)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData, DomError> {
        if id.is_removed(&self.arena) {
            return Err(DomError::Removed);
        }
        Ok(self.arena[id].get_mut())
    }

    pub fn is_removed(&self, id: NodeId) -> bool {
        id.is_removed(&self.arena)
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.get(id).map(|node| &node.kind)
    }

    pub fn element_data(&self, id: NodeId) -> Option<&ElementData> {
        match self.kind(id) {
            Some(NodeKind::Element(elem)) => Some(elem),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData, DomError> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Element(elem) => Ok(elem),
            _ => Err(DomError::NotAnElement),
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element_data(id).is_some()
    }

    pub fn is_fragment(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Fragment))
    }

    pub fn tag(&self, id: NodeId) -> Option<&LocalName> {
        self.element_data(id).map(|elem| &elem.tag)
    }

    fn has_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tag(id).is_some_and(|t| &**t == tag)
    }

    pub fn namespace(&self, id: NodeId) -> Option<Namespace> {
        self.get(id).map(|node| node.ns)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?;
        self.arena[id].parent()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?;
        self.arena[id].first_child()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?;
        self.arena[id].last_child()
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?;
        self.arena[id].next_sibling()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?;
        self.arena[id].previous_sibling()
    }

    /// Iterate children of a node (empty if the node was removed)
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let live = !id.is_removed(&self.arena);
        id.children(&self.arena).take_while(move |_| live)
    }

    pub fn child_ids(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).collect()
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).count()
    }

    /// Whether `node` is `ancestor` or one of its descendants.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        if self.get(node).is_none() || self.get(ancestor).is_none() {
            return false;
        }
        node.ancestors(&self.arena).any(|a| a == ancestor)
    }

    /// The topmost ancestor of `node` (the document for attached nodes).
    pub fn tree_root(&self, node: NodeId) -> Option<NodeId> {
        self.get(node)?;
        node.ancestors(&self.arena).last()
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        self.tree_root(node) == Some(self.document)
    }

    // ------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.create_element_ns(tag, Namespace::Html)
    }

    pub fn create_element_ns(&mut self, tag: &str, ns: Namespace) -> NodeId {
        self.arena.new_node(NodeData {
            kind: NodeKind::Element(ElementData::new(LocalName::from(tag))),
            ns,
        })
    }

    pub fn text(&mut self, text: &str) -> NodeId {
        self.arena.new_node(NodeData {
            kind: NodeKind::Text(Stem::from(text)),
            ns: Namespace::Html,
        })
    }

    pub fn comment(&mut self, text: &str) -> NodeId {
        self.arena.new_node(NodeData {
            kind: NodeKind::Comment(Stem::from(text)),
            ns: Namespace::Html,
        })
    }

    /// An empty fragment. Inserting it moves its children instead.
    pub fn fragment(&mut self) -> NodeId {
        self.arena.new_node(NodeData {
            kind: NodeKind::Fragment,
            ns: Namespace::Html,
        })
    }

    // ------------------------------------------------------------------
    // Tree mutation
    // ------------------------------------------------------------------

    pub fn append_child(&mut self, parent: NodeId, node: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, node, None)
    }

    /// Insert `node` under `parent` before `reference` (append if `None`).
    ///
    /// An attached `node` is moved. A fragment contributes its children.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        if !self.node(parent)?.kind.is_container() {
            return Err(DomError::NotAContainer);
        }
        match self.node(node)?.kind {
            NodeKind::Document => return Err(DomError::HierarchyRequest),
            NodeKind::Fragment => {
                for child in self.child_ids(node) {
                    self.insert_before(parent, child, reference)?;
                }
                return Ok(());
            }
            _ => {}
        }
        if self.contains(node, parent) {
            return Err(DomError::HierarchyRequest);
        }

        match reference {
            Some(reference) if reference == node => return Ok(()),
            Some(reference) => {
                if self.parent(reference) != Some(parent) {
                    return Err(DomError::NotAChild);
                }
                reference.checked_insert_before(node, &mut self.arena)?;
            }
            None => parent.checked_append(node, &mut self.arena)?,
        }

        self.record(|| Mutation::Insert { parent, node });
        Ok(())
    }

    /// Remove `node` from `parent` and free its whole subtree.
    pub fn remove_child(&mut self, parent: NodeId, node: NodeId) -> Result<(), DomError> {
        self.node(node)?;
        if self.parent(node) != Some(parent) {
            return Err(DomError::NotAChild);
        }
        node.detach(&mut self.arena);
        self.record(|| Mutation::Remove { parent, node });
        self.free(node);
        Ok(())
    }

    /// Remove every child of `parent`.
    pub fn clear_children(&mut self, parent: NodeId) -> Result<(), DomError> {
        for child in self.child_ids(parent) {
            self.remove_child(parent, child)?;
        }
        Ok(())
    }

    /// Free a node and its descendants from the arena.
    ///
    /// Used for nodes that are not (or no longer) part of the live tree.
    pub fn dispose(&mut self, node: NodeId) {
        if !self.is_removed(node) {
            self.free(node);
        }
    }

    fn free(&mut self, node: NodeId) {
        if let Some(active) = self.active_element
            && self.contains(node, active)
        {
            debug!(?active, "focused node removed, focus lost");
            self.active_element = None;
        }
        node.remove_subtree(&mut self.arena);
    }

    // ------------------------------------------------------------------
    // Character data
    // ------------------------------------------------------------------

    /// Text of a text or comment node.
    pub fn text_data(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Text(text) | NodeKind::Comment(text) => Some(text),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) -> Result<(), DomError> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Text(data) | NodeKind::Comment(data) => *data = Stem::from(text),
            _ => return Err(DomError::NotCharacterData),
        }
        self.record(|| Mutation::SetText { node: id });
        Ok(())
    }

    /// Concatenated text of `id` and its descendants (comments excluded).
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(NodeKind::Comment(text)) = self.kind(id) {
            out.push_str(text);
            return out;
        }
        if self.get(id).is_none() {
            return out;
        }
        for node in id.descendants(&self.arena) {
            if let NodeKind::Text(text) = &self.arena[node].get().kind {
                out.push_str(text);
            }
        }
        out
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element_data(id)?.attr(name).map(|v| v.as_str())
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    pub fn attributes(&self, id: NodeId) -> impl Iterator<Item = (&LocalName, &Stem)> {
        self.element_data(id).into_iter().flat_map(|elem| elem.attrs.iter())
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let name = LocalName::from(name);
        self.element_mut(id)?
            .attrs
            .insert(name.clone(), Stem::from(value));
        self.record(|| Mutation::SetAttribute { node: id, name });
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<(), DomError> {
        let name = LocalName::from(name);
        if self.element_mut(id)?.attrs.shift_remove(&name).is_some() {
            self.record(|| Mutation::RemoveAttribute { node: id, name });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Producer markers
    // ------------------------------------------------------------------

    pub fn key(&self, id: NodeId) -> Option<&Stem> {
        self.element_data(id)?.key.as_ref()
    }

    pub fn set_key(&mut self, id: NodeId, key: Option<Stem>) -> Result<(), DomError> {
        self.element_mut(id)?.key = key;
        Ok(())
    }

    pub fn is_keep(&self, id: NodeId) -> bool {
        self.element_data(id).is_some_and(|elem| elem.keep)
    }

    pub fn set_keep(&mut self, id: NodeId, keep: bool) -> Result<(), DomError> {
        self.element_mut(id)?.keep = keep;
        Ok(())
    }

    pub fn is_raw_html(&self, id: NodeId) -> bool {
        self.element_data(id).is_some_and(|elem| elem.raw_html)
    }

    pub fn set_raw_html(&mut self, id: NodeId, raw_html: bool) -> Result<(), DomError> {
        self.element_mut(id)?.raw_html = raw_html;
        Ok(())
    }

    /// Declare that elements with `tag` manage their own children.
    ///
    /// The morph engine still patches their attributes and properties but
    /// never reconciles their children.
    pub fn define_self_managed(&mut self, tag: &str) {
        self.self_managed.insert(LocalName::from(tag));
    }

    pub fn is_self_managed(&self, id: NodeId) -> bool {
        self.tag(id)
            .is_some_and(|tag| self.self_managed.contains(tag))
    }

    // ------------------------------------------------------------------
    // Focus & scroll
    // ------------------------------------------------------------------

    pub fn focus(&mut self, id: NodeId) -> Result<(), DomError> {
        if !self.is_element(id) {
            return Err(DomError::NotAnElement);
        }
        self.active_element = Some(id);
        Ok(())
    }

    pub fn blur(&mut self) {
        self.active_element = None;
    }

    pub fn active_element(&self) -> Option<NodeId> {
        self.active_element.filter(|&id| !self.is_removed(id))
    }

    pub fn scroll_position(&self, id: NodeId) -> Option<(i32, i32)> {
        self.element_data(id)
            .map(|elem| (elem.live.scroll_top, elem.live.scroll_left))
    }

    pub fn set_scroll_position(&mut self, id: NodeId, top: i32, left: i32) -> Result<(), DomError> {
        let live = &mut self.element_mut(id)?.live;
        live.scroll_top = top;
        live.scroll_left = left;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Mutation journal
    // ------------------------------------------------------------------

    /// Start recording mutations. Already-recorded entries are kept.
    pub fn observe(&mut self) {
        self.journal.get_or_insert_with(Vec::new);
    }

    /// Stop recording and drop anything not yet taken.
    pub fn disconnect(&mut self) {
        self.journal = None;
    }

    /// Drain the recorded mutations (empty when not observing).
    pub fn take_records(&mut self) -> Vec<Mutation> {
        self.journal.as_mut().map(std::mem::take).unwrap_or_default()
    }

    pub(crate) fn record(&mut self, mutation: impl FnOnce() -> Mutation) {
        if let Some(journal) = &mut self.journal {
            let mutation = mutation();
            trace!(?mutation, "recorded");
            journal.push(mutation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_dom() -> (Dom, NodeId) {
        let mut dom = Dom::new();
        let html = dom.create_element("html");
        let body = dom.create_element("body");
        dom.append_child(dom.document(), html).unwrap();
        dom.append_child(html, body).unwrap();
        (dom, body)
    }

    #[test]
    fn test_body_lookup() {
        let (dom, body) = body_dom();
        assert_eq!(dom.body(), Some(body));
        assert_eq!(dom.head(), None);
        assert!(dom.is_connected(body));
    }

    #[test]
    fn test_insert_before_moves_attached_node() {
        let (mut dom, body) = body_dom();
        let a = dom.create_element("a");
        let b = dom.create_element("b");
        dom.append_child(body, a).unwrap();
        dom.append_child(body, b).unwrap();

        dom.insert_before(body, b, Some(a)).unwrap();
        assert_eq!(dom.child_ids(body), vec![b, a]);
    }

    #[test]
    fn test_insert_fragment_moves_children() {
        let (mut dom, body) = body_dom();
        let frag = dom.fragment();
        let one = dom.text("one");
        let two = dom.text("two");
        dom.append_child(frag, one).unwrap();
        dom.append_child(frag, two).unwrap();

        dom.append_child(body, frag).unwrap();
        assert_eq!(dom.child_ids(body), vec![one, two]);
        assert_eq!(dom.child_count(frag), 0);
    }

    #[test]
    fn test_insert_into_descendant_is_rejected() {
        let (mut dom, body) = body_dom();
        let div = dom.create_element("div");
        dom.append_child(body, div).unwrap();
        assert_eq!(
            dom.append_child(div, body),
            Err(DomError::HierarchyRequest)
        );
    }

    #[test]
    fn test_text_cannot_have_children() {
        let (mut dom, _) = body_dom();
        let text = dom.text("hi");
        let span = dom.create_element("span");
        assert_eq!(dom.append_child(text, span), Err(DomError::NotAContainer));
    }

    #[test]
    fn test_remove_child_frees_subtree_and_focus() {
        let (mut dom, body) = body_dom();
        let form = dom.create_element("form");
        let input = dom.create_element("input");
        dom.append_child(body, form).unwrap();
        dom.append_child(form, input).unwrap();
        dom.focus(input).unwrap();

        dom.remove_child(body, form).unwrap();
        assert!(dom.is_removed(form));
        assert!(dom.is_removed(input));
        assert_eq!(dom.active_element(), None);
        assert_eq!(dom.set_attribute(form, "id", "x"), Err(DomError::Removed));
    }

    #[test]
    fn test_remove_attribute_only_records_real_removals() {
        let (mut dom, body) = body_dom();
        dom.set_attribute(body, "class", "a").unwrap();
        dom.observe();
        dom.remove_attribute(body, "id").unwrap();
        dom.remove_attribute(body, "class").unwrap();
        let records = dom.take_records();
        assert_eq!(records.len(), 1);
        assert!(matches!(&records[0], Mutation::RemoveAttribute { name, .. } if &**name == "class"));
    }

    #[test]
    fn test_text_content() {
        let (mut dom, body) = body_dom();
        let p = dom.create_element("p");
        let hello = dom.text("Hello, ");
        let note = dom.comment("skip me");
        let world = dom.text("world");
        dom.append_child(body, p).unwrap();
        for child in [hello, note, world] {
            dom.append_child(p, child).unwrap();
        }
        assert_eq!(dom.text_content(p), "Hello, world");
        assert_eq!(dom.text_content(note), "skip me");
    }
}
