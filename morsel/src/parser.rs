//! HTML5 parsing into the arena via html5ever's TreeSink.
//!
//! html5ever runs the full tree construction algorithm, so malformed markup
//! is recovered the same way a browser would recover it.

use crate::dom::{ElementData, NodeData, NodeKind};
use crate::{Dom, Namespace, Stem};
use html5ever::tree_builder::{ElemName, ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute, LocalName, QualName, parse_document};
use indexmap::IndexMap;
use indextree::{Arena, NodeId};
use std::borrow::Cow;
use std::cell::RefCell;
use tendril::{StrTendril, TendrilSink};

#[allow(unused_imports)]
use crate::tracing_macros::{debug, trace};

impl Dom {
    /// Parse a full HTML document.
    pub fn parse_document(html: &str) -> Dom {
        let sink = ArenaSink::new(Arena::new());
        let parsed = parse_document(sink, Default::default()).one(StrTendril::from(html));
        Dom::from_parts(parsed.arena, parsed.document, parsed.doctype)
    }

    /// Parse body content into detached nodes owned by this DOM.
    ///
    /// The markup is parsed as the content of `<body>`, so elements that are
    /// only valid elsewhere (`<head>` content, bare table rows) are dropped or
    /// repaired the way a browser would.
    pub fn parse_fragment(&mut self, html: &str) -> Vec<NodeId> {
        let arena = std::mem::take(&mut self.arena);
        let sink = ArenaSink::new(arena);
        let source = StrTendril::from(format!("<html><body>{html}</body></html>"));
        let parsed = parse_document(sink, Default::default()).one(source);
        self.arena = parsed.arena;

        let scratch = parsed.document;
        let body = scratch
            .descendants(&self.arena)
            .find(|&id| matches!(&self.arena[id].get().kind, NodeKind::Element(e) if &*e.tag == "body"));

        let nodes: Vec<NodeId> = match body {
            Some(body) => body.children(&self.arena).collect(),
            None => Vec::new(),
        };
        for &node in &nodes {
            node.detach(&mut self.arena);
        }
        scratch.remove_subtree(&mut self.arena);

        debug!(count = nodes.len(), "parsed fragment");
        nodes
    }
}

struct Parsed {
    arena: Arena<NodeData>,
    document: NodeId,
    doctype: Option<Stem>,
}

/// Owned element name wrapper
#[derive(Debug, Clone)]
struct OwnedElemName(QualName);

impl ElemName for OwnedElemName {
    fn ns(&self) -> &html5ever::Namespace {
        &self.0.ns
    }

    fn local_name(&self) -> &LocalName {
        &self.0.local
    }
}

/// TreeSink that builds straight into an arena
struct ArenaSink {
    arena: RefCell<Arena<NodeData>>,

    /// Document node the parser builds under
    document: NodeId,

    doctype: RefCell<Option<Stem>>,
}

impl ArenaSink {
    fn new(mut arena: Arena<NodeData>) -> Self {
        let document = arena.new_node(NodeData {
            kind: NodeKind::Document,
            ns: Namespace::Html,
        });

        ArenaSink {
            arena: RefCell::new(arena),
            document,
            doctype: RefCell::new(None),
        }
    }

    fn new_text(arena: &mut Arena<NodeData>, text: &StrTendril) -> NodeId {
        arena.new_node(NodeData {
            kind: NodeKind::Text(Stem::from(text)),
            ns: Namespace::Html,
        })
    }
}

fn attr_name(attr: &Attribute) -> LocalName {
    match &attr.name.prefix {
        Some(prefix) => LocalName::from(format!("{}:{}", &**prefix, &*attr.name.local)),
        None => attr.name.local.clone(),
    }
}

impl TreeSink for ArenaSink {
    type Handle = NodeId;
    type Output = Parsed;
    type ElemName<'a>
        = OwnedElemName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        Parsed {
            arena: self.arena.into_inner(),
            document: self.document,
            doctype: self.doctype.into_inner(),
        }
    }

    fn parse_error(&self, msg: Cow<'static, str>) {
        trace!(%msg, "recovered from parse error");
    }

    fn get_document(&self) -> Self::Handle {
        self.document
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn same_node(&self, a: &Self::Handle, b: &Self::Handle) -> bool {
        a == b
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> OwnedElemName {
        let arena = self.arena.borrow();
        let node = arena[*target].get();

        let (ns, local) = match &node.kind {
            NodeKind::Element(elem) => (node.ns, elem.tag.clone()),
            _ => (Namespace::Html, LocalName::from("")),
        };

        OwnedElemName(QualName {
            prefix: None,
            ns: html5ever::Namespace::from(ns.url()),
            local,
        })
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let mut elem = ElementData::new(name.local.clone());
        elem.attrs = attrs
            .iter()
            .map(|attr| (attr_name(attr), Stem::from(&attr.value)))
            .collect::<IndexMap<_, _>>();

        self.arena.borrow_mut().new_node(NodeData {
            kind: NodeKind::Element(elem),
            ns: Namespace::from_url(&name.ns),
        })
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        self.arena.borrow_mut().new_node(NodeData {
            kind: NodeKind::Comment(Stem::from(text)),
            ns: Namespace::Html,
        })
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        // Processing instructions only occur in foreign content; keep an empty comment
        self.arena.borrow_mut().new_node(NodeData {
            kind: NodeKind::Comment(Stem::new()),
            ns: Namespace::Html,
        })
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let mut arena = self.arena.borrow_mut();
        match child {
            NodeOrText::AppendNode(node) => {
                parent.append(node, &mut arena);
            }
            NodeOrText::AppendText(text) => {
                // Adjacent text merges into one node
                if let Some(last) = parent.children(&arena).next_back()
                    && let NodeKind::Text(existing) = &mut arena[last].get_mut().kind
                {
                    existing.push_tendril(&text);
                    return;
                }
                let text_node = Self::new_text(&mut arena, &text);
                parent.append(text_node, &mut arena);
            }
        }
    }

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let mut arena = self.arena.borrow_mut();
        let node = match new_node {
            NodeOrText::AppendNode(node) => node,
            NodeOrText::AppendText(text) => Self::new_text(&mut arena, &text),
        };
        sibling.insert_before(node, &mut arena);
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        let has_parent = self.arena.borrow()[*element].parent().is_some();
        if has_parent {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
        *self.doctype.borrow_mut() = Some(Stem::from(name));
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        // Template contents live directly under the <template> element
        *target
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Attribute>) {
        let mut arena = self.arena.borrow_mut();
        if let NodeKind::Element(elem) = &mut arena[*target].get_mut().kind {
            for attr in &attrs {
                elem.attrs
                    .entry(attr_name(attr))
                    .or_insert_with(|| Stem::from(&attr.value));
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        target.detach(&mut self.arena.borrow_mut());
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let mut arena = self.arena.borrow_mut();
        let children: Vec<NodeId> = node.children(&arena).collect();
        for child in children {
            child.detach(&mut arena);
            new_parent.append(child, &mut arena);
        }
    }
}
