//! HTML5 serialization of arena nodes.
//!
//! Follows the HTML5 serialization rules:
//!
//! - Void elements never get end tags
//! - Text is escaped; attribute values are escaped and double-quoted
//! - Raw text elements (`script`, `style`) are written verbatim
//! - RCDATA elements (`title`, `textarea`) escape only `&` and `<`
//! - Childless foreign elements (SVG/MathML) use self-closing syntax
//!
//! Live-only state (listeners, properties, markers) is never serialized.

use crate::dom::{ElementData, NodeKind};
use crate::{Dom, Namespace, NodeId};
use std::fmt::Write;

/// Options for HTML serialization.
#[derive(Clone, Debug)]
pub struct SerializeOptions {
    /// Pretty-print with indentation (default: false)
    pub pretty: bool,
    /// Indentation string for pretty-printing (default: "  ")
    pub indent: String,
    /// Sort attributes by name instead of insertion order (default: false)
    pub sort_attributes: bool,
    /// Escape `</script` sequences in script content (default: true)
    pub escape_script_end_tags: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            pretty: false,
            indent: "  ".to_string(),
            sort_attributes: false,
            escape_script_end_tags: true,
        }
    }
}

impl SerializeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable pretty-printing with default indentation.
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Set a custom indentation string (implies pretty-printing).
    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self.pretty = true;
        self
    }

    pub fn sort_attributes(mut self) -> Self {
        self.sort_attributes = true;
        self
    }

    /// Disable escaping `</script` in script content (not recommended).
    pub fn no_escape_script_end_tags(mut self) -> Self {
        self.escape_script_end_tags = false;
        self
    }
}

fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn is_raw_text_element(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

fn is_rcdata_element(tag: &str) -> bool {
    matches!(tag, "title" | "textarea")
}

/// Which characters get replaced by entities.
#[derive(Clone, Copy)]
enum Escape {
    Text,
    Rcdata,
    Attribute,
}

fn escape_into(out: &mut String, text: &str, mode: Escape) {
    for c in text.chars() {
        match (c, mode) {
            ('&', _) => out.push_str("&amp;"),
            ('<', _) => out.push_str("&lt;"),
            ('>', Escape::Text | Escape::Attribute) => out.push_str("&gt;"),
            ('"', Escape::Attribute) => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

struct Serializer<'a> {
    dom: &'a Dom,
    out: String,
    options: &'a SerializeOptions,
    depth: usize,
}

impl<'a> Serializer<'a> {
    fn new(dom: &'a Dom, options: &'a SerializeOptions) -> Self {
        Self {
            dom,
            out: String::new(),
            options,
            depth: 0,
        }
    }

    fn indent(&mut self) {
        if self.options.pretty {
            for _ in 0..self.depth {
                self.out.push_str(&self.options.indent);
            }
        }
    }

    fn newline(&mut self) {
        if self.options.pretty {
            self.out.push('\n');
        }
    }

    fn write_script_text(&mut self, text: &str) {
        // ASCII case-insensitive search on bytes keeps indices aligned
        const PATTERN: &[u8] = b"</script";
        let bytes = text.as_bytes();
        let mut last_end = 0;
        let mut i = 0;
        while i + PATTERN.len() <= bytes.len() {
            if bytes[i..i + PATTERN.len()].eq_ignore_ascii_case(PATTERN) {
                self.out.push_str(&text[last_end..i]);
                self.out.push_str("<\\/script");
                i += PATTERN.len();
                last_end = i;
            } else {
                i += 1;
            }
        }
        self.out.push_str(&text[last_end..]);
    }

    fn write_node(&mut self, id: NodeId) {
        let Some(node) = self.dom.get(id) else {
            return;
        };
        match &node.kind {
            NodeKind::Document | NodeKind::Fragment => self.write_children(id),
            NodeKind::Element(elem) => self.write_element(id, elem, node.ns),
            NodeKind::Text(text) => {
                self.indent();
                escape_into(&mut self.out, text, Escape::Text);
                if self.options.pretty && !text.is_empty() {
                    self.newline();
                }
            }
            NodeKind::Comment(text) => {
                self.indent();
                // `--` would close the comment early
                let _ = write!(self.out, "<!--{}-->", text.replace("--", "- -"));
                self.newline();
            }
        }
    }

    fn write_children(&mut self, id: NodeId) {
        for child in self.dom.children(id) {
            self.write_node(child);
        }
    }

    fn write_element(&mut self, id: NodeId, elem: &ElementData, ns: Namespace) {
        let tag: &str = &elem.tag;

        self.indent();
        self.out.push('<');
        self.out.push_str(tag);

        let mut attrs: Vec<_> = elem.attrs.iter().collect();
        if self.options.sort_attributes {
            attrs.sort_by(|(a, _), (b, _)| str::cmp(a, b));
        }
        for (name, value) in attrs {
            let _ = write!(self.out, " {}=\"", &**name);
            escape_into(&mut self.out, value, Escape::Attribute);
            self.out.push('"');
        }

        let has_children = self.dom.first_child(id).is_some();

        if ns == Namespace::Html && is_void_element(tag) {
            self.out.push('>');
            self.newline();
            return;
        }
        if ns != Namespace::Html && !has_children {
            self.out.push_str("/>");
            self.newline();
            return;
        }
        self.out.push('>');

        let raw = ns == Namespace::Html && is_raw_text_element(tag);
        let rcdata = ns == Namespace::Html && is_rcdata_element(tag);
        let all_text = self
            .dom
            .children(id)
            .all(|c| matches!(self.dom.kind(c), Some(NodeKind::Text(_))));

        if raw || rcdata {
            for child in self.dom.children(id) {
                let Some(text) = self.dom.text_data(child) else {
                    continue;
                };
                if raw && self.options.escape_script_end_tags && tag == "script" {
                    self.write_script_text(text);
                } else if raw {
                    self.out.push_str(text);
                } else {
                    escape_into(&mut self.out, text, Escape::Rcdata);
                }
            }
        } else if all_text {
            for child in self.dom.children(id) {
                if let Some(text) = self.dom.text_data(child) {
                    escape_into(&mut self.out, text, Escape::Text);
                }
            }
        } else {
            self.newline();
            self.depth += 1;
            self.write_children(id);
            self.depth -= 1;
            self.indent();
        }

        let _ = write!(self.out, "</{tag}>");
        self.newline();
    }
}

impl Dom {
    /// Serialize the children of `id`.
    pub fn inner_html(&self, id: NodeId) -> String {
        self.inner_html_with_options(id, &SerializeOptions::default())
    }

    pub fn inner_html_with_options(&self, id: NodeId, opts: &SerializeOptions) -> String {
        let mut ser = Serializer::new(self, opts);
        ser.write_children(id);
        ser.out
    }

    /// Serialize `id` itself, including its own tag.
    pub fn outer_html(&self, id: NodeId) -> String {
        self.outer_html_with_options(id, &SerializeOptions::default())
    }

    pub fn outer_html_with_options(&self, id: NodeId, opts: &SerializeOptions) -> String {
        let mut ser = Serializer::new(self, opts);
        ser.write_node(id);
        ser.out
    }

    /// Serialize the body content (empty if there is no `<body>`).
    pub fn to_html(&self) -> String {
        self.body().map(|body| self.inner_html(body)).unwrap_or_default()
    }

    /// Serialize the whole document, DOCTYPE included.
    pub fn to_document_html(&self, opts: &SerializeOptions) -> String {
        let mut ser = Serializer::new(self, opts);
        if let Some(doctype) = &self.doctype {
            let _ = write!(ser.out, "<!DOCTYPE {doctype}>");
            ser.newline();
        }
        ser.write_children(self.document);
        ser.out
    }
}
