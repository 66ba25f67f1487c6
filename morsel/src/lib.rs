//! Arena-based live DOM with an in-place morph engine.
//!
//! morsel provides:
//! - **Live DOM**: an indextree arena of elements, text and comments with
//!   stable node identity, native listeners, live properties, focus and scroll
//! - **Parsing**: browser-compatible HTML5 parsing via html5ever into the arena
//! - **Serialization**: HTML5-correct serialization with proper escaping
//! - **Morphing**: patching the live tree in place to match a freshly built
//!   tree, reusing nodes by key or position
//!
//! # Example
//!
//! ```rust
//! use morsel::Dom;
//!
//! let mut dom = Dom::parse_document("<html><body><ul></ul></body></html>");
//! let body = dom.body().unwrap();
//! let list = dom.first_child(body).unwrap();
//!
//! let first = dom.element("li").key("1").text("A").build().unwrap();
//! let next = dom.element("ul").child(first).build().unwrap();
//! dom.morph(body, next).unwrap();
//!
//! // The `<ul>` is the same node; only its children changed.
//! assert_eq!(dom.first_child(body), Some(list));
//! assert_eq!(dom.to_html(), "<ul><li>A</li></ul>");
//! ```

mod tracing_macros;

mod builder;
mod dom;
mod error;
pub mod events;
pub mod morph;
mod mutation;
mod parser;
pub mod props;
pub mod serialize;
mod stem;

pub use builder::ElementBuilder;
pub use dom::{Dom, ElementData, LiveState, Namespace, NodeData, NodeKind};
pub use error::DomError;
pub use events::{Event, EventRecord, Handler, Listener};
pub use morph::{MorphOptions, NewTree, morph, morph_with};
pub use mutation::Mutation;
pub use props::{DomProp, DomPropValue, LiveValue, PropRecord};
pub use serialize::SerializeOptions;
pub use stem::Stem;

// Re-exported so callers can name node handles and tag atoms without
// depending on indextree / html5ever directly.
pub use html5ever::LocalName;
pub use indextree::NodeId;
