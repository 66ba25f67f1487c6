use facet::Facet;

/// Errors raised by the underlying DOM mutations.
///
/// The morph engine never produces these for routine mismatches; they only
/// surface when a caller hands it a node the tree cannot operate on.
#[derive(Facet, Debug, Clone, PartialEq, Eq)]
#[facet(derive(Error))]
#[repr(u8)]
pub enum DomError {
    /// node has been removed from the arena
    Removed,

    /// node is not an element
    NotAnElement,

    /// node cannot have children
    NotAContainer,

    /// node is not a text or comment node
    NotCharacterData,

    /// a node cannot be inserted into itself or one of its descendants
    HierarchyRequest,

    /// reference node is not a child of the given parent
    NotAChild,
}

impl From<indextree::NodeError> for DomError {
    fn from(err: indextree::NodeError) -> Self {
        match err {
            indextree::NodeError::Removed => DomError::Removed,
            _ => DomError::HierarchyRequest,
        }
    }
}
