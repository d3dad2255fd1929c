use crate::document::Document;
use crate::error::DocumentError;
use ego_tree::NodeId;

pub const SECTION_TAG: &str = "div";
pub const HEAD_TAG: &str = "head";

/// Wraps the heading and everything after it in its parent.
pub fn enclose(doc: &mut Document, heading: NodeId) -> Result<NodeId, DocumentError> {
    let last = doc
        .last_sibling(heading)
        .ok_or(DocumentError::UnknownNode(heading))?;
    doc.wrap(heading, last, SECTION_TAG)
}

/// Wraps the heading up to, not including, `boundary` when `boundary` follows
/// it in the same parent; otherwise up to the end of the parent.
pub fn enclose_before(
    doc: &mut Document,
    heading: NodeId,
    boundary: NodeId,
) -> Result<NodeId, DocumentError> {
    if !doc.is_following_sibling(heading, boundary) {
        return enclose(doc, heading);
    }
    let last = doc
        .prev_sibling(boundary)
        .ok_or(DocumentError::UnknownNode(boundary))?;
    doc.wrap(heading, last, SECTION_TAG)
}

/// The section the heading opens, if it has been wrapped.
pub fn section_of(doc: &Document, heading: NodeId) -> Option<NodeId> {
    let parent = doc.parent(heading)?;
    let opens = doc.element(parent).is_some_and(|el| el.is(SECTION_TAG))
        && doc.first_child(parent) == Some(heading);
    opens.then_some(parent)
}
