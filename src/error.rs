use ego_tree::NodeId;
use thiserror::Error;

/// Failures raised by the document accessor.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unclosed element <{0}> at end of input")]
    Unclosed(String),

    #[error("closing tag </{0}> without a matching start tag")]
    UnexpectedEnd(String),

    #[error("node {0:?} does not exist")]
    UnknownNode(NodeId),

    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),

    #[error("invalid edit: {0}")]
    InvalidEdit(String),
}

/// Failures that abort a reconstruction pass. The pass driver turns every
/// variant into a rollback, never into a hard error for the caller.
#[derive(Error, Debug)]
pub enum HierarchyError {
    #[error("malformed heading observation {sequence_index}: {reason}")]
    MalformedObservation {
        sequence_index: usize,
        reason: String,
    },

    #[error("heading {0} could not be located in the document")]
    MissingHeading(usize),

    #[error("document accessor failed: {0}")]
    Accessor(#[from] DocumentError),
}

impl HierarchyError {
    pub fn malformed(sequence_index: usize, reason: impl Into<String>) -> Self {
        HierarchyError::MalformedObservation {
            sequence_index,
            reason: reason.into(),
        }
    }
}
