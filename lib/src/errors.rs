// Errors raised by the document graph, the tree model and the operation engine

use crate::node::NodeClass;
use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// a live subject with this id already exists
    DuplicateSubject(String),
    SubjectNotFound(String),
    /// the root of a page can never be deleted
    ImmutableRoot(String),
    /// the root of a page can never have a sibling
    RootSibling(String),
    /// attach was called without a node to attach
    NullChild,
    InvalidRange {
        offset: usize,
        length: usize,
    },
    /// a node was moved into itself or one of its descendants
    CyclicMove {
        node: String,
        target: String,
    },
    /// commit of a deleted subject, undo of an inserted subject, writes to deleted subjects
    InvalidState(String),
    UnknownPredicate {
        subject: String,
        predicate: String,
    },
    UnknownType(String),
    NodeKind {
        id: String,
        expected: NodeClass,
    },
    ChildNotFound {
        parent: String,
        offset: usize,
    },
    PathNotFound(String),
    InvalidPath(String),
    MalformedValue {
        predicate: String,
        reason: String,
    },
    InvalidRepresentation(String),
    Ontology(String),
    Parse(String),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::DuplicateSubject(id) => write!(f, "Duplicated node insertion: {}", id),
            Error::SubjectNotFound(id) => write!(f, "Subject not found: {}", id),
            Error::ImmutableRoot(id) => write!(f, "The root node is not removable: {}", id),
            Error::RootSibling(id) => write!(f, "The root node may not have siblings: {}", id),
            Error::NullChild => write!(f, "Trying to insert a null subject"),
            Error::InvalidRange { offset, length } => {
                write!(f, "Invalid range: offset = {}, length = {}", offset, length)
            }
            Error::CyclicMove { node, target } => write!(
                f,
                "Trying to move {} into itself or its descendant {}",
                node, target
            ),
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Error::UnknownPredicate { subject, predicate } => {
                write!(f, "Unknown predicate {} for subject {}", predicate, subject)
            }
            Error::UnknownType(t) => write!(f, "Unknown node type: {}", t),
            Error::NodeKind { id, expected } => write!(f, "The node {} is not a {}", id, expected),
            Error::ChildNotFound { parent, offset } => {
                write!(f, "No child of {} at offset {}", parent, offset)
            }
            Error::PathNotFound(path) => write!(f, "Cannot find a descendant at path {}", path),
            Error::InvalidPath(msg) => write!(f, "Invalid path: {}", msg),
            Error::MalformedValue { predicate, reason } => {
                write!(f, "Malformed value for {}: {}", predicate, reason)
            }
            Error::InvalidRepresentation(msg) => write!(f, "Invalid node representation: {}", msg),
            Error::Ontology(msg) => write!(f, "Invalid ontology: {}", msg),
            Error::Parse(msg) => write!(f, "Failed to parse triples: {}", msg),
            Error::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
