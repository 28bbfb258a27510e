#![forbid(unsafe_code)]

//! Identifier newtypes, property values, and the crate error type.

use std::fmt;

/// Application-level object id.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, serde::Serialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

/// Backend-native vertex id.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct VertexId(pub u64);

/// Backend-native edge id.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct EdgeId(pub u64);

/// Small integer association-type code.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, serde::Serialize)]
#[serde(transparent)]
pub struct AssocType(pub u32);

/// Backend handle for an edge label, resolved once by the type table.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct LabelHandle(pub u64);

/// Opaque vertex handle valid only inside the transaction that produced it.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct VertexHandle(pub u64);

/// Opaque edge handle valid only inside the transaction that produced it.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct EdgeHandle(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for AssocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(value: u64) -> Self {
        NodeId(value)
    }
}

impl From<u32> for AssocType {
    fn from(value: u32) -> Self {
        AssocType(value)
    }
}

/// Property value as stored on a backend vertex or edge.
#[derive(Clone, Debug, PartialEq)]
pub enum PropValue {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point number.
    Float(f64),
    /// Owned string.
    Str(String),
    /// Owned byte vector.
    Bytes(Vec<u8>),
}

impl PropValue {
    /// Returns the string payload when the value is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the integer payload when the value is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Null => write!(f, "null"),
            PropValue::Bool(v) => write!(f, "{v}"),
            PropValue::Int(v) => write!(f, "{v}"),
            PropValue::Float(v) => write!(f, "{v}"),
            PropValue::Str(v) => write!(f, "{v}"),
            PropValue::Bytes(v) => write!(f, "bytes(len={})", v.len()),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(value.to_owned())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Int(value)
    }
}

/// Errors surfaced by sessions, queries, and backend adapters.
#[derive(thiserror::Error, Debug)]
pub enum TaoError {
    /// The node id does not resolve to a backend vertex.
    #[error("node {0} not found")]
    NotFound(NodeId),
    /// The association type is outside the discovered type table.
    #[error("association type {atype} outside type table of {known} entries")]
    UnknownAtype {
        /// Requested association type.
        atype: AssocType,
        /// Number of types the table resolved.
        known: usize,
    },
    /// Missing or malformed configuration.
    #[error("configuration error: {0}")]
    Config(String),
    /// Failure reported by the backend adapter.
    #[error("backend error: {0}")]
    Backend(String),
    /// File I/O while loading configuration or data.
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse error classes callers can branch on.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Requested node id does not exist.
    NotFound,
    /// Caller or schema mismatch; fatal.
    Configuration,
    /// Adapter or I/O failure, propagated as-is.
    Backend,
}

impl TaoError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TaoError::NotFound(_) => ErrorKind::NotFound,
            TaoError::UnknownAtype { .. } | TaoError::Config(_) => ErrorKind::Configuration,
            TaoError::Backend(_) | TaoError::Io(_) => ErrorKind::Backend,
        }
    }

    pub(crate) fn backend(message: impl Into<String>) -> Self {
        TaoError::Backend(message.into())
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        TaoError::Config(message.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TaoError>;

/// Linear mapping between application node ids and backend vertex ids.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct IdMap {
    offset: u64,
}

impl IdMap {
    /// Creates a mapping that adds `offset` on the way into the backend.
    pub fn new(offset: u64) -> Self {
        Self { offset }
    }

    /// Returns the configured offset.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Maps an application id to the backend vertex id.
    pub fn to_vertex(&self, id: NodeId) -> Result<VertexId> {
        id.0.checked_add(self.offset)
            .map(VertexId)
            .ok_or_else(|| TaoError::backend(format!("node id {id} overflows vertex id space")))
    }

    /// Maps a backend vertex id back to the application id.
    pub fn to_node(&self, vertex: VertexId) -> Result<NodeId> {
        vertex
            .0
            .checked_sub(self.offset)
            .map(NodeId)
            .ok_or_else(|| {
                TaoError::backend(format!(
                    "vertex {vertex} below id offset {}",
                    self.offset
                ))
            })
    }
}
