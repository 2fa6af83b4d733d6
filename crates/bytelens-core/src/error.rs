use thiserror::Error;

use crate::node::NodeId;

/// Errors raised while reading, attributing, or resolving schemas.
///
/// Every variant aborts the parse attempt it was raised in. Retrying requires a
/// fresh `TracedStream`, since the boundary stack may be inconsistent after a
/// partial failure.
///
/// # Examples
/// ```
/// use bytelens_core::TraceError;
///
/// let err = TraceError::UnexpectedEof { pos: 2, requested: 4, available: 2 };
/// assert!(err.to_string().contains("unexpected end of input"));
/// ```
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("unexpected end of input at {pos}: need {requested} bytes, got {available}")]
    UnexpectedEof {
        pos: u64,
        requested: u64,
        available: u64,
    },
    #[error("terminator {term:#04x} not found before end of input (from {pos})")]
    TerminatorNotFound { pos: u64, term: u8 },
    #[error("seek to {target} outside of input ({size} bytes)")]
    SeekOutOfRange { target: u64, size: u64 },
    #[error("field '{name}' has not been attributed on node {node}")]
    MissingField { node: NodeId, name: String },
    #[error("no pending read boundary to attribute to field '{field}'")]
    StackUnderflow { field: String },
    #[error("{count} read boundaries left unattributed after parse")]
    DanglingBoundaries { count: usize },
    #[error("cannot resolve parser for schema '{schema}': {reason}")]
    SchemaResolution { schema: String, reason: String },
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TraceError {
    pub(crate) fn schema(schema: impl Into<String>, reason: impl Into<String>) -> Self {
        TraceError::SchemaResolution {
            schema: schema.into(),
            reason: reason.into(),
        }
    }
}
