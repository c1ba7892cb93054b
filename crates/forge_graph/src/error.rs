//! Error types for graph construction, resolution and emission.

use thiserror::Error;

/// Result type alias for graph construction.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors that can occur while building a template graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("duplicate logical id: {id}")]
    DuplicateId { id: String },

    #[error("invalid logical id '{id}': {reason}")]
    InvalidId { id: String, reason: String },
}

/// Errors that can occur while resolving a template graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("cyclic dependency: {}", cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    #[error("unresolved reference from '{from}' to '{to}'")]
    UnresolvedReference { from: String, to: String },

    #[error("duplicate export name: {name}")]
    DuplicateExport { name: String },
}

/// Errors that can occur while emitting a resolved template.
#[derive(Error, Debug)]
pub enum EmitError {
    #[error("unsupported value in '{id}': {reason}")]
    UnsupportedValue { id: String, reason: String },

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
