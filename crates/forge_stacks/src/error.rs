//! Error type for the build-resolve-emit pipeline.

use thiserror::Error;

use forge_graph::{EmitError, GraphError, ResolveError};

/// Result type alias for stack building.
pub type StackResult<T> = Result<T, StackError>;

/// Errors that can occur while building, resolving or emitting a stack.
#[derive(Error, Debug)]
pub enum StackError {
    #[error("graph construction failed: {0}")]
    Graph(#[from] GraphError),

    #[error("resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    #[error("emission failed: {0}")]
    Emit(#[from] EmitError),
}
