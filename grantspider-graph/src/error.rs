use std::error::Error as StdError;

use thiserror::Error;

pub type BoxError = Box<dyn StdError + Send + Sync>;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("checkpoint failed: {0}")]
    Checkpoint(String),
    #[error("node '{node}' failed after {attempts} attempt(s): {source}")]
    NodeFailed {
        node: String,
        attempts: usize,
        source: BoxError,
    },
    #[error("node '{node}' dispatched more than {attempts} time(s) without completing")]
    AttemptsExhausted { node: String, attempts: usize },
    #[error("routing failed: {0}")]
    Routing(String),
    #[error("graph has no entry node")]
    MissingEntry,
    #[error("missing node: {node}")]
    MissingNode { node: String },
    #[error("invalid edge to '{node}'")]
    InvalidEdge { node: String },
    #[error("Max steps exceeded: reached {reached}, limit {max}")]
    MaxStepsExceeded { max: usize, reached: usize },
    /// An error raised by a node's own logic.
    #[error("{0}")]
    Node(#[source] BoxError),
}

impl GraphError {
    pub fn node(error: impl Into<BoxError>) -> Self {
        GraphError::Node(error.into())
    }

    pub(crate) fn into_boxed(self) -> BoxError {
        match self {
            GraphError::Node(inner) => inner,
            other => Box::new(other),
        }
    }
}
