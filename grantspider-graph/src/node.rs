use async_trait::async_trait;

use crate::{GraphError, GraphState, StateSchema, StateUpdate};

/// A worker step: reads the state and returns a partial update.
#[async_trait]
pub trait GraphNode<S: StateSchema>: Send + Sync {
    async fn invoke(&self, state: GraphState<S>) -> Result<StateUpdate<S>, GraphError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Node(String),
    End,
}

impl Route {
    pub fn to(node: impl Into<String>) -> Self {
        Route::Node(node.into())
    }
}

/// A routing step: inspects the state and picks the next hop. Routers never
/// modify state.
pub trait Router<S: StateSchema>: Send + Sync {
    fn route(&self, state: &GraphState<S>) -> Result<Route, GraphError>;

    /// Nodes this router may select, for validation and diagrams.
    fn targets(&self) -> Vec<String>;
}
