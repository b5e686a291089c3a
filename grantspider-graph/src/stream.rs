use crate::{GraphState, Route, StateSchema};

#[derive(Debug, Clone)]
pub enum GraphEvent<S: StateSchema> {
    NodeEnter {
        node: String,
        step: usize,
        timestamp: u64,
    },
    /// Emitted after a worker's update has been applied.
    NodeExit {
        node: String,
        step: usize,
        state: GraphState<S>,
        duration_ms: u128,
    },
    NodeError {
        node: String,
        attempt: usize,
        error: String,
    },
    Routed {
        router: String,
        target: Route,
    },
    CheckpointSaved {
        node: String,
        step: usize,
    },
    Completed {
        state: GraphState<S>,
    },
}

pub(crate) fn timestamp_ms() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default()
}
