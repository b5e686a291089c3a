#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionConfig {
    /// Upper bound on node executions (routers included) per run.
    pub max_steps: Option<usize>,
    /// How many times a single worker node may be dispatched per run.
    pub max_node_attempts: usize,
    /// Capacity of the event channel behind `stream_invoke`.
    pub event_buffer: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_steps: Some(25),
            max_node_attempts: 2,
            event_buffer: 64,
        }
    }
}

impl ExecutionConfig {
    pub fn merge(&self, overrides: &ExecutionOptions) -> Self {
        Self {
            max_steps: overrides.max_steps.or(self.max_steps),
            max_node_attempts: overrides
                .max_node_attempts
                .unwrap_or(self.max_node_attempts)
                .max(1),
            event_buffer: self.event_buffer.max(1),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ExecutionOptions {
    pub max_steps: Option<usize>,
    pub max_node_attempts: Option<usize>,
    /// Checkpoints are only written when both this and a checkpointer are set.
    pub thread_id: Option<String>,
}

impl ExecutionOptions {
    pub fn for_thread(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: Some(thread_id.into()),
            ..Self::default()
        }
    }
}
