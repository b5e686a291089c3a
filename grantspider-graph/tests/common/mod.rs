#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use grantspider_graph::{
    GraphError, GraphNode, GraphState, Route, Router, StateSchema, StateUpdate,
};

#[derive(Clone, Default, Debug, Serialize, Deserialize, PartialEq)]
pub struct Counter {
    pub count: i32,
    pub trail: Vec<String>,
}

#[derive(Debug)]
pub struct Tick {
    pub by: i32,
    pub node: String,
}

impl StateSchema for Counter {
    type Update = Tick;

    fn apply(current: &Self, update: Tick) -> Self {
        let mut next = current.clone();
        next.count += update.by;
        next.trail.push(update.node);
        next
    }
}

pub fn state(count: i32) -> GraphState<Counter> {
    GraphState::new(Counter {
        count,
        trail: Vec::new(),
    })
}

pub struct Inc(pub &'static str);

#[async_trait::async_trait]
impl GraphNode<Counter> for Inc {
    async fn invoke(
        &self,
        _state: GraphState<Counter>,
    ) -> Result<StateUpdate<Counter>, GraphError> {
        Ok(StateUpdate::new(Tick {
            by: 1,
            node: self.0.to_string(),
        }))
    }
}

/// Makes no progress, so a router keeps sending work back to it.
pub struct Stall;

#[async_trait::async_trait]
impl GraphNode<Counter> for Stall {
    async fn invoke(
        &self,
        _state: GraphState<Counter>,
    ) -> Result<StateUpdate<Counter>, GraphError> {
        Ok(StateUpdate::new(Tick {
            by: 0,
            node: "stall".to_string(),
        }))
    }
}

/// Fails the first `failures` calls, then increments.
pub struct Flaky {
    pub failures: usize,
    pub calls: Arc<AtomicUsize>,
}

impl Flaky {
    pub fn new(failures: usize) -> Self {
        Self {
            failures,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait::async_trait]
impl GraphNode<Counter> for Flaky {
    async fn invoke(
        &self,
        _state: GraphState<Counter>,
    ) -> Result<StateUpdate<Counter>, GraphError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(GraphError::node(format!("flaky failure {call}")));
        }
        Ok(StateUpdate::new(Tick {
            by: 1,
            node: "flaky".to_string(),
        }))
    }
}

/// Sends work to `worker` until the count reaches `limit`.
pub struct Hub {
    pub worker: &'static str,
    pub limit: i32,
}

impl Router<Counter> for Hub {
    fn route(&self, state: &GraphState<Counter>) -> Result<Route, GraphError> {
        if state.data.count >= self.limit {
            Ok(Route::End)
        } else {
            Ok(Route::to(self.worker))
        }
    }

    fn targets(&self) -> Vec<String> {
        vec![self.worker.to_string()]
    }
}
