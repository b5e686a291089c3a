use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::{GraphError, GraphState, StateSchema};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(bound = "S: StateSchema")]
pub struct Checkpoint<S: StateSchema> {
    pub thread_id: String,
    pub state: GraphState<S>,
    pub step: usize,
    pub node: String,
    pub created_at: String,
}

impl<S: StateSchema> Checkpoint<S> {
    pub fn new(thread_id: String, state: GraphState<S>, step: usize, node: String) -> Self {
        Self {
            thread_id,
            state,
            step,
            node,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[async_trait::async_trait]
pub trait Checkpointer<S: StateSchema>: Send + Sync {
    async fn save(&self, checkpoint: &Checkpoint<S>) -> Result<(), GraphError>;
    /// Latest checkpoint for the thread.
    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint<S>>, GraphError>;
}

#[async_trait::async_trait]
impl<S, C> Checkpointer<S> for Arc<C>
where
    S: StateSchema,
    C: Checkpointer<S> + ?Sized,
{
    async fn save(&self, checkpoint: &Checkpoint<S>) -> Result<(), GraphError> {
        (**self).save(checkpoint).await
    }

    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint<S>>, GraphError> {
        (**self).load(thread_id).await
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointMetadata {
    pub seq: u64,
    pub step: usize,
    pub node: String,
    pub created_at: String,
}

#[async_trait::async_trait]
pub trait HistoryCheckpointer<S: StateSchema>: Send + Sync {
    async fn list_checkpoints(&self, thread_id: &str)
        -> Result<Vec<CheckpointMetadata>, GraphError>;
}

/// Keeps every checkpoint of every thread for the life of the process.
#[derive(Clone)]
pub struct InMemoryCheckpointer<S: StateSchema> {
    inner: Arc<RwLock<HashMap<String, Vec<Checkpoint<S>>>>>,
}

impl<S: StateSchema> Default for InMemoryCheckpointer<S> {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<S: StateSchema> InMemoryCheckpointer<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn thread_count(&self) -> Result<usize, GraphError> {
        let guard = self
            .inner
            .read()
            .map_err(|_| GraphError::Checkpoint("lock".into()))?;
        Ok(guard.len())
    }
}

#[async_trait::async_trait]
impl<S: StateSchema> Checkpointer<S> for InMemoryCheckpointer<S> {
    async fn save(&self, checkpoint: &Checkpoint<S>) -> Result<(), GraphError> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| GraphError::Checkpoint("lock".into()))?;
        guard
            .entry(checkpoint.thread_id.clone())
            .or_default()
            .push(checkpoint.clone());
        Ok(())
    }

    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint<S>>, GraphError> {
        let guard = self
            .inner
            .read()
            .map_err(|_| GraphError::Checkpoint("lock".into()))?;
        Ok(guard
            .get(thread_id)
            .and_then(|history| history.last())
            .cloned())
    }
}

#[async_trait::async_trait]
impl<S: StateSchema> HistoryCheckpointer<S> for InMemoryCheckpointer<S> {
    async fn list_checkpoints(
        &self,
        thread_id: &str,
    ) -> Result<Vec<CheckpointMetadata>, GraphError> {
        let guard = self
            .inner
            .read()
            .map_err(|_| GraphError::Checkpoint("lock".into()))?;
        Ok(guard
            .get(thread_id)
            .map(|history| {
                history
                    .iter()
                    .enumerate()
                    .map(|(seq, checkpoint)| CheckpointMetadata {
                        seq: seq as u64,
                        step: checkpoint.step,
                        node: checkpoint.node.clone(),
                        created_at: checkpoint.created_at.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}
