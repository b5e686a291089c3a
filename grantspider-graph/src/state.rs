use std::fmt::Debug;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Shared state carried through a graph run.
///
/// Nodes never replace the state wholesale; they return an `Update` that the
/// schema folds into the current value.
pub trait StateSchema:
    Serialize + DeserializeOwned + Clone + Default + Debug + Send + Sync + 'static
{
    type Update: Debug + Send + Sync + 'static;

    fn apply(current: &Self, update: Self::Update) -> Self;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(bound = "S: StateSchema")]
pub struct GraphState<S: StateSchema> {
    pub data: S,
}

impl<S: StateSchema> GraphState<S> {
    pub fn new(data: S) -> Self {
        Self { data }
    }

    pub fn apply(self, update: StateUpdate<S>) -> Self {
        Self {
            data: S::apply(&self.data, update.data),
        }
    }
}

#[derive(Debug)]
pub struct StateUpdate<S: StateSchema> {
    pub data: S::Update,
}

impl<S: StateSchema> StateUpdate<S> {
    pub fn new(data: S::Update) -> Self {
        Self { data }
    }
}
