mod checkpoint;
mod config;
mod error;
mod graph;
mod node;
mod observer;
mod program;
mod state;
mod stream;

pub use checkpoint::{
    Checkpoint, CheckpointMetadata, Checkpointer, HistoryCheckpointer, InMemoryCheckpointer,
};
pub use config::{ExecutionConfig, ExecutionOptions};
pub use error::GraphError;
pub use graph::{ExecutableGraph, GraphBuilder};
pub use node::{GraphNode, Route, Router};
pub use observer::Observer;
pub use program::{EdgeKind, GraphProgram, NodeKind, END, START};
pub use state::{GraphState, StateSchema, StateUpdate};
pub use stream::GraphEvent;
