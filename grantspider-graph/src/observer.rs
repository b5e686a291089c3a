use serde_json::Value;

use crate::GraphError;

#[async_trait::async_trait]
pub trait Observer: Send + Sync {
    async fn on_node_start(&self, _node: &str, _input: &Value) {}
    async fn on_node_end(&self, _node: &str, _output: &Value, _duration_ms: u128) {}
    async fn on_error(&self, _node: &str, _error: &GraphError) {}
}
