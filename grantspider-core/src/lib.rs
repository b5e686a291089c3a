mod document;
mod embedding;
mod error;
mod llm;
mod vector_store;

pub use document::{Chunk, Document};
pub use embedding::Embedding;
pub use error::{EmbeddingError, GrantSpiderError, StoreError};
pub use llm::{Llm, LlmRequest, LlmResponse, Message, Role};
pub use vector_store::{SearchResult, VectorStore};

pub type Value = serde_json::Value;
