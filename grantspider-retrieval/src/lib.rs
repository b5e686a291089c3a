mod base_retriever;
mod error;
mod hash_embedder;
mod in_memory;
mod indexer;
mod loader;
mod retriever;
mod splitter;

use std::path::Path;

pub use base_retriever::BaseRetriever;
pub use error::{IngestionError, RetrievalError};
pub use hash_embedder::HashEmbedder;
pub use in_memory::InMemoryVectorStore;
pub use indexer::Indexer;
pub use loader::{load_corpus_dir, TextLoader};
pub use retriever::Retriever;
pub use splitter::TextSplitter;

/// Loads every text file under `dir`, chunks it and indexes the chunks.
/// Returns the number of chunks indexed.
pub async fn index_corpus<E, S>(
    indexer: &Indexer<E, S>,
    dir: impl AsRef<Path>,
    splitter: &TextSplitter,
) -> Result<usize, IngestionError>
where
    E: grantspider_core::Embedding,
    S: grantspider_core::VectorStore,
{
    let chunks = load_corpus_dir(dir, splitter).await?;
    let count = chunks.len();
    indexer.add_documents(chunks).await?;
    Ok(count)
}
