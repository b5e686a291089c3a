use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use grantspider_core::{Document, Value};

use crate::{IngestionError, TextSplitter};

const TEXT_EXTENSIONS: &[&str] = &["txt", "md"];

pub struct TextLoader {
    path: PathBuf,
}

impl TextLoader {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> Result<Vec<Document>, IngestionError> {
        let content = fs::read_to_string(&self.path).map_err(|source| IngestionError::Read {
            path: self.path.clone(),
            source,
        })?;

        Ok(vec![Document {
            id: self.path.to_string_lossy().to_string(),
            content,
            metadata: file_metadata(&self.path),
            embedding: None,
        }])
    }
}

fn file_metadata(path: &Path) -> HashMap<String, Value> {
    let mut metadata = HashMap::new();
    metadata.insert(
        "source".to_string(),
        Value::String(path.to_string_lossy().to_string()),
    );
    if let Some(name) = path.file_name() {
        metadata.insert(
            "filename".to_string(),
            Value::String(name.to_string_lossy().to_string()),
        );
    }
    metadata
}

fn is_text_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| TEXT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Reads the `.txt` / `.md` files directly under `dir` (sorted by name) and
/// splits each into chunk documents.
///
/// Chunk ids are `<filename>#<index>`. Plain text has no pages, so every
/// chunk is tagged `page_number = 1`.
pub async fn load_corpus_dir(
    dir: impl AsRef<Path>,
    splitter: &TextSplitter,
) -> Result<Vec<Document>, IngestionError> {
    let dir = dir.as_ref();
    let read_err = |source| IngestionError::Read {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(read_err)?;
    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
        let path = entry.path();
        let file_type = entry.file_type().await.map_err(read_err)?;
        if file_type.is_file() && is_text_file(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    if paths.is_empty() {
        return Err(IngestionError::EmptyCorpus(dir.to_path_buf()));
    }

    let mut documents = Vec::new();
    for path in paths {
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| IngestionError::Read {
                path: path.clone(),
                source,
            })?;
        let base = file_metadata(&path);
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();

        let pieces = splitter.split(&content);
        let total = pieces.len();
        tracing::debug!(file = %filename, chunks = total, "loaded corpus file");

        for (index, piece) in pieces.into_iter().enumerate() {
            let mut metadata = base.clone();
            metadata.insert("page_number".to_string(), Value::from(1));
            metadata.insert("chunk_index".to_string(), Value::from(index));
            metadata.insert("total_chunks".to_string(), Value::from(total));
            metadata.insert(
                "chunk_size".to_string(),
                Value::from(piece.chars().count()),
            );
            documents.push(Document {
                id: format!("{filename}#{index}"),
                content: piece,
                metadata,
                embedding: None,
            });
        }
    }

    Ok(documents)
}
