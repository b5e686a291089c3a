use std::collections::HashMap;

use grantspider_core::{Document, StoreError, VectorStore};
use grantspider_retrieval::InMemoryVectorStore;

fn doc(id: &str, embedding: Vec<f32>) -> Document {
    Document {
        id: id.to_string(),
        content: format!("content of {id}"),
        metadata: HashMap::new(),
        embedding: Some(embedding),
    }
}

#[tokio::test]
async fn search_orders_by_cosine_similarity() {
    let store = InMemoryVectorStore::new();
    store
        .add(vec![
            doc("far", vec![0.0, 1.0]),
            doc("near", vec![1.0, 0.1]),
            doc("exact", vec![1.0, 0.0]),
        ])
        .await
        .expect("add");

    let results = store.search(&[1.0, 0.0], 2).await.expect("search");
    let ids: Vec<_> = results.iter().map(|r| r.document.id.as_str()).collect();
    assert_eq!(ids, vec!["exact", "near"]);
    assert!(results.iter().all(|r| r.document.embedding.is_none()));
}

#[tokio::test]
async fn search_rejects_dimension_mismatch() {
    let store = InMemoryVectorStore::new();
    store.add(vec![doc("a", vec![1.0, 0.0])]).await.expect("add");

    let err = store.search(&[1.0, 0.0, 0.0], 1).await.expect_err("mismatch");
    assert!(matches!(
        err,
        StoreError::DimensionMismatch { expected: 2, got: 3 }
    ));
}

#[tokio::test]
async fn add_requires_embedding() {
    let store = InMemoryVectorStore::new();
    let mut missing = doc("a", vec![]);
    missing.embedding = None;
    let err = store.add(vec![missing]).await.expect_err("missing embedding");
    assert!(matches!(err, StoreError::MissingEmbedding(id) if id == "a"));
}

#[tokio::test]
async fn delete_removes_documents_from_results() {
    let store = InMemoryVectorStore::new();
    store
        .add(vec![doc("a", vec![1.0, 0.0]), doc("b", vec![0.9, 0.1])])
        .await
        .expect("add");
    store.delete(&["a".to_string()]).await.expect("delete");

    let results = store.search(&[1.0, 0.0], 5).await.expect("search");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].document.id, "b");
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn re_adding_an_id_replaces_the_document() {
    let store = InMemoryVectorStore::new();
    store.add(vec![doc("a", vec![1.0, 0.0])]).await.expect("add");
    store.add(vec![doc("a", vec![0.0, 1.0])]).await.expect("replace");

    let results = store.search(&[0.0, 1.0], 5).await.expect("search");
    assert_eq!(results.len(), 1);
    assert!(results[0].score > 0.99);
}
