//! In-memory vector store implementation.
//!
//! Useful for testing and small datasets.

use super::{rank, Document, IndexedSource, SearchResult, VectorStore};
use crate::error::{AnimagenError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory vector store.
pub struct MemoryVectorStore {
    documents: RwLock<HashMap<String, Document>>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
        }
    }

    fn poisoned<E: std::fmt::Display>(e: E) -> AnimagenError {
        AnimagenError::VectorStore(format!("Failed to acquire lock: {}", e))
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize> {
        let mut store = self.documents.write().map_err(Self::poisoned)?;
        for doc in docs {
            store.insert(doc.id.to_string(), doc.clone());
        }
        Ok(docs.len())
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        self.search_with_threshold(query_embedding, limit, f32::MIN).await
    }

    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let docs = self.documents.read().map_err(Self::poisoned)?;
        Ok(rank(docs.values().cloned(), query_embedding, limit, min_score))
    }

    async fn delete_by_source(&self, source: &str) -> Result<usize> {
        let mut docs = self.documents.write().map_err(Self::poisoned)?;
        let initial_len = docs.len();
        docs.retain(|_, doc| doc.source != source);
        Ok(initial_len - docs.len())
    }

    async fn list_sources(&self) -> Result<Vec<IndexedSource>> {
        let docs = self.documents.read().map_err(Self::poisoned)?;

        let mut source_map: HashMap<String, IndexedSource> = HashMap::new();
        for doc in docs.values() {
            let entry = source_map
                .entry(doc.source.clone())
                .or_insert_with(|| IndexedSource {
                    source: doc.source.clone(),
                    chunk_count: 0,
                    indexed_at: doc.indexed_at,
                });

            entry.chunk_count += 1;
            if doc.indexed_at > entry.indexed_at {
                entry.indexed_at = doc.indexed_at;
            }
        }

        let mut sources: Vec<IndexedSource> = source_map.into_values().collect();
        sources.sort_by(|a, b| b.indexed_at.cmp(&a.indexed_at));
        Ok(sources)
    }

    async fn document_count(&self) -> Result<usize> {
        let docs = self.documents.read().map_err(Self::poisoned)?;
        Ok(docs.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_vector_store() {
        let store = MemoryVectorStore::new();

        let doc1 = Document::new(
            "snippets".to_string(),
            "circle = Circle()".to_string(),
            vec![1.0, 0.0, 0.0],
            0,
        );
        let doc2 = Document::new(
            "snippets".to_string(),
            "square = Square()".to_string(),
            vec![0.0, 1.0, 0.0],
            1,
        );

        store.upsert_batch(&[doc1, doc2]).await.unwrap();
        assert_eq!(store.document_count().await.unwrap(), 2);

        let results = store.search(&[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].score > results[1].score);
        assert_eq!(results[0].document.content, "circle = Circle()");

        let sources = store.list_sources().await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].chunk_count, 2);

        assert_eq!(store.delete_by_source("snippets").await.unwrap(), 2);
        assert_eq!(store.document_count().await.unwrap(), 0);
    }
}
