//! Building the snippet similarity index.
//!
//! Loads the snippet document, splits it into overlapping chunks, embeds
//! them, and replaces the previous chunks of the same source in the store.

use crate::chunking::{ChunkingConfig, SnippetChunker};
use crate::config::IndexSettings;
use crate::embedding::Embedder;
use crate::error::{AnimagenError, Result};
use crate::vector_store::{Document, VectorStore};
use std::path::Path;
use tracing::{info, instrument};

/// Summary of an index build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexReport {
    pub source: String,
    pub chunks_indexed: usize,
    pub chunks_replaced: usize,
}

/// Builds the snippet index from a text file.
pub struct SnippetIndexer<'a> {
    store: &'a dyn VectorStore,
    embedder: &'a dyn Embedder,
    chunker: SnippetChunker,
    source_tag: String,
}

impl<'a> SnippetIndexer<'a> {
    pub fn new(
        store: &'a dyn VectorStore,
        embedder: &'a dyn Embedder,
        settings: &IndexSettings,
    ) -> Result<Self> {
        let chunker = SnippetChunker::new(ChunkingConfig {
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
        })?;

        Ok(Self {
            store,
            embedder,
            chunker,
            source_tag: settings.source_tag.clone(),
        })
    }

    /// Index the snippet file at `path`.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn build_from_file(&self, path: &Path) -> Result<IndexReport> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AnimagenError::InvalidInput(format!("Cannot read snippets {}: {}", path.display(), e))
        })?;
        self.build_from_text(&text).await
    }

    /// Index snippet text already in memory.
    pub async fn build_from_text(&self, text: &str) -> Result<IndexReport> {
        let chunks = self.chunker.chunk(text);
        if chunks.is_empty() {
            return Err(AnimagenError::InvalidInput(
                "Snippet document is empty".to_string(),
            ));
        }
        info!("Split snippets into {} chunks", chunks.len());

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(AnimagenError::Embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let documents: Vec<Document> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| {
                Document::new(self.source_tag.clone(), chunk.content, embedding, chunk.order)
            })
            .collect();

        let replaced = self.store.delete_by_source(&self.source_tag).await?;
        let indexed = self.store.upsert_batch(&documents).await?;

        info!("Indexed {} chunks ({} replaced)", indexed, replaced);
        Ok(IndexReport {
            source: self.source_tag.clone(),
            chunks_indexed: indexed,
            chunks_replaced: replaced,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::MemoryVectorStore;
    use async_trait::async_trait;

    struct LengthEmbedder;

    #[async_trait]
    impl Embedder for LengthEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(vec![text.len() as f32, 1.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    fn small_chunks() -> IndexSettings {
        IndexSettings {
            chunk_size: 60,
            chunk_overlap: 10,
            ..IndexSettings::default()
        }
    }

    #[tokio::test]
    async fn test_build_from_file_replaces_previous_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snippets.txt");
        let text = (0..12)
            .map(|i| format!("circle_{i} = Circle(radius={i})"))
            .collect::<Vec<_>>()
            .join("\n");
        std::fs::write(&path, &text).unwrap();

        let store = MemoryVectorStore::new();
        let indexer = SnippetIndexer::new(&store, &LengthEmbedder, &small_chunks()).unwrap();

        let first = indexer.build_from_file(&path).await.unwrap();
        assert!(first.chunks_indexed > 1);
        assert_eq!(first.chunks_replaced, 0);
        assert_eq!(first.source, "snippets");

        let second = indexer.build_from_file(&path).await.unwrap();
        assert_eq!(second.chunks_replaced, first.chunks_indexed);
        assert_eq!(store.document_count().await.unwrap(), second.chunks_indexed);
    }

    #[tokio::test]
    async fn test_empty_document_is_rejected() {
        let store = MemoryVectorStore::new();
        let indexer = SnippetIndexer::new(&store, &LengthEmbedder, &small_chunks()).unwrap();
        assert!(matches!(
            indexer.build_from_text("\n\n").await,
            Err(AnimagenError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let store = MemoryVectorStore::new();
        let indexer = SnippetIndexer::new(&store, &LengthEmbedder, &small_chunks()).unwrap();
        let err = indexer
            .build_from_file(Path::new("/definitely/not/here.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, AnimagenError::InvalidInput(_)));
    }
}
