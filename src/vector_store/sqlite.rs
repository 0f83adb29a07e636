//! SQLite-based vector store implementation.
//!
//! Uses SQLite with cosine similarity computed in Rust. The snippet
//! knowledge base is small, so a brute-force scan is enough.

use super::{rank, Document, IndexedSource, SearchResult, VectorStore};
use crate::error::{AnimagenError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS documents (
        id TEXT PRIMARY KEY,
        source TEXT NOT NULL,
        content TEXT NOT NULL,
        embedding BLOB NOT NULL,
        chunk_order INTEGER NOT NULL,
        indexed_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_documents_source ON documents(source);
"#;

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Open (creating if needed) a SQLite vector store.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a previously built index, failing if it is missing or empty.
    pub fn open_existing(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AnimagenError::IndexUnavailable(format!(
                "{} does not exist",
                path.display()
            )));
        }

        let store = Self::new(path).map_err(|e| {
            AnimagenError::IndexUnavailable(format!("{}: {}", path.display(), e))
        })?;

        let count = store.count()?;
        if count == 0 {
            return Err(AnimagenError::IndexUnavailable(format!(
                "{} contains no snippets",
                path.display()
            )));
        }

        debug!("Opened snippet index with {} documents", count);
        Ok(store)
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            AnimagenError::VectorStore(format!("Failed to acquire lock: {}", e))
        })
    }

    fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn parse_timestamp(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, docs))]
    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        for doc in docs {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO documents
                (id, source, content, embedding, chunk_order, indexed_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    doc.id.to_string(),
                    doc.source,
                    doc.content,
                    Self::embedding_to_bytes(&doc.embedding),
                    doc.chunk_order,
                    doc.indexed_at.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        info!("Batch upserted {} documents", docs.len());
        Ok(docs.len())
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        self.search_with_threshold(query_embedding, limit, f32::MIN).await
    }

    #[instrument(skip(self, query_embedding))]
    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT id, source, content, embedding, chunk_order, indexed_at FROM documents",
        )?;

        let docs = stmt.query_map([], |row| {
            let id_str: String = row.get(0)?;
            let embedding_bytes: Vec<u8> = row.get(3)?;
            let indexed_at_str: String = row.get(5)?;

            Ok(Document {
                id: uuid::Uuid::parse_str(&id_str).unwrap_or_default(),
                source: row.get(1)?,
                content: row.get(2)?,
                embedding: Self::bytes_to_embedding(&embedding_bytes),
                chunk_order: row.get(4)?,
                indexed_at: Self::parse_timestamp(&indexed_at_str),
            })
        })?;

        let results = rank(docs.filter_map(|d| d.ok()), query_embedding, limit, min_score);

        debug!("Found {} matching documents", results.len());
        Ok(results)
    }

    #[instrument(skip(self))]
    async fn delete_by_source(&self, source: &str) -> Result<usize> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM documents WHERE source = ?1", params![source])?;

        info!("Deleted {} documents for source {}", deleted, source);
        Ok(deleted)
    }

    async fn list_sources(&self) -> Result<Vec<IndexedSource>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT source, COUNT(*) as chunk_count, MAX(indexed_at) as indexed_at
            FROM documents
            GROUP BY source
            ORDER BY indexed_at DESC
            "#,
        )?;

        let sources = stmt.query_map([], |row| {
            let indexed_at_str: String = row.get(2)?;
            Ok(IndexedSource {
                source: row.get(0)?,
                chunk_count: row.get(1)?,
                indexed_at: Self::parse_timestamp(&indexed_at_str),
            })
        })?;

        Ok(sources.filter_map(|s| s.ok()).collect())
    }

    async fn document_count(&self) -> Result<usize> {
        self.count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_vector_store() {
        let store = SqliteVectorStore::in_memory().unwrap();

        let doc = Document::new(
            "snippets".to_string(),
            "self.play(Create(Circle()))".to_string(),
            vec![1.0, 0.0, 0.0],
            0,
        );
        store.upsert_batch(&[doc]).await.unwrap();

        let sources = store.list_sources().await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].source, "snippets");

        let results = store.search(&[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!((results[0].score - 1.0).abs() < 0.001);
        assert_eq!(results[0].document.embedding, vec![1.0, 0.0, 0.0]);

        let deleted = store.delete_by_source("snippets").await.unwrap();
        assert_eq!(deleted, 1);
        assert!(store.list_sources().await.unwrap().is_empty());
    }

    #[test]
    fn test_open_existing_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SqliteVectorStore::open_existing(&dir.path().join("missing.db"))
            .err()
            .unwrap();
        assert!(matches!(err, AnimagenError::IndexUnavailable(_)));
    }

    #[tokio::test]
    async fn test_open_existing_requires_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");

        SqliteVectorStore::new(&path).unwrap();
        assert!(matches!(
            SqliteVectorStore::open_existing(&path),
            Err(AnimagenError::IndexUnavailable(_))
        ));

        let store = SqliteVectorStore::new(&path).unwrap();
        store
            .upsert_batch(&[Document::new("snippets".into(), "x = 1".into(), vec![1.0], 0)])
            .await
            .unwrap();
        drop(store);

        let reopened = SqliteVectorStore::open_existing(&path).unwrap();
        assert_eq!(reopened.document_count().await.unwrap(), 1);
    }
}
