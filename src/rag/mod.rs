//! Retrieval-augmented generation of scene code.
//!
//! The pipeline only depends on [`CodeGenerator`]; [`RagCodeGenerator`] is the
//! production implementation backed by the snippet index and a chat model.

pub mod context;
mod generator;

pub use context::ContextBuilder;
pub use generator::{compose_query, RagCodeGenerator};

use crate::error::Result;
use crate::vector_store::SearchResult;
use async_trait::async_trait;

/// Text-in, text-out source of scene code.
///
/// Implementations give no guarantee about formatting: the answer may be
/// fenced, wrapped in prose, or a whole class definition.
#[async_trait]
pub trait CodeGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// A retrieved snippet chunk.
#[derive(Debug, Clone)]
pub struct ContextChunk {
    pub source: String,
    pub content: String,
    pub score: f32,
}

impl From<SearchResult> for ContextChunk {
    fn from(result: SearchResult) -> Self {
        Self {
            source: result.document.source,
            content: result.document.content,
            score: result.score,
        }
    }
}
