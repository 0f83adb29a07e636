//! Snippet chunking for the similarity index.
//!
//! Splits a snippet document into overlapping, character-sized chunks. The
//! splitter prefers paragraph and line boundaries, so a code example usually
//! stays whole when it fits in one chunk.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use text_splitter::{ChunkConfig, TextSplitter};

/// A chunk of a snippet document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SnippetChunk {
    /// Text content of this chunk.
    pub content: String,
    /// Order of this chunk in the source.
    pub order: i32,
}

/// Configuration for chunking.
#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    /// Maximum characters per chunk.
    pub chunk_size: usize,
    /// Characters repeated between neighbouring chunks.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Splits snippet text into overlapping chunks.
pub struct SnippetChunker {
    splitter: TextSplitter<text_splitter::Characters>,
}

impl SnippetChunker {
    /// Build a chunker; fails when the overlap is not smaller than the chunk size.
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        let chunk_config = ChunkConfig::new(config.chunk_size).with_overlap(config.chunk_overlap)?;
        Ok(Self {
            splitter: TextSplitter::new(chunk_config),
        })
    }

    /// Split `text` into ordered chunks, skipping whitespace-only pieces.
    pub fn chunk(&self, text: &str) -> Vec<SnippetChunk> {
        self.splitter
            .chunks(text)
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .enumerate()
            .map(|(i, content)| SnippetChunk {
                content: content.to_string(),
                order: i as i32,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunker = SnippetChunker::new(ChunkingConfig::default()).unwrap();
        let chunks = chunker.chunk("circle = Circle()\nself.play(Create(circle))\n");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].order, 0);
        assert!(chunks[0].content.starts_with("circle = Circle()"));
    }

    #[test]
    fn test_long_text_respects_capacity() {
        let chunker = SnippetChunker::new(ChunkingConfig {
            chunk_size: 100,
            chunk_overlap: 20,
        })
        .unwrap();

        let text = (0..40)
            .map(|i| format!("square_{i} = Square()"))
            .collect::<Vec<_>>()
            .join("\n");
        let chunks = chunker.chunk(&text);

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.content.chars().count() <= 100));
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.order, i as i32);
        }
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        let chunker = SnippetChunker::new(ChunkingConfig::default()).unwrap();
        assert!(chunker.chunk("   \n\n").is_empty());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        let result = SnippetChunker::new(ChunkingConfig {
            chunk_size: 100,
            chunk_overlap: 100,
        });
        assert!(result.is_err());
    }
}
