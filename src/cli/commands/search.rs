//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::embedding::OpenAIEmbedder;
use crate::rag::ContextBuilder;
use crate::vector_store::SqliteVectorStore;
use anyhow::Result;
use std::sync::Arc;

/// Run the search command.
pub async fn run_search(query: &str, limit: usize, min_score: f32, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Search, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let store = Arc::new(SqliteVectorStore::open_existing(&settings.sqlite_path())?);
    let embedder = Arc::new(OpenAIEmbedder::new(&settings.llm, &settings.embedding)?);

    let context_builder = ContextBuilder::new(store, embedder)
        .with_max_chunks(limit)
        .with_min_score(min_score);

    let spinner = Output::spinner("Searching...");
    let results = context_builder.build(query).await;
    spinner.finish_and_clear();

    match results {
        Ok(chunks) => {
            if chunks.is_empty() {
                Output::warning("No snippets found matching your query.");
            } else {
                Output::success(&format!("Found {} snippets", chunks.len()));
                for (i, chunk) in chunks.iter().enumerate() {
                    Output::search_result(i + 1, &chunk.source, chunk.score, &chunk.content);
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
