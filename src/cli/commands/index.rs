//! Index command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::embedding::OpenAIEmbedder;
use crate::indexer::SnippetIndexer;
use crate::vector_store::SqliteVectorStore;
use anyhow::Result;

/// Run the index command.
pub async fn run_index(snippets: Option<String>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Code, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let snippets_path = match snippets {
        Some(path) => Settings::expand_path(&path),
        None => settings.snippets_path(),
    };
    let db_path = settings.sqlite_path();

    let store = SqliteVectorStore::new(&db_path)?;
    let embedder = OpenAIEmbedder::new(&settings.llm, &settings.embedding)?;
    let indexer = SnippetIndexer::new(&store, &embedder, &settings.index)?;

    let spinner = Output::spinner(&format!("Indexing {}...", snippets_path.display()));
    let report = indexer.build_from_file(&snippets_path).await;
    spinner.finish_and_clear();

    match report {
        Ok(report) => {
            Output::success(&format!(
                "Indexed {} chunks from {}",
                report.chunks_indexed,
                snippets_path.display()
            ));
            if report.chunks_replaced > 0 {
                Output::kv("Replaced", &report.chunks_replaced.to_string());
            }
            Output::kv("Source", &report.source);
            Output::kv("Index", &db_path.display().to_string());
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Indexing failed: {}", e));
            Err(e.into())
        }
    }
}
