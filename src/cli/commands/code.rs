//! Code command implementation.

use super::prompt::resolve_prompt;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use crate::rag::RagCodeGenerator;
use anyhow::Result;
use std::sync::Arc;

/// Run the code command: print the sanitized `construct` body.
pub async fn run_code(words: &[String], settings: Settings) -> Result<()> {
    let prompt = resolve_prompt(words)?;

    if let Err(e) = preflight::check(Operation::Code, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'animagen doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let generator = Arc::new(RagCodeGenerator::initialize(&settings)?);
    let pipeline = Pipeline::new(&settings, generator);

    let spinner = Output::spinner("Generating scene code...");
    let generated = pipeline.generate_code(&prompt).await;
    spinner.finish_and_clear();

    let generated = generated?;
    if !generated.structured {
        Output::warning("No construct method found; printing the extracted code as-is.");
    }
    println!("{}", generated.code);

    Ok(())
}
