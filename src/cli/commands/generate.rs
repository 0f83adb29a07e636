//! Generate command implementation.

use super::prompt::resolve_prompt;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::{Pipeline, RunOutcome};
use crate::rag::RagCodeGenerator;
use anyhow::Result;
use std::sync::Arc;

/// Run the generate command.
pub async fn run_generate(words: &[String], settings: Settings) -> Result<()> {
    let prompt = resolve_prompt(words)?;

    if let Err(e) = preflight::check(Operation::Generate, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'animagen doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let generator = Arc::new(RagCodeGenerator::initialize(&settings)?);
    let pipeline = Pipeline::new(&settings, generator);

    Output::stage("generate", &format!("\"{}\"", prompt));
    let spinner = Output::spinner("Generating and rendering scene...");
    let outcome = pipeline.generate_video(&prompt).await;
    spinner.finish_and_clear();

    match outcome? {
        RunOutcome::Rendered { run_id, video, output } => {
            Output::stage("render", &format!("run {} finished", run_id));
            Output::block("Renderer output:", &output.stdout);
            Output::success(&format!("Video saved to {}", video.display()));
            Ok(())
        }
        RunOutcome::Rejected { raw_response, code } => {
            Output::error("Generated code does not look like a scene; nothing was rendered.");
            Output::block("Model response:", &raw_response);
            Output::block("Extracted code:", &code);
            anyhow::bail!("generated code rejected")
        }
        RunOutcome::RenderFailed { run_id, status, output } => {
            let status = status.map_or_else(|| "a signal".to_string(), |s| s.to_string());
            Output::error(&format!("Renderer exited with {} (run {})", status, run_id));
            Output::block("stdout:", &output.stdout);
            Output::block("stderr:", &output.stderr);
            anyhow::bail!("render failed")
        }
        RunOutcome::ArtifactMissing { run_id, output } => {
            Output::error(&format!(
                "Renderer finished but output_{}.mp4 was not found under {}",
                run_id,
                settings.media_dir().display()
            ));
            Output::block("stdout:", &output.stdout);
            Output::block("stderr:", &output.stderr);
            anyhow::bail!("rendered video not found")
        }
        RunOutcome::Failed { run_id, error } => {
            Output::error(&format!("Run {} failed: {}", run_id, error));
            anyhow::bail!("render stage failed")
        }
    }
}
