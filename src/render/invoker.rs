//! External renderer invocation.

use super::locate::{ArtifactLocator, RecursiveSearch};
use super::RenderStage;
use crate::config::RenderSettings;
use crate::error::{AnimagenError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// Captured renderer output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Result of one render attempt.
#[derive(Debug, Clone)]
pub enum RenderOutcome {
    /// The video was produced and moved to its final path.
    Rendered { video: PathBuf, output: CapturedOutput },
    /// The renderer exited with a non-zero status.
    Failed {
        status: Option<i32>,
        output: CapturedOutput,
    },
    /// The renderer succeeded but no file with the expected name exists.
    ArtifactMissing { output: CapturedOutput },
}

impl RenderOutcome {
    pub fn stage(&self) -> RenderStage {
        match self {
            RenderOutcome::Rendered { .. } => RenderStage::ArtifactFound,
            RenderOutcome::Failed { .. } => RenderStage::RenderFailed,
            RenderOutcome::ArtifactMissing { .. } => RenderStage::ArtifactMissing,
        }
    }
}

/// Runs the renderer on a scene script and collects the resulting video.
pub struct RenderInvoker {
    command: String,
    quality_flag: String,
    scene_class: String,
    media_dir: PathBuf,
    locator: Arc<dyn ArtifactLocator>,
}

impl RenderInvoker {
    pub fn new(settings: &RenderSettings, media_dir: PathBuf) -> Self {
        Self {
            command: settings.command.clone(),
            quality_flag: settings.quality_flag.clone(),
            scene_class: settings.scene_class.clone(),
            media_dir,
            locator: Arc::new(RecursiveSearch),
        }
    }

    /// Replace the artifact search strategy.
    pub fn with_locator(mut self, locator: Arc<dyn ArtifactLocator>) -> Self {
        self.locator = locator;
        self
    }

    /// Arguments passed to the renderer for `script`.
    pub fn args(&self, script: &Path, output_name: &str) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::with_capacity(7);
        if !self.quality_flag.is_empty() {
            args.push(self.quality_flag.clone().into());
        }
        args.push(script.as_os_str().to_owned());
        args.push(self.scene_class.clone().into());
        args.push("--media_dir".into());
        args.push(self.media_dir.as_os_str().to_owned());
        args.push("--output_file".into());
        args.push(output_name.into());
        args
    }

    /// Render `script`, then move the `output_name` artifact to `destination`.
    ///
    /// Blocks until the renderer exits; there is no timeout.
    #[instrument(skip(self, destination), fields(script = %script.display()))]
    pub async fn render(
        &self,
        script: &Path,
        output_name: &str,
        destination: &Path,
    ) -> Result<RenderOutcome> {
        info!(stage = %RenderStage::Rendering, "Running {}", self.command);

        let result = Command::new(&self.command)
            .args(self.args(script, output_name))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        let raw = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AnimagenError::ToolNotFound(self.command.clone()));
            }
            Err(e) => {
                return Err(AnimagenError::Render(format!(
                    "{} execution failed: {e}",
                    self.command
                )));
            }
        };

        let output = CapturedOutput {
            stdout: String::from_utf8_lossy(&raw.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&raw.stderr).into_owned(),
        };

        if !raw.status.success() {
            warn!(stage = %RenderStage::RenderFailed, "{} exited with {}", self.command, raw.status);
            return Ok(RenderOutcome::Failed {
                status: raw.status.code(),
                output,
            });
        }

        let Some(artifact) = self.locate(output_name).await? else {
            warn!(
                stage = %RenderStage::ArtifactMissing,
                "No {} under {:?}", output_name, self.media_dir
            );
            return Ok(RenderOutcome::ArtifactMissing { output });
        };

        move_file(&artifact, destination).await?;
        info!(stage = %RenderStage::ArtifactFound, "Video moved to {}", destination.display());

        Ok(RenderOutcome::Rendered {
            video: destination.to_path_buf(),
            output,
        })
    }
}

impl RenderInvoker {
    /// Run the locator's directory walk on the blocking pool.
    async fn locate(&self, output_name: &str) -> Result<Option<PathBuf>> {
        let locator = Arc::clone(&self.locator);
        let root = self.media_dir.clone();
        let name = output_name.to_string();

        tokio::task::spawn_blocking(move || locator.locate(&root, &name))
            .await
            .map_err(|e| AnimagenError::Render(format!("Artifact search failed: {}", e)))?
    }
}

/// Rename `from` to `to`, copying when they sit on different filesystems.
async fn move_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    if let Err(e) = tokio::fs::rename(from, to).await {
        debug!("Rename failed ({}), copying instead", e);
        tokio::fs::copy(from, to).await.map_err(|e| {
            AnimagenError::Render(format!(
                "Failed to move {} to {}: {}",
                from.display(),
                to.display(),
                e
            ))
        })?;
        tokio::fs::remove_file(from).await?;
    }

    Ok(())
}
