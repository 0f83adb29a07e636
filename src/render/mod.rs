//! Rendering generated scripts with an external tool.
//!
//! A render moves through
//! `Idle → ScriptWritten → Rendering → {ArtifactFound | ArtifactMissing | RenderFailed} → CleanedUp`.
//! [`ScriptGuard`] owns the script from `ScriptWritten` on and deletes it when
//! dropped, so `CleanedUp` is reached on every path, including errors.

mod invoker;
mod locate;

pub use invoker::{CapturedOutput, RenderInvoker, RenderOutcome};
pub use locate::{ArtifactLocator, RecursiveSearch};

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Render lifecycle states, used in log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStage {
    Idle,
    ScriptWritten,
    Rendering,
    ArtifactFound,
    ArtifactMissing,
    RenderFailed,
    CleanedUp,
}

impl std::fmt::Display for RenderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RenderStage::Idle => "idle",
            RenderStage::ScriptWritten => "script_written",
            RenderStage::Rendering => "rendering",
            RenderStage::ArtifactFound => "artifact_found",
            RenderStage::ArtifactMissing => "artifact_missing",
            RenderStage::RenderFailed => "render_failed",
            RenderStage::CleanedUp => "cleaned_up",
        };
        f.write_str(name)
    }
}

/// Deletes the generated script when dropped.
#[derive(Debug)]
pub struct ScriptGuard {
    path: PathBuf,
}

impl ScriptGuard {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScriptGuard {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(stage = %RenderStage::CleanedUp, "Removed {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove script {}: {}", self.path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_removes_script() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ai_scene_1.py");
        std::fs::write(&path, "x = 1").unwrap();

        {
            let guard = ScriptGuard::new(path.clone());
            assert_eq!(guard.path(), path.as_path());
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_guard_tolerates_missing_script() {
        let dir = tempfile::tempdir().unwrap();
        drop(ScriptGuard::new(dir.path().join("never_written.py")));
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(RenderStage::ArtifactMissing.to_string(), "artifact_missing");
        assert_eq!(RenderStage::CleanedUp.to_string(), "cleaned_up");
    }
}
