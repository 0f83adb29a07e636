//! Scene script materialization.

use crate::error::{AnimagenError, Result};
use std::path::Path;
use tracing::debug;

/// Indentation of statements inside `construct`.
pub const BODY_INDENT: &str = "        ";

/// Fixed scene template the generated body is spliced into.
#[derive(Debug, Clone)]
pub struct SceneTemplate {
    scene_class: String,
}

impl SceneTemplate {
    pub fn new(scene_class: impl Into<String>) -> Self {
        Self {
            scene_class: scene_class.into(),
        }
    }

    pub fn scene_class(&self) -> &str {
        &self.scene_class
    }

    /// Full script text for `code`.
    pub fn render(&self, code: &str) -> String {
        format!(
            "from manim import *\n\nclass {}(Scene):\n    def construct(self):\n{}\n",
            self.scene_class,
            indent_body(code)
        )
    }

    /// Write the script for `code` to `path`, replacing any existing file.
    pub fn write_script(&self, code: &str, path: &Path) -> Result<()> {
        std::fs::write(path, self.render(code)).map_err(|e| {
            AnimagenError::Script(format!("Failed to write {}: {}", path.display(), e))
        })?;
        debug!("Wrote scene script {}", path.display());
        Ok(())
    }
}

impl Default for SceneTemplate {
    fn default() -> Self {
        Self::new("AIAnimation")
    }
}

/// Prefix every non-blank line with [`BODY_INDENT`]; blank lines become empty.
pub fn indent_body(code: &str) -> String {
    code.lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{BODY_INDENT}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
