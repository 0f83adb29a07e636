//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{AnimagenError, Result};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Rendering needs the model API and the renderer.
    Generate,
    /// Code generation and indexing need only the model API.
    Code,
    /// Search needs embeddings.
    Search,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Generate => {
            check_api_key(settings)?;
            check_tool(&settings.render.command)?;
        }
        Operation::Code | Operation::Search => {
            check_api_key(settings)?;
        }
    }
    Ok(())
}

/// Check that the API key variable is set.
///
/// A custom `api_base` (a local server) does not need a key.
fn check_api_key(settings: &Settings) -> Result<()> {
    if settings.llm.api_base.is_some() {
        return Ok(());
    }

    let var = &settings.llm.api_key_env;
    match std::env::var(var) {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(AnimagenError::Config(format!(
            "{var} is empty. Set it with: export {var}='sk-...'"
        ))),
        Err(_) => Err(AnimagenError::Config(format!(
            "{var} not set. Set it with: export {var}='sk-...'"
        ))),
    }
}

/// Check if an external tool is available.
pub fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(AnimagenError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(AnimagenError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(AnimagenError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_api_base_needs_no_key() {
        let mut settings = Settings::default();
        settings.llm.api_base = Some("http://localhost:11434/v1".to_string());
        settings.llm.api_key_env = "ANIMAGEN_TEST_UNSET_KEY".to_string();
        assert!(check(Operation::Search, &settings).is_ok());
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let mut settings = Settings::default();
        settings.llm.api_key_env = "ANIMAGEN_TEST_UNSET_KEY".to_string();
        assert!(matches!(
            check(Operation::Code, &settings),
            Err(AnimagenError::Config(_))
        ));
    }

    #[test]
    fn test_missing_tool() {
        assert!(matches!(
            check_tool("animagen-definitely-missing-tool"),
            Err(AnimagenError::ToolNotFound(_))
        ));
    }
}
