//! Locating the renderer's output file.
//!
//! manim nests videos under `<media_dir>/videos/<script>/<quality>/`, and that
//! layout changes between versions, so the file is found by name instead of
//! by a computed path.

use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Finds a rendered artifact by file name under a root directory.
pub trait ArtifactLocator: Send + Sync {
    fn locate(&self, root: &Path, file_name: &str) -> Result<Option<PathBuf>>;
}

/// Depth-first directory walk returning the first file with a matching name.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecursiveSearch;

impl ArtifactLocator for RecursiveSearch {
    fn locate(&self, root: &Path, file_name: &str) -> Result<Option<PathBuf>> {
        if !root.is_dir() {
            debug!("Media directory {:?} does not exist", root);
            return Ok(None);
        }

        let mut pending = vec![root.to_path_buf()];

        while let Some(dir) = pending.pop() {
            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                // The root itself must be readable, nested dirs are best effort
                Err(e) if dir != root => {
                    warn!("Skipping unreadable directory {:?}: {}", dir, e);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            for entry in entries.flatten() {
                let path = entry.path();
                let Ok(file_type) = entry.file_type() else {
                    continue;
                };

                if file_type.is_dir() {
                    pending.push(path);
                } else if file_type.is_file() && entry.file_name() == file_name {
                    debug!("Found artifact at {:?}", path);
                    return Ok(Some(path));
                }
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_nested_file() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("videos").join("ai_scene_1").join("480p15");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("output_1.mp4"), b"mp4").unwrap();
        std::fs::write(nested.join("other.mp4"), b"mp4").unwrap();

        let found = RecursiveSearch.locate(dir.path(), "output_1.mp4").unwrap();
        assert_eq!(found, Some(nested.join("output_1.mp4")));
    }

    #[test]
    fn test_directory_with_same_name_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("output_1.mp4")).unwrap();

        assert_eq!(RecursiveSearch.locate(dir.path(), "output_1.mp4").unwrap(), None);
    }

    #[test]
    fn test_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let found = RecursiveSearch
            .locate(&dir.path().join("media"), "output_1.mp4")
            .unwrap();
        assert!(found.is_none());
    }
}
