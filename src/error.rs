//! Error types for Animagen.

use thiserror::Error;

/// Library-level error type for Animagen operations.
#[derive(Error, Debug)]
pub enum AnimagenError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Snippet index unavailable: {0}. Build it with 'animagen index'.")]
    IndexUnavailable(String),

    #[error("Code generation failed: {0}")]
    Generation(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Parser error: {0}")]
    Parse(String),

    #[error("Script error: {0}")]
    Script(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Chunking error: {0}")]
    Chunking(#[from] text_splitter::ChunkConfigError),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Animagen operations.
pub type Result<T> = std::result::Result<T, AnimagenError>;
