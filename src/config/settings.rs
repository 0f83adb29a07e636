//! Configuration settings for Animagen.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub llm: LlmSettings,
    pub embedding: EmbeddingSettings,
    pub vector_store: VectorStoreSettings,
    pub index: IndexSettings,
    pub rag: RagSettings,
    pub render: RenderSettings,
    pub validation: ValidationSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Directory where generated scene scripts are written (and removed).
    pub scripts_dir: String,
    /// Directory that receives finished `output_<timestamp>.mp4` files.
    pub output_dir: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.animagen".to_string(),
            scripts_dir: ".".to_string(),
            output_dir: ".".to_string(),
        }
    }
}

/// Language model endpoint settings.
///
/// Any OpenAI-compatible endpoint works, e.g. a local Ollama server at
/// `http://localhost:11434/v1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Base URL of the API. `None` uses the OpenAI default.
    pub api_base: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Chat model used for code generation.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_base: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            timeout_seconds: 300,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Path to the SQLite database holding the snippet index.
    pub sqlite_path: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            sqlite_path: "~/.animagen/vectorstore.db".to_string(),
        }
    }
}

/// Snippet index builder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Snippet document loaded by `animagen index`.
    pub snippets_path: String,
    /// Chunk capacity in characters.
    pub chunk_size: usize,
    /// Characters shared between neighbouring chunks.
    pub chunk_overlap: usize,
    /// Source tag stored with every chunk.
    pub source_tag: String,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            snippets_path: "snippets.txt".to_string(),
            chunk_size: 1000,
            chunk_overlap: 200,
            source_tag: "snippets".to_string(),
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// Maximum number of snippet chunks passed to the model.
    pub max_context_chunks: u32,
    /// Minimum cosine similarity for a chunk to be used.
    pub min_score: f32,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            max_context_chunks: 4,
            min_score: 0.0,
        }
    }
}

/// External renderer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Renderer executable.
    pub command: String,
    /// Quality flag passed before the script path.
    pub quality_flag: String,
    /// Scene class declared by the generated script.
    pub scene_class: String,
    /// Root directory the renderer writes its media tree into.
    pub media_dir: String,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            command: "manim".to_string(),
            quality_flag: "-ql".to_string(),
            scene_class: "AIAnimation".to_string(),
            media_dir: "media".to_string(),
        }
    }
}

/// Plausibility check settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    /// Substrings that mark code as plausible scene code.
    pub signals: Vec<String>,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            signals: crate::codegen::DEFAULT_SIGNALS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::AnimagenError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("animagen")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    pub fn scripts_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.scripts_dir)
    }

    pub fn output_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.output_dir)
    }

    pub fn media_dir(&self) -> PathBuf {
        Self::expand_path(&self.render.media_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.vector_store.sqlite_path)
    }

    pub fn snippets_path(&self) -> PathBuf {
        Self::expand_path(&self.index.snippets_path)
    }
}
