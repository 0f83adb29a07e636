//! Configuration module for Animagen.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{GenerationPrompts, Prompts, CODE_ONLY_INSTRUCTION};
pub use settings::{
    EmbeddingSettings, GeneralSettings, IndexSettings, LlmSettings, PromptSettings,
    RagSettings, RenderSettings, Settings, ValidationSettings, VectorStoreSettings,
};
