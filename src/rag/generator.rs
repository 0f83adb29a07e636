//! Retrieval-augmented scene code generation.

use super::context::{format_context_for_prompt, ContextBuilder};
use super::{CodeGenerator, ContextChunk};
use crate::config::{Prompts, Settings, CODE_ONLY_INSTRUCTION};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{AnimagenError, Result};
use crate::openai::create_client;
use crate::vector_store::{SqliteVectorStore, VectorStore};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Generates scene code from the snippet index and a chat model.
pub struct RagCodeGenerator {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
    context_builder: ContextBuilder,
    prompts: Prompts,
}

impl RagCodeGenerator {
    /// Open the persisted snippet index and set up the model clients.
    ///
    /// Fails with [`AnimagenError::IndexUnavailable`] when the index has not
    /// been built.
    pub fn initialize(settings: &Settings) -> Result<Self> {
        let store: Arc<dyn VectorStore> =
            Arc::new(SqliteVectorStore::open_existing(&settings.sqlite_path())?);
        let embedder: Arc<dyn Embedder> =
            Arc::new(OpenAIEmbedder::new(&settings.llm, &settings.embedding)?);
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        Self::with_components(settings, store, embedder, prompts)
    }

    /// Build a generator over explicit components.
    pub fn with_components(
        settings: &Settings,
        vector_store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        prompts: Prompts,
    ) -> Result<Self> {
        let context_builder = ContextBuilder::new(vector_store, embedder)
            .with_max_chunks(settings.rag.max_context_chunks as usize)
            .with_min_score(settings.rag.min_score);

        Ok(Self {
            client: create_client(&settings.llm)?,
            model: settings.llm.model.clone(),
            temperature: settings.llm.temperature,
            context_builder,
            prompts,
        })
    }

    /// The user message for `prompt` given retrieved snippets.
    pub fn user_message(&self, prompt: &str, chunks: &[ContextChunk]) -> String {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), compose_query(prompt));
        vars.insert("context".to_string(), format_context_for_prompt(chunks));
        self.prompts
            .render_with_custom(&self.prompts.generation.user, &vars)
    }
}

/// The instruction-prefixed query sent to the model.
pub fn compose_query(prompt: &str) -> String {
    format!("{}{}", CODE_ONLY_INSTRUCTION, prompt.trim())
}

#[async_trait]
impl CodeGenerator for RagCodeGenerator {
    #[instrument(skip(self), fields(prompt = %prompt))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let chunks = self.context_builder.build(prompt).await?;
        info!("Generating scene code with {} snippets", chunks.len());

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.prompts.generation.system.clone())
                .build()
                .map_err(|e| AnimagenError::Generation(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(self.user_message(prompt, &chunks))
                .build()
                .map_err(|e| AnimagenError::Generation(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| AnimagenError::Generation(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            AnimagenError::OpenAI(format!("Failed to generate code: {}", e))
        })?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| AnimagenError::Generation("Empty response from LLM".to_string()))?
            .trim()
            .to_string();

        debug!("Model returned {} characters", answer.len());
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::MemoryVectorStore;

    struct ZeroEmbedder;

    #[async_trait]
    impl Embedder for ZeroEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(vec![vec![0.0]; texts.len()])
        }

        fn dimensions(&self) -> usize {
            1
        }
    }

    #[test]
    fn test_compose_query() {
        let query = compose_query("  draw a red circle ");
        assert!(query.starts_with("Return only the Python code for the body of the construct method"));
        assert!(query.ends_with("\ndraw a red circle"));
    }

    #[test]
    fn test_user_message_includes_snippets_and_instruction() {
        let generator = RagCodeGenerator::with_components(
            &Settings::default(),
            Arc::new(MemoryVectorStore::new()),
            Arc::new(ZeroEmbedder),
            Prompts::default(),
        )
        .unwrap();

        let chunks = vec![ContextChunk {
            source: "snippets".into(),
            content: "self.play(Create(Square()))".into(),
            score: 0.8,
        }];
        let message = generator.user_message("draw a square", &chunks);

        assert!(message.contains("self.play(Create(Square()))"));
        assert!(message.contains(CODE_ONLY_INSTRUCTION));
        assert!(message.ends_with("draw a square"));
    }

    #[test]
    fn test_initialize_without_index_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.vector_store.sqlite_path = dir.path().join("none.db").display().to_string();

        let err = RagCodeGenerator::initialize(&settings).err().unwrap();
        assert!(matches!(err, AnimagenError::IndexUnavailable(_)));
    }
}
