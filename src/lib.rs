//! Animagen - prompt-to-animation generator
//!
//! Turns a free-text description into a rendered Manim animation.
//!
//! # Overview
//!
//! A run goes through these steps:
//! - retrieve example snippets similar to the prompt and ask a chat model for
//!   scene code
//! - strip markdown fencing and keep only the body of `construct`
//! - reject answers that do not look like scene code
//! - wrap the body in a fixed scene class, render it, and collect the video
//!
//! # Architecture
//!
//! - `config` - Configuration management and prompt templates
//! - `codegen` - Sanitizing model output into a scene script
//! - `render` - Running the renderer and locating its output
//! - `chunking` - Splitting the snippet document
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector database abstraction
//! - `indexer` - Building the snippet index
//! - `rag` - Retrieval-augmented code generation
//! - `pipeline` - Run coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use animagen::config::Settings;
//! use animagen::pipeline::Pipeline;
//! use animagen::rag::RagCodeGenerator;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let generator = Arc::new(RagCodeGenerator::initialize(&settings)?);
//!     let pipeline = Pipeline::new(&settings, generator);
//!
//!     let outcome = pipeline.generate_video("draw a red circle").await?;
//!     println!("{:?}", outcome);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod codegen;
pub mod config;
pub mod embedding;
pub mod error;
pub mod indexer;
pub mod openai;
pub mod pipeline;
pub mod rag;
pub mod render;
pub mod vector_store;

pub use error::{AnimagenError, Result};
