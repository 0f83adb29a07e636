//! CLI module for Animagen.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Animagen - prompt-to-animation generator
///
/// Turns a natural-language description into a Manim scene, renders it, and
/// leaves the video in the output directory.
#[derive(Parser, Debug)]
#[command(name = "animagen")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate and render an animation from a description
    Generate {
        /// What to animate (prompted for when omitted)
        prompt: Vec<String>,
    },

    /// Generate scene code without rendering it
    Code {
        /// What to animate (prompted for when omitted)
        prompt: Vec<String>,
    },

    /// Build the snippet similarity index
    Index {
        /// Snippet document to index (defaults to index.snippets_path)
        #[arg(short, long)]
        snippets: Option<String>,
    },

    /// Search the snippet index
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "4")]
        limit: usize,

        /// Minimum similarity score (0.0-1.0)
        #[arg(short, long, default_value = "0.0")]
        min_score: f32,
    },

    /// Start the HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "5000")]
        port: u16,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Create directories and a default configuration
    Init,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
