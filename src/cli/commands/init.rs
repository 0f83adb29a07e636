//! Init command - interactive first-run setup.

use super::doctor::install_hint_manim;
use crate::cli::preflight;
use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::io::{self, Write};

/// Run the init command for first-time setup.
pub fn run_init(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Animagen Setup");
    println!();
    println!("Welcome to Animagen! Let's make sure everything is configured correctly.\n");

    // Step 1: Renderer
    println!("{}", style("Step 1: Checking the renderer").bold().cyan());
    println!();

    let renderer = &settings.render.command;
    if preflight::check_tool(renderer).is_err() {
        Output::warning(&format!("{} was not found.", renderer));
        println!("    {} {}", style("→").dim(), style(install_hint_manim()).dim());
        println!();

        if !prompt_continue("Continue anyway?")? {
            println!();
            Output::info("Setup cancelled. Install the renderer and run 'animagen init' again.");
            return Ok(());
        }
    } else {
        Output::success(&format!("{} is installed!", renderer));
    }

    println!();

    // Step 2: Model API
    println!("{}", style("Step 2: Checking API configuration").bold().cyan());
    println!();

    let key_var = &settings.llm.api_key_env;
    if let Some(base) = &settings.llm.api_base {
        Output::info(&format!("Using model endpoint {}", base));
    } else if std::env::var(key_var).is_err() {
        Output::warning(&format!("{} environment variable is not set.", key_var));
        println!();
        println!("  Animagen needs an API key for code generation and embeddings.");
        println!("  Set it in your shell configuration (~/.bashrc, ~/.zshrc, etc.):");
        println!("  {}", style(format!("export {}='sk-...'", key_var)).green());
        println!();
        println!("  Or point llm.api_base at a local OpenAI-compatible server.");
        println!();

        if !prompt_continue("Continue without API key?")? {
            println!();
            Output::info("Setup cancelled. Set your API key and run 'animagen init' again.");
            return Ok(());
        }
    } else {
        Output::success("API key is configured!");
    }

    println!();

    // Step 3: Directories
    println!("{}", style("Step 3: Setting up directories").bold().cyan());
    println!();

    for (name, dir) in [
        ("data", settings.data_dir()),
        ("scripts", settings.scripts_dir()),
        ("output", settings.output_dir()),
    ] {
        if dir.exists() {
            Output::info(&format!("The {} directory exists: {}", name, dir.display()));
        } else {
            std::fs::create_dir_all(&dir)?;
            Output::success(&format!("Created {} directory: {}", name, dir.display()));
        }
    }

    println!();

    // Step 4: Config file
    println!("{}", style("Step 4: Configuration file").bold().cyan());
    println!();

    let config_path = Settings::default_config_path();
    if config_path.exists() {
        Output::info(&format!("Config file exists: {}", config_path.display()));
    } else if prompt_continue("Create default configuration file?")? {
        settings.save_to(&config_path)?;
        Output::success(&format!("Created config file: {}", config_path.display()));
        println!();
        println!("  Edit your config with: {}", style("animagen config edit").green());
    } else {
        Output::info("Skipped config file creation. Using defaults.");
    }

    println!();

    println!("{}", style("Setup Complete!").bold().green());
    println!();
    println!("Next steps:");
    println!("  {} Build the snippet index", style("animagen index --snippets snippets.txt").cyan());
    println!("  {} Check system status", style("animagen doctor").cyan());
    println!("  {} Render your first scene", style("animagen generate \"draw a red circle\"").cyan());
    println!();
    println!("For more help: {}", style("animagen --help").cyan());

    Ok(())
}

/// Prompt user for yes/no confirmation.
fn prompt_continue(message: &str) -> io::Result<bool> {
    print!("{} {} ", style("?").cyan(), message);
    print!("{} ", style("[y/N]").dim());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(is_yes(&input))
}

fn is_yes(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}
