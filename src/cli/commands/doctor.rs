//! Doctor command - verify system requirements and configuration.

use crate::cli::Output;
use crate::config::Settings;
use crate::vector_store::{SqliteVectorStore, VectorStore};
use console::style;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

fn print_section(title: &str, checks: &[CheckResult]) {
    println!("{}", style(title).bold());
    for check in checks {
        check.print();
    }
    println!();
}

/// Run all diagnostic checks.
pub async fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Animagen Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let tools = vec![check_renderer(&settings.render.command)];
    print_section("Renderer", &tools);

    let api = vec![check_api_key(settings)];
    print_section("Model API", &api);

    let index = vec![check_index(settings).await];
    print_section("Snippet Index", &index);

    let dirs = check_directories(settings);
    print_section("Directories", &dirs);

    let config = vec![check_config_file()];
    print_section("Configuration", &config);

    let checks: Vec<CheckResult> = tools
        .into_iter()
        .chain(api)
        .chain(index)
        .chain(dirs)
        .chain(config)
        .collect();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Animagen.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Animagen is ready to use.");
    }

    Ok(())
}

/// Check that the renderer runs.
fn check_renderer(command: &str) -> CheckResult {
    match Command::new(command).arg("--version").output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .find(|l| !l.trim().is_empty())
                .unwrap_or("installed")
                .trim()
                .to_string();

            let version_display = if version.chars().count() > 50 {
                format!("{}...", version.chars().take(50).collect::<String>())
            } else {
                version
            };

            CheckResult::ok(command, &version_display)
        }
        Ok(_) => CheckResult::error(command, "installed but not working", install_hint_manim()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::error(command, "not found", install_hint_manim())
        }
        Err(e) => CheckResult::error(command, &format!("error: {}", e), install_hint_manim()),
    }
}

/// Check the API key, or report the custom endpoint.
fn check_api_key(settings: &Settings) -> CheckResult {
    if let Some(base) = &settings.llm.api_base {
        return CheckResult::ok("Endpoint", &format!("{} ({})", base, settings.llm.model));
    }

    let var = settings.llm.api_key_env.as_str();
    let hint = format!("Set with: export {}='sk-...'", var);
    match std::env::var(var) {
        Ok(key) if key.starts_with("sk-") && key.len() > 20 => {
            let masked = format!("{}...{}", &key[..7], &key[key.len() - 4..]);
            CheckResult::ok(var, &format!("configured ({})", masked))
        }
        Ok(key) if key.is_empty() => CheckResult::error(var, "empty", &hint),
        Ok(_) => CheckResult::warning(
            var,
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        Err(_) => CheckResult::error(var, "not set", &hint),
    }
}

/// Check that the snippet index has been built.
async fn check_index(settings: &Settings) -> CheckResult {
    let db_path = settings.sqlite_path();
    let hint = "Build it with: animagen index";

    let store = match SqliteVectorStore::open_existing(&db_path) {
        Ok(store) => store,
        Err(e) => return CheckResult::error("Index", &e.to_string(), hint),
    };

    match store.list_sources().await {
        Ok(sources) => {
            let summary = sources
                .iter()
                .map(|s| format!("{}: {} chunks", s.source, s.chunk_count))
                .collect::<Vec<_>>()
                .join(", ");
            let size = std::fs::metadata(&db_path)
                .map(|m| format_size(m.len()))
                .unwrap_or_else(|_| "unknown size".to_string());
            CheckResult::ok("Index", &format!("{} ({}, {})", db_path.display(), summary, size))
        }
        Err(e) => CheckResult::error("Index", &e.to_string(), hint),
    }
}

/// Check working directories.
fn check_directories(settings: &Settings) -> Vec<CheckResult> {
    [
        ("Data directory", settings.data_dir()),
        ("Scripts directory", settings.scripts_dir()),
        ("Output directory", settings.output_dir()),
    ]
    .into_iter()
    .map(|(name, dir)| {
        if dir.is_dir() {
            CheckResult::ok(name, &dir.display().to_string())
        } else {
            CheckResult::warning(
                name,
                &format!("{} (will be created)", dir.display()),
                "Directory will be created on first use",
            )
        }
    })
    .collect()
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: animagen init (or animagen config edit)",
        )
    }
}

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Platform-specific install hint for Manim.
pub(crate) fn install_hint_manim() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install py3cairo ffmpeg && pip install manim"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install manim (needs ffmpeg and cairo from your package manager)"
    } else {
        "Install from: https://docs.manim.community/en/stable/installation.html"
    }
}
