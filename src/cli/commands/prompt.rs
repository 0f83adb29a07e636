//! Reading the animation prompt from arguments or the terminal.

use console::style;
use std::io::{self, BufRead, Write};

/// Join prompt words, or ask for a prompt when none were given.
pub fn resolve_prompt(words: &[String]) -> anyhow::Result<String> {
    let joined = words.join(" ");
    if !joined.trim().is_empty() {
        return Ok(joined.trim().to_string());
    }

    let stdin = io::stdin();
    read_prompt(&mut stdin.lock())
}

fn read_prompt(input: &mut impl BufRead) -> anyhow::Result<String> {
    print!("{} ", style("Describe the animation:").cyan());
    io::stdout().flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;

    let prompt = line.trim();
    if prompt.is_empty() {
        anyhow::bail!("No prompt given");
    }
    Ok(prompt.to_string())
}
