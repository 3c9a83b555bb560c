//! Interactive input collection.
//!
//! Required fields re-prompt until non-empty. Optional fields fall back to
//! their default on empty input. Type errors (a job count that is not a
//! positive integer) are fatal rather than re-prompted.

use anyhow::{bail, Context, Result};
use std::io::{self, Write};

/// Prompt until a non-empty string is supplied.
pub fn required(label: &str) -> Result<String> {
    loop {
        let input = read_input(&format!("{label}: "))?;
        if input.is_empty() {
            println!("Input must not be empty.");
            continue;
        }
        return Ok(input);
    }
}

/// Prompt once; empty input accepts the default.
pub fn or_default(label: &str, default: &str) -> Result<String> {
    let input = read_input(&format!("{label} [{default}]: "))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

/// Prompt for the parallel job count. Empty input accepts the default;
/// anything else must parse as a positive integer or the whole run aborts.
pub fn job_count(default: usize) -> Result<usize> {
    let input = or_default("Parallel jobs", &default.to_string())?;
    parse_job_count(&input)
}

/// Parse a job count: a positive integer, surrounding whitespace ignored.
pub fn parse_job_count(input: &str) -> Result<usize> {
    let trimmed = input.trim();
    let jobs: usize = trimmed
        .parse()
        .with_context(|| format!("Job count must be a positive integer, got '{trimmed}'"))?;
    if jobs == 0 {
        bail!("Job count must be a positive integer, got '{trimmed}'");
    }
    Ok(jobs)
}

/// Ask a yes/no question. Only `y` or `Y` confirms.
pub fn confirm(question: &str) -> Result<bool> {
    let input = read_input(&format!("{question} [y/N]: "))?;
    Ok(input.eq_ignore_ascii_case("y"))
}

fn read_input(prompt: &str) -> Result<String> {
    print!("{prompt}");
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut input = String::new();
    let n = io::stdin()
        .read_line(&mut input)
        .context("Failed to read from stdin")?;
    if n == 0 {
        bail!("Standard input closed while waiting for input");
    }
    Ok(input.trim().to_string())
}
