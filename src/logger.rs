//! Session logging.
//!
//! Every run appends to a single plaintext log file and mirrors each line to
//! stdout. The log file is the only artifact the tools produce themselves,
//! so it captures the orchestrator's own records, the output of every
//! wrapped command, and the fatal error (if any) before exit.
//!
//! The handle is created once in `main` and passed explicitly to everything
//! that logs.

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use time::macros::format_description;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

/// Append-only session log, mirrored to stdout.
pub struct Logger {
    path: PathBuf,
    file: File,
}

impl Logger {
    /// Open (or create) the session log at `path`.
    pub fn create(path: &Path) -> Result<Logger> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open session log at {}", path.display()))?;

        Ok(Logger {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Path of the session log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self, msg: &str) {
        self.log(Level::Info, msg);
    }

    pub fn warn(&self, msg: &str) {
        self.log(Level::Warn, msg);
    }

    pub fn error(&self, msg: &str) {
        self.log(Level::Error, msg);
    }

    /// Write a raw line with no timestamp or level prefix.
    ///
    /// Used for tee'd child output, so command output reads in the log the
    /// way it read on screen.
    pub fn output(&self, line: &str) {
        self.write_line(line);
    }

    fn log(&self, level: Level, msg: &str) {
        self.write_line(&format!("[{}] [{}] {}", timestamp(), level.as_str(), msg));
    }

    fn write_line(&self, line: &str) {
        println!("{line}");
        let mut file = &self.file;
        if let Err(e) = writeln!(file, "{line}") {
            eprintln!("kforge: failed to write session log: {e}");
        }
    }
}

fn timestamp() -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    OffsetDateTime::now_utc()
        .format(&format)
        .unwrap_or_else(|_| String::from("unknown-time"))
}

/// Default session log file name, e.g. `kforge-build-20260805-142501.log`.
pub fn default_log_name(tool: &str) -> Result<String> {
    let format = format_description!("[year][month][day]-[hour][minute][second]");
    let stamp = OffsetDateTime::now_utc()
        .format(&format)
        .context("Failed to format log file timestamp")?;
    Ok(format!("{tool}-{stamp}.log"))
}
