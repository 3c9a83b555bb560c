//! Centralized command execution with session logging.
//!
//! Every wrapped command is announced in the log (description plus the
//! literal command line) before it runs, and reported after it exits. A
//! nonzero exit is an error; callers propagate it and the process dies at
//! the top-level handler. There is no retry and no partial continuation.
//!
//! Two modes:
//! - plain: output is tee'd line by line to stdout and the session log,
//!   through a single `sh -c "... 2>&1"` pipe (one reader, no threads);
//! - TTY: the command runs under `script(1)` so a full-screen child like
//!   menuconfig renders normally while `script` appends its output to the
//!   session log.

use anyhow::{bail, Context, Result};
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Command, Stdio};

use crate::logger::Logger;

/// True when the effective user is root.
pub fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

/// Quote a word for `sh -c`.
pub fn shell_quote(word: &str) -> String {
    if word.is_empty() {
        return String::from("''");
    }

    let safe = word
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "_-./=:+,@".contains(c));
    if safe {
        return word.to_string();
    }

    format!("'{}'", word.replace('\'', r"'\''"))
}

/// Builder for a logged external command.
pub struct Cmd {
    description: String,
    program: String,
    args: Vec<String>,
    elevate: bool,
}

impl Cmd {
    /// Create a command with a human-readable description.
    pub fn new(description: impl AsRef<str>, program: impl AsRef<str>) -> Self {
        Self {
            description: description.as_ref().to_string(),
            program: program.as_ref().to_string(),
            args: Vec::new(),
            elevate: false,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.args.push(arg.as_ref().to_string());
        }
        self
    }

    /// Add a path as an argument.
    pub fn arg_path(mut self, path: &Path) -> Self {
        self.args.push(path.to_string_lossy().into_owned());
        self
    }

    /// Prefix the command with `sudo` unless already running as root.
    pub fn elevate(mut self) -> Self {
        self.elevate = true;
        self
    }

    fn command_line(&self) -> String {
        let mut words = Vec::with_capacity(self.args.len() + 2);
        if self.elevate && !is_root() {
            words.push(String::from("sudo"));
        }
        words.push(shell_quote(&self.program));
        words.extend(self.args.iter().map(|a| shell_quote(a)));
        words.join(" ")
    }

    /// Run with output tee'd to stdout and the session log.
    pub fn run(self, log: &Logger) -> Result<()> {
        let line = self.command_line();
        log.info(&self.description);
        log.info(&format!("$ {line}"));

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(format!("{line} 2>&1"))
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| {
                format!("Failed to execute '{}'. Is it installed?", self.program)
            })?;

        if let Some(stdout) = child.stdout.take() {
            let mut reader = BufReader::new(stdout);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                let n = reader
                    .read_until(b'\n', &mut buf)
                    .context("Failed to read command output")?;
                if n == 0 {
                    break;
                }
                while matches!(buf.last(), Some(b'\n') | Some(b'\r')) {
                    buf.pop();
                }
                log.output(&String::from_utf8_lossy(&buf));
            }
        }

        let status = child.wait().context("Failed to wait for command")?;
        self.report(log, status.success(), status.code())
    }

    /// Run under `script(1)` with inherited stdio, appending the captured
    /// terminal output to the session log.
    pub fn run_tty(self, log: &Logger) -> Result<()> {
        let line = self.command_line();
        log.info(&self.description);
        log.info(&format!("$ {line}"));

        let status = Command::new("script")
            .arg("-aqef")
            .arg("-c")
            .arg(&line)
            .arg(log.path())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .context("Failed to execute 'script'. Is it installed?")?;

        self.report(log, status.success(), status.code())
    }

    fn report(&self, log: &Logger, success: bool, code: Option<i32>) -> Result<()> {
        if success {
            log.info(&format!("{}: done", self.description));
            return Ok(());
        }

        let code = code.unwrap_or(-1);
        log.error(&format!("{}: failed (exit code {})", self.description, code));
        bail!("{} failed (exit code {})", self.description, code);
    }
}
