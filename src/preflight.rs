//! Host tool availability checks.
//!
//! Run before the build flow starts so a missing tool surfaces up front
//! instead of ten minutes into a compile.

use anyhow::{bail, Result};

use crate::logger::Logger;
use crate::runner;

/// Result of a single preflight check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub details: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    /// Check failed - the flow cannot proceed.
    Fail,
    /// Check passed but with a warning.
    Warn,
}

impl CheckResult {
    pub fn pass_with(name: &str, details: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Pass,
            details: Some(details.to_string()),
        }
    }

    pub fn fail(name: &str, details: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Fail,
            details: Some(details.to_string()),
        }
    }

    pub fn warn(name: &str, details: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warn,
            details: Some(details.to_string()),
        }
    }
}

/// Results of all preflight checks.
pub struct PreflightReport {
    pub checks: Vec<CheckResult>,
}

impl PreflightReport {
    pub fn all_passed(&self) -> bool {
        !self.checks.iter().any(|c| c.status == CheckStatus::Fail)
    }

    pub fn fail_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.status == CheckStatus::Fail)
            .count()
    }

    /// Write the report to the session log.
    pub fn log(&self, log: &Logger) {
        for check in &self.checks {
            let status = match check.status {
                CheckStatus::Pass => "PASS",
                CheckStatus::Fail => "FAIL",
                CheckStatus::Warn => "WARN",
            };
            let line = match &check.details {
                Some(details) => format!("[{}] {}: {}", status, check.name, details),
                None => format!("[{}] {}", status, check.name),
            };
            match check.status {
                CheckStatus::Fail => log.error(&line),
                CheckStatus::Warn => log.warn(&line),
                CheckStatus::Pass => log.info(&line),
            }
        }
    }
}

/// Check the host tools the build flow shells out to.
pub fn check_host_tools() -> PreflightReport {
    let mut checks = Vec::new();

    let required = [
        ("make", "Drives the kernel build"),
        ("sh", "Runs logged commands"),
        ("script", "Captures interactive menuconfig output"),
    ];
    for (tool, purpose) in required {
        checks.push(check_tool(tool, purpose, true));
    }

    checks.push(check_tool(
        "update-grub",
        "Regenerates the boot menu after install",
        false,
    ));

    if runner::is_root() {
        checks.push(CheckResult::pass_with("sudo", "not needed (running as root)"));
    } else {
        checks.push(check_tool("sudo", "Elevates install and removal steps", false));
    }

    PreflightReport { checks }
}

/// Run preflight and bail if any required tool is missing.
pub fn run_or_fail(log: &Logger) -> Result<()> {
    log.info("Checking host tools...");
    let report = check_host_tools();
    report.log(log);

    if !report.all_passed() {
        bail!(
            "Preflight failed: {} required tool(s) missing",
            report.fail_count()
        );
    }
    Ok(())
}

fn check_tool(tool: &str, purpose: &str, required: bool) -> CheckResult {
    match which::which(tool) {
        Ok(path) => CheckResult::pass_with(tool, &path.display().to_string()),
        Err(_) => {
            let msg = format!("Not found in PATH. {purpose}.");
            if required {
                CheckResult::fail(tool, &msg)
            } else {
                CheckResult::warn(tool, &msg)
            }
        }
    }
}
