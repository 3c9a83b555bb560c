//! Kernel build sequencing.
//!
//! A strictly ordered flow: collect the session configuration, then run the
//! standard build states (mrproper, olddefconfig, menuconfig, LOCALVERSION
//! override and verification, compile, module and image install, GRUB
//! refresh). Any failing state aborts the rest; nothing is retried and
//! partially built artifacts are left where they are.

use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use crate::config::Config;
use crate::logger::Logger;
use crate::paths;
use crate::preflight;
use crate::prompt;
use crate::runner::Cmd;
use crate::timing::Timer;

/// Configuration for one build run. Immutable once the sequence starts.
#[derive(Debug, Clone)]
pub struct BuildSession {
    pub kernel_source: PathBuf,
    pub build_output: PathBuf,
    pub jobs: usize,
    pub localversion: String,
}

/// Full interactive build flow.
pub fn run(log: &Logger, config: &Config) -> Result<()> {
    preflight::run_or_fail(log)?;
    let session = collect_session(log, config)?;

    let timer = Timer::start("Kernel build flow");
    run_sequence(log, &session)?;
    timer.finish(log);
    Ok(())
}

/// Prompt for and validate everything the sequence needs.
fn collect_session(log: &Logger, config: &Config) -> Result<BuildSession> {
    let invocation_dir = env::current_dir().context("Failed to read current directory")?;

    let source_input = prompt::required("Kernel source directory")?;
    let kernel_source = paths::resolve_from(&invocation_dir, &source_input);
    if !kernel_source.is_dir() {
        bail!("Kernel source directory {} does not exist", kernel_source.display());
    }
    if !kernel_source.join("Makefile").exists() {
        bail!(
            "{} does not look like a kernel source tree (no Makefile)",
            kernel_source.display()
        );
    }
    match source_version(&kernel_source) {
        Ok(version) => log.info(&format!("Kernel source: {} ({})", kernel_source.display(), version)),
        Err(e) => log.warn(&format!(
            "Kernel source: {} (version unknown: {})",
            kernel_source.display(),
            e
        )),
    }

    let output_input = prompt::required("Build output directory")?;
    let build_output = paths::resolve_from(&kernel_source, &output_input);
    if build_output.exists() {
        if !build_output.is_dir() {
            bail!("{} exists but is not a directory", build_output.display());
        }
        if !is_empty_dir(&build_output)? {
            let question = format!("{} is not empty. Reuse it", build_output.display());
            if !prompt::confirm(&question)? {
                bail!("Refused to reuse build directory {}", build_output.display());
            }
            log.info(&format!("Reusing build directory {}", build_output.display()));
        }
    } else {
        fs::create_dir_all(&build_output)
            .with_context(|| format!("Failed to create {}", build_output.display()))?;
        log.info(&format!("Created build directory {}", build_output.display()));
    }

    let default_jobs = match thread::available_parallelism() {
        Ok(n) => n.get(),
        Err(e) => {
            log.warn(&format!("Could not detect CPU count ({e}), defaulting to 4"));
            4
        }
    };
    let jobs = prompt::job_count(default_jobs)?;

    let localversion = prompt::or_default("LOCALVERSION suffix", &config.localversion)?;
    if !localversion.starts_with('-') {
        log.warn(&format!(
            "LOCALVERSION '{localversion}' has no leading '-'; the release string will run the version and suffix together"
        ));
    }

    log.info(&format!(
        "Build session: source={} output={} jobs={} localversion={}",
        kernel_source.display(),
        build_output.display(),
        jobs,
        localversion
    ));

    Ok(BuildSession {
        kernel_source,
        build_output,
        jobs,
        localversion,
    })
}

/// Run the ordered build states against a collected session.
pub fn run_sequence(log: &Logger, session: &BuildSession) -> Result<()> {
    make_cmd("Cleaning previous build state", session, &["mrproper"]).run(log)?;
    make_cmd("Generating default configuration", session, &["olddefconfig"]).run(log)?;

    log.info(&format!(
        "Opening menuconfig. LOCALVERSION can also be set manually under General setup (suffix '{}' will be applied afterwards either way).",
        session.localversion
    ));
    make_cmd("Interactive configuration (menuconfig)", session, &["menuconfig"]).run_tty(log)?;

    override_localversion(log, session)?;
    verify_localversion(&session.build_output.join(".config"), &session.localversion)?;
    log.info(&format!(
        "Verified CONFIG_LOCALVERSION=\"{}\"",
        session.localversion
    ));

    let timer = Timer::start("Kernel compile");
    make_cmd("Compiling kernel", session, &[&format!("-j{}", session.jobs)]).run(log)?;
    timer.finish(log);

    make_cmd("Installing modules", session, &["modules_install"])
        .elevate()
        .run(log)?;
    make_cmd("Installing kernel image", session, &["install"])
        .elevate()
        .run(log)?;

    Cmd::new("Regenerating GRUB configuration", "update-grub")
        .elevate()
        .run(log)?;
    show_grub_entries(log);

    Ok(())
}

fn make_cmd(description: &str, session: &BuildSession, targets: &[&str]) -> Cmd {
    let mut cmd = Cmd::new(description, "make")
        .arg("-C")
        .arg_path(&session.kernel_source)
        .arg(format!("O={}", session.build_output.display()));
    for target in targets {
        cmd = cmd.arg(*target);
    }
    cmd
}

/// Force CONFIG_LOCALVERSION to the requested suffix. `scripts/config` is
/// idempotent, so this is safe whether or not the user already set the field
/// in menuconfig.
fn override_localversion(log: &Logger, session: &BuildSession) -> Result<()> {
    let script_config = session.kernel_source.join("scripts/config");
    if !script_config.exists() {
        bail!("{} not found in kernel source tree", script_config.display());
    }

    Cmd::new(
        "Setting LOCALVERSION in the generated configuration",
        script_config.to_string_lossy(),
    )
    .arg("--file")
    .arg_path(&session.build_output.join(".config"))
    .args(["--set-str", "LOCALVERSION"])
    .arg(&session.localversion)
    .run(log)
}

/// Scan the generated configuration for the exact LOCALVERSION value.
pub fn verify_localversion(config_path: &Path, suffix: &str) -> Result<()> {
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;

    let expected = format!("CONFIG_LOCALVERSION=\"{suffix}\"");
    match content
        .lines()
        .find(|line| line.starts_with("CONFIG_LOCALVERSION="))
    {
        Some(line) if line.trim() == expected => Ok(()),
        Some(line) => bail!(
            "CONFIG_LOCALVERSION mismatch in {}: expected {}, found {}",
            config_path.display(),
            expected,
            line.trim()
        ),
        None => bail!(
            "CONFIG_LOCALVERSION not present in {}",
            config_path.display()
        ),
    }
}

/// Parse the source tree's version from its top-level Makefile.
pub fn source_version(kernel_source: &Path) -> Result<String> {
    let makefile = kernel_source.join("Makefile");
    let content = fs::read_to_string(&makefile)
        .with_context(|| format!("Failed to read {}", makefile.display()))?;

    let mut version = String::new();
    let mut patchlevel = String::new();
    let mut sublevel = String::new();

    for line in content.lines() {
        if let Some(v) = line.strip_prefix("VERSION = ") {
            version = v.trim().to_string();
        } else if let Some(v) = line.strip_prefix("PATCHLEVEL = ") {
            patchlevel = v.trim().to_string();
        } else if let Some(v) = line.strip_prefix("SUBLEVEL = ") {
            sublevel = v.trim().to_string();
        }
    }

    if version.is_empty() {
        bail!("Could not parse kernel version from Makefile");
    }

    Ok(format!("{}.{}.{}", version, patchlevel, sublevel))
}

fn is_empty_dir(path: &Path) -> Result<bool> {
    let mut entries =
        fs::read_dir(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(entries.next().is_none())
}

fn show_grub_entries(log: &Logger) {
    let grub_cfg = Path::new("/boot/grub/grub.cfg");
    match fs::read_to_string(grub_cfg) {
        Ok(content) => {
            log.info("Boot entries in the regenerated grub.cfg:");
            for line in content.lines() {
                let line = line.trim_start();
                if line.starts_with("menuentry ") || line.starts_with("submenu ") {
                    log.output(&format!("  {}", menu_title(line)));
                }
            }
        }
        Err(e) => log.warn(&format!(
            "Could not read {} to display boot entries: {e}",
            grub_cfg.display()
        )),
    }
}

/// Pull the quoted title out of a `menuentry '...'` line.
pub fn menu_title(line: &str) -> &str {
    for quote in ['\'', '"'] {
        if let Some((_, rest)) = line.split_once(quote) {
            if let Some((title, _)) = rest.split_once(quote) {
                return title;
            }
        }
    }
    line
}
