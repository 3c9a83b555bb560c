//! Installed kernel removal.
//!
//! Resolves a kernel release string from a boot image name or a build
//! directory, then deletes the fixed set of installed artifacts for that
//! release. Artifact deletion and build-directory deletion are gated behind
//! separate confirmations; the filesystem root is refused unconditionally.

use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::logger::Logger;
use crate::paths;
use crate::prompt;
use crate::runner::Cmd;

/// Prefix carried by installed kernel images under /boot.
pub const IMAGE_PREFIX: &str = "vmlinuz-";

/// What one removal run operates on.
#[derive(Debug, Clone)]
pub struct RemovalTarget {
    pub release: String,
    pub build_dir: Option<PathBuf>,
}

/// Full interactive removal flow.
pub fn run(log: &Logger) -> Result<()> {
    let input = prompt::required(
        "Kernel image name (vmlinuz-<release>) or build directory",
    )?;
    let target = resolve_target(log, &input)?;
    log.info(&format!("Target kernel release: {}", target.release));

    remove_artifacts(log, &target.release)?;
    remove_build_dir(log, &target)?;

    log.info("Removal complete");
    Ok(())
}

/// Resolve the release string (and, when possible, the originating build
/// directory) from the user's input.
pub fn resolve_target(log: &Logger, input: &str) -> Result<RemovalTarget> {
    if let Some(release) = parse_image_release(input) {
        let build_dir = paths::find_build_dir(&release);
        match &build_dir {
            Some(dir) => log.info(&format!(
                "Build directory via module symlink: {}",
                dir.display()
            )),
            None => log.info("No build directory symlink found for this release"),
        }
        return Ok(RemovalTarget { release, build_dir });
    }

    let invocation_dir = env::current_dir().context("Failed to read current directory")?;
    let build_dir = paths::resolve_from(&invocation_dir, input);
    match release_from_build_dir(&build_dir)? {
        Some(release) => Ok(RemovalTarget {
            release,
            build_dir: Some(build_dir),
        }),
        None => {
            log.warn(&format!(
                "{} has no generated kernel.release file",
                build_dir.display()
            ));
            let release = prompt::required("Kernel release to remove")?;
            Ok(RemovalTarget {
                release,
                build_dir: Some(build_dir),
            })
        }
    }
}

/// Derive the release from an image filename like `vmlinuz-6.8.0-test`.
/// Accepts a bare name or a full path.
pub fn parse_image_release(input: &str) -> Option<String> {
    let name = Path::new(input).file_name()?.to_str()?;
    let release = name.strip_prefix(IMAGE_PREFIX)?;
    if release.is_empty() {
        None
    } else {
        Some(release.to_string())
    }
}

/// Read the release string a configured build directory was built for.
///
/// The directory must exist and must not be the filesystem root. A directory
/// that was never configured has no release file; that is `None`, not an
/// error, so the caller can fall back to prompting.
pub fn release_from_build_dir(dir: &Path) -> Result<Option<String>> {
    if !dir.is_dir() {
        bail!("Build directory {} does not exist", dir.display());
    }
    if dir == Path::new("/") {
        bail!("Refusing to treat the filesystem root as a build directory");
    }

    let release_file = dir.join("include/config/kernel.release");
    if !release_file.exists() {
        return Ok(None);
    }

    let release = fs::read_to_string(&release_file)
        .with_context(|| format!("Failed to read {}", release_file.display()))?
        .trim()
        .to_string();

    if release.is_empty() {
        Ok(None)
    } else {
        Ok(Some(release))
    }
}

/// The fixed set of installed paths for a release.
pub fn artifact_paths(release: &str) -> Vec<PathBuf> {
    vec![
        PathBuf::from(format!("/boot/vmlinuz-{release}")),
        PathBuf::from(format!("/boot/System.map-{release}")),
        PathBuf::from(format!("/boot/config-{release}")),
        PathBuf::from(format!("/boot/initrd.img-{release}")),
        Path::new(paths::MODULES_DIR).join(release),
        PathBuf::from(format!("/usr/src/linux-headers-{release}")),
    ]
}

fn remove_artifacts(log: &Logger, release: &str) -> Result<()> {
    let existing: Vec<PathBuf> = artifact_paths(release)
        .into_iter()
        .filter(|p| p.exists())
        .collect();

    if existing.is_empty() {
        log.warn(&format!("No installed artifacts found for {release}"));
        return Ok(());
    }

    log.info("The following paths will be deleted:");
    for path in &existing {
        if path.is_dir() {
            log.info(&format!(
                "  {} ({} module files)",
                path.display(),
                count_module_files(path)
            ));
        } else {
            log.info(&format!("  {}", path.display()));
        }
    }

    let question = format!("Delete {} path(s) for {}", existing.len(), release);
    if !prompt::confirm(&question)? {
        bail!("Removal aborted: artifact deletion not confirmed");
    }

    for path in &existing {
        delete_path(log, path)?;
    }
    Ok(())
}

/// Build-directory deletion is a larger, harder-to-recover action than the
/// artifact list, so it sits behind its own confirmation.
fn remove_build_dir(log: &Logger, target: &RemovalTarget) -> Result<()> {
    let dir = match &target.build_dir {
        Some(dir) => dir,
        None => return Ok(()),
    };

    if dir == Path::new("/") {
        bail!("Refusing to delete the filesystem root");
    }
    if !dir.is_dir() {
        return Ok(());
    }

    let question = format!("Also delete the build directory {}", dir.display());
    if prompt::confirm(&question)? {
        delete_path(log, dir)?;
    } else {
        log.info(&format!("Keeping build directory {}", dir.display()));
    }
    Ok(())
}

fn delete_path(log: &Logger, path: &Path) -> Result<()> {
    Cmd::new(format!("Deleting {}", path.display()), "rm")
        .args(["-rf", "--"])
        .arg_path(path)
        .elevate()
        .run(log)
}

fn count_module_files(dir: &Path) -> usize {
    WalkDir::new(dir)
        .into_iter()
        .flatten()
        .filter(|entry| {
            entry
                .path()
                .extension()
                .map(|ext| ext == "ko" || ext == "xz" || ext == "gz")
                .unwrap_or(false)
        })
        .count()
}
