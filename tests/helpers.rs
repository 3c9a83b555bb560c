//! Shared test utilities for kforge tests.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test environment rooted in a temporary directory.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    pub root: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        Self {
            _temp_dir: temp_dir,
            root,
        }
    }
}

/// Create a minimal kernel source tree: a top-level Makefile with version
/// fields and the scripts/config helper location.
pub fn create_kernel_source(root: &Path, version: (&str, &str, &str)) -> PathBuf {
    let src = root.join("linux");
    fs::create_dir_all(src.join("scripts")).expect("Failed to create scripts dir");

    let (major, patch, sub) = version;
    let makefile = format!(
        "# SPDX-License-Identifier: GPL-2.0\n\
         VERSION = {major}\n\
         PATCHLEVEL = {patch}\n\
         SUBLEVEL = {sub}\n\
         EXTRAVERSION =\n\
         NAME = Test Kernel\n"
    );
    fs::write(src.join("Makefile"), makefile).expect("Failed to write Makefile");
    fs::write(src.join("scripts/config"), "#!/bin/sh\n").expect("Failed to write scripts/config");

    src
}

/// Create a configured build tree carrying a generated kernel.release file.
pub fn create_build_tree(root: &Path, release: &str) -> PathBuf {
    let build = root.join("kernel-build");
    fs::create_dir_all(build.join("include/config")).expect("Failed to create include/config");
    fs::write(
        build.join("include/config/kernel.release"),
        format!("{release}\n"),
    )
    .expect("Failed to write kernel.release");
    build
}

/// Write a generated .config with the given LOCALVERSION value.
pub fn write_dot_config(dir: &Path, localversion: &str) -> PathBuf {
    let config = dir.join(".config");
    let content = format!(
        "#\n# Automatically generated file; DO NOT EDIT.\n#\n\
         CONFIG_64BIT=y\n\
         CONFIG_LOCALVERSION=\"{localversion}\"\n\
         # CONFIG_LOCALVERSION_AUTO is not set\n"
    );
    fs::write(&config, content).expect("Failed to write .config");
    config
}

/// Create a fake module directory for a release, with `count` module files
/// and a `build` symlink pointing at `build_target`.
pub fn create_module_tree(
    modules_root: &Path,
    release: &str,
    count: usize,
    build_target: Option<&Path>,
) -> PathBuf {
    let module_dir = modules_root.join(release);
    fs::create_dir_all(module_dir.join("kernel/drivers")).expect("Failed to create module dir");

    for i in 0..count {
        fs::write(
            module_dir.join(format!("kernel/drivers/mod{i}.ko")),
            b"\x7fELF",
        )
        .expect("Failed to write module file");
    }

    if let Some(target) = build_target {
        std::os::unix::fs::symlink(target, module_dir.join("build"))
            .expect("Failed to create build symlink");
    }

    module_dir
}
