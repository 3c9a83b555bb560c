//! Integration tests for kforge.
//!
//! These tests exercise module interplay against scratch directory trees:
//! removal-target resolution, module symlink lookup, and the session log.

mod helpers;

use helpers::{create_build_tree, create_module_tree, TestEnv};
use kforge::logger::Logger;
use kforge::paths::find_build_dir_under;
use kforge::remove::{release_from_build_dir, resolve_target, RemovalTarget};
use regex::Regex;
use std::fs;
use std::path::Path;

fn temp_logger(env: &TestEnv) -> Logger {
    Logger::create(&env.root.join("session.log")).expect("Failed to create logger")
}

// =============================================================================
// Removal target resolution
// =============================================================================

#[test]
fn test_release_from_configured_build_dir() {
    let env = TestEnv::new();
    let build = create_build_tree(&env.root, "6.8.0-test");

    let release = release_from_build_dir(&build).expect("resolution should succeed");
    assert_eq!(release.as_deref(), Some("6.8.0-test"));
}

#[test]
fn test_release_from_unconfigured_build_dir_is_none() {
    let env = TestEnv::new();
    let dir = env.root.join("empty-build");
    fs::create_dir_all(&dir).unwrap();

    let release = release_from_build_dir(&dir).expect("resolution should succeed");
    assert_eq!(release, None);
}

#[test]
fn test_release_from_missing_dir_is_fatal() {
    let env = TestEnv::new();
    let err = release_from_build_dir(&env.root.join("nope")).unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn test_release_from_filesystem_root_is_refused() {
    let err = release_from_build_dir(Path::new("/")).unwrap_err();
    assert!(err.to_string().contains("Refusing"));
}

#[test]
fn test_release_file_with_only_whitespace_is_none() {
    let env = TestEnv::new();
    let build = env.root.join("build");
    fs::create_dir_all(build.join("include/config")).unwrap();
    fs::write(build.join("include/config/kernel.release"), "\n").unwrap();

    let release = release_from_build_dir(&build).expect("resolution should succeed");
    assert_eq!(release, None);
}

#[test]
fn test_resolve_target_from_image_name() {
    let env = TestEnv::new();
    let log = temp_logger(&env);

    // A release this deliberately odd is not installed on any host running
    // the suite, so the module symlink lookup comes back empty.
    let target: RemovalTarget =
        resolve_target(&log, "vmlinuz-0.0.0-kforge-selftest").expect("resolution should succeed");
    assert_eq!(target.release, "0.0.0-kforge-selftest");
    assert_eq!(target.build_dir, None);
}

#[test]
fn test_resolve_target_from_build_dir_path() {
    let env = TestEnv::new();
    let log = temp_logger(&env);
    let build = create_build_tree(&env.root, "6.8.0-test");

    let target = resolve_target(&log, &build.display().to_string())
        .expect("resolution should succeed");
    assert_eq!(target.release, "6.8.0-test");
    assert_eq!(target.build_dir.as_deref(), Some(build.as_path()));
}

// =============================================================================
// Module symlink lookup
// =============================================================================

#[test]
fn test_find_build_dir_follows_symlink() {
    let env = TestEnv::new();
    let build = create_build_tree(&env.root, "6.8.0-test");
    let modules_root = env.root.join("modules");
    create_module_tree(&modules_root, "6.8.0-test", 3, Some(&build));

    let found = find_build_dir_under(&modules_root, "6.8.0-test");
    assert_eq!(found.as_deref(), Some(build.as_path()));
}

#[test]
fn test_find_build_dir_broken_symlink_is_none() {
    let env = TestEnv::new();
    let modules_root = env.root.join("modules");
    let gone = env.root.join("deleted-build");
    create_module_tree(&modules_root, "6.8.0-test", 0, Some(&gone));

    assert_eq!(find_build_dir_under(&modules_root, "6.8.0-test"), None);
}

#[test]
fn test_find_build_dir_absent_release_is_none() {
    let env = TestEnv::new();
    let modules_root = env.root.join("modules");
    fs::create_dir_all(&modules_root).unwrap();

    assert_eq!(find_build_dir_under(&modules_root, "6.8.0-test"), None);
}

// =============================================================================
// Session log
// =============================================================================

#[test]
fn test_log_line_format() {
    let env = TestEnv::new();
    let log = temp_logger(&env);
    log.info("build started");
    log.warn("low disk space");
    log.error("compile failed");

    let contents = fs::read_to_string(log.path()).unwrap();
    let line = Regex::new(
        r"(?m)^\[\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\] \[(INFO|WARN|ERROR)\] .+$",
    )
    .unwrap();

    assert_eq!(line.find_iter(&contents).count(), 3);
    assert!(contents.contains("[INFO] build started"));
    assert!(contents.contains("[WARN] low disk space"));
    assert!(contents.contains("[ERROR] compile failed"));
}

#[test]
fn test_log_raw_output_lines_have_no_prefix() {
    let env = TestEnv::new();
    let log = temp_logger(&env);
    log.output("  CC      kernel/fork.o");

    let contents = fs::read_to_string(log.path()).unwrap();
    assert!(contents.contains("  CC      kernel/fork.o"));
    assert!(!contents.contains("[INFO]   CC"));
}

#[test]
fn test_log_appends_across_reopen() {
    let env = TestEnv::new();
    let path = env.root.join("session.log");

    {
        let log = Logger::create(&path).unwrap();
        log.info("first");
    }
    {
        let log = Logger::create(&path).unwrap();
        log.info("second");
    }

    let contents = fs::read_to_string(&path).unwrap();
    assert!(contents.contains("first"));
    assert!(contents.contains("second"));
}
