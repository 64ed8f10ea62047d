//! Integration tests for sysroot provisioning
//!
//! Drives `sysroot::build` against the recording mock engine.

mod common;

use common::{request, Call, MockEngine, TestProject};
use crossroot::core::sysroot::{self, ProvisionWarning};
use crossroot::error::{ContainerError, SysrootError};
use std::path::PathBuf;

#[test]
fn test_fresh_build_populates_and_verifies() {
    let project = TestProject::new();
    let engine = MockEngine::new();
    let path = project.path().join("sysroot");

    let built = sysroot::build(
        &engine,
        &request(&path, &["libc6-dev", "libudev-dev", "libssl-dev"]),
    )
    .unwrap();

    assert!(built.report.is_complete(), "missing: {:?}", built.report.missing());
    assert_eq!(built.report.found_count(), 10);
    assert_eq!(
        built.sysroot.populated,
        vec![
            PathBuf::from("usr/lib/aarch64-linux-gnu"),
            PathBuf::from("lib/aarch64-linux-gnu"),
            PathBuf::from("usr/include"),
            PathBuf::from("usr/share/pkgconfig"),
        ]
    );
    assert!(project.file_exists("sysroot/lib/aarch64-linux-gnu/libc.so.6"));
    assert!(project.file_exists("sysroot/usr/include/aarch64-linux-gnu/bits/types.h"));
    assert_eq!(engine.remove_count(), 1);
}

#[test]
fn test_missing_optional_paths_are_warnings() {
    let project = TestProject::new();
    let engine = MockEngine::new();
    let path = project.path().join("sysroot");

    let built = sysroot::build(&engine, &request(&path, &["libc6-dev"])).unwrap();

    let missing: Vec<_> = built
        .warnings
        .iter()
        .filter_map(|w| match w {
            ProvisionWarning::OptionalCopyMissing { path } => Some(path.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(
        missing,
        vec![PathBuf::from("/lib64"), PathBuf::from("/usr/lib/pkgconfig")]
    );
    assert!(!built.report.is_complete());
}

#[cfg(unix)]
#[test]
fn test_compat_symlinks_created() {
    let project = TestProject::new();
    let engine = MockEngine::new();
    let path = project.path().join("sysroot");

    sysroot::build(&engine, &request(&path, &["libudev-dev"])).unwrap();

    assert!(path.join("usr/lib64").symlink_metadata().unwrap().is_symlink());
    assert!(project.file_exists("sysroot/usr/lib64/libudev.so"));
    assert!(project.file_exists("sysroot/usr/lib/aarch64-unknown-linux-gnu/libudev.so"));
}

#[test]
fn test_engine_unreachable_fails_before_start() {
    let project = TestProject::new();
    let engine = MockEngine::unreachable();
    let path = project.path().join("sysroot");

    let err = sysroot::build(&engine, &request(&path, &["libc6-dev"])).unwrap_err();

    assert!(matches!(
        err,
        SysrootError::Container(ContainerError::EngineUnavailable { .. })
    ));
    assert_eq!(engine.start_count(), 0);
    assert_eq!(engine.remove_count(), 1);

    // Only the empty skeleton exists
    assert_eq!(sysroot::file_count(&path), 0);
    assert!(path.join("usr/lib/aarch64-linux-gnu").is_dir());
    assert!(path.join("lib/aarch64-linux-gnu").is_dir());
    assert!(path.join("usr/include").is_dir());
}

#[test]
fn test_install_failure_tears_down_once() {
    let project = TestProject::new();
    let engine = MockEngine {
        fail_install: true,
        ..MockEngine::new()
    };
    let path = project.path().join("sysroot");

    let err = sysroot::build(&engine, &request(&path, &["libudev-dev"])).unwrap_err();

    match err {
        SysrootError::Container(ContainerError::PackageInstallFailure { exit_code, output }) => {
            assert_eq!(exit_code, Some(100));
            assert!(output.contains("libudev-dev"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(engine.remove_count(), 1);
    assert!(!engine
        .calls()
        .iter()
        .any(|c| matches!(c, Call::CopyOut(_))));
}

#[test]
fn test_required_copy_failure_tears_down_once() {
    let project = TestProject::new();
    let engine = MockEngine {
        fail_copy: Some(PathBuf::from("/lib/aarch64-linux-gnu")),
        ..MockEngine::new()
    };
    let path = project.path().join("sysroot");

    let err = sysroot::build(&engine, &request(&path, &["libc6-dev"])).unwrap_err();

    assert!(matches!(
        err,
        SysrootError::Container(ContainerError::CopyFailure { ref path, .. })
            if path == &PathBuf::from("/lib/aarch64-linux-gnu")
    ));
    assert_eq!(engine.remove_count(), 1);
    assert_eq!(engine.calls().last(), Some(&Call::Remove("crossroot-aarch64-unknown-linux-gnu".to_string())));
}

#[test]
fn test_optional_copy_engine_error_is_not_fatal() {
    let project = TestProject::new();
    let engine = MockEngine {
        fail_copy: Some(PathBuf::from("/usr/share/pkgconfig")),
        ..MockEngine::new()
    };
    let path = project.path().join("sysroot");

    let built = sysroot::build(&engine, &request(&path, &["libc6-dev"])).unwrap();

    let failed: Vec<_> = built
        .warnings
        .iter()
        .filter_map(|w| match w {
            ProvisionWarning::OptionalCopyFailed { path, reason } => Some((path, reason)),
            _ => None,
        })
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].0, &PathBuf::from("/usr/share/pkgconfig"));
    assert!(failed[0].1.contains("input/output error"));
    assert!(!built.warnings.contains(&ProvisionWarning::OptionalCopyMissing {
        path: PathBuf::from("/usr/share/pkgconfig")
    }));
    assert_eq!(engine.remove_count(), 1);
}

#[test]
fn test_optional_copy_lands_under_skeleton_parent() {
    let project = TestProject::new();
    let engine = MockEngine::new();
    let path = project.path().join("sysroot");

    let built = sysroot::build(&engine, &request(&path, &["libc6-dev"])).unwrap();

    assert!(
        !built
            .warnings
            .iter()
            .any(|w| matches!(w, ProvisionWarning::OptionalCopyFailed { .. })),
        "warnings: {:?}",
        built.warnings
    );
    assert!(project.file_exists("sysroot/usr/share/pkgconfig/shared-mime-info.pc"));
    assert!(built
        .sysroot
        .populated
        .contains(&PathBuf::from("usr/share/pkgconfig")));
}

#[test]
fn test_stale_container_removed_and_retried() {
    let project = TestProject::new();
    let engine = MockEngine::new();
    engine.name_conflicts.set(1);
    let path = project.path().join("sysroot");

    sysroot::build(&engine, &request(&path, &["libc6-dev"])).unwrap();

    let calls = engine.calls();
    let name = "crossroot-aarch64-unknown-linux-gnu".to_string();
    assert_eq!(
        &calls[..4],
        &[
            Call::Ping,
            Call::Start(name.clone()),
            Call::Remove(name.clone()),
            Call::Start(name.clone()),
        ]
    );
    assert_eq!(engine.remove_count(), 2);
}

#[test]
fn test_persistent_name_conflict_is_start_failure() {
    let project = TestProject::new();
    let engine = MockEngine::new();
    engine.name_conflicts.set(2);
    let path = project.path().join("sysroot");

    let err = sysroot::build(&engine, &request(&path, &["libc6-dev"])).unwrap_err();

    assert!(matches!(
        err,
        SysrootError::Container(ContainerError::ContainerStartFailure { .. })
    ));
    assert_eq!(engine.start_count(), 2);
}

#[test]
fn test_rebuild_replaces_previous_tree() {
    let project = TestProject::new();
    let path = project.path().join("sysroot");

    let first = MockEngine::new();
    sysroot::build(&first, &request(&path, &["libc6-dev", "libusb-1.0-0-dev"])).unwrap();
    assert!(project.file_exists("sysroot/usr/include/libusb-1.0/libusb.h"));
    project.create_file("sysroot/stray.txt", "left behind");

    let second = MockEngine::new();
    sysroot::build(&second, &request(&path, &["libc6-dev", "libssl-dev"])).unwrap();

    assert!(!project.file_exists("sysroot/usr/include/libusb-1.0/libusb.h"));
    assert!(!project.file_exists("sysroot/usr/lib/aarch64-linux-gnu/libusb-1.0.so"));
    assert!(!project.file_exists("sysroot/stray.txt"));
    assert!(project.file_exists("sysroot/usr/include/openssl/ssl.h"));
}

#[test]
fn test_build_stays_inside_sysroot() {
    let project = TestProject::new();
    project.create_file("Cargo.toml", "[package]\nname = \"app\"\n");
    project.create_file("src/main.rs", "fn main() {}\n");
    let engine = MockEngine::new();
    let path = project.path().join("sysroot");

    sysroot::build(
        &engine,
        &request(&path, &["libc6-dev", "libudev-dev", "libssl-dev"]),
    )
    .unwrap();

    let mut top_level: Vec<_> = std::fs::read_dir(project.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    top_level.sort();
    assert_eq!(top_level, vec!["Cargo.toml", "src", "sysroot"]);
    assert_eq!(project.read_file("src/main.rs"), "fn main() {}\n");
}

#[test]
fn test_unsafe_path_rejected_without_side_effects() {
    let engine = MockEngine::new();

    let err = sysroot::build(&engine, &request(std::path::Path::new("/"), &["libc6-dev"]))
        .unwrap_err();

    assert!(matches!(err, SysrootError::UnsafeSysrootPath { .. }));
    assert!(engine.calls().is_empty());
}

#[test]
fn test_invalid_package_never_reaches_engine() {
    let err = crossroot::core::packages::PackageSet::new(["libssl-dev && reboot"]).unwrap_err();
    assert!(matches!(
        err,
        crossroot::error::PackageError::InvalidName { .. }
    ));
}
