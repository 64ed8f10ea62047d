//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests: a scratch
//! project directory, a recording container engine that simulates an image
//! filesystem, and a scripted toolchain probe.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crossroot::core::packages::PackageSet;
use crossroot::core::sysroot::{BaseImage, BuildRequest};
use crossroot::core::target::TargetPlatform;
use crossroot::error::ContainerError;
use crossroot::infra::container::{ContainerEngine, ContainerSpec, CopyStatus, ExecOutput};
use crossroot::infra::toolchain::ToolchainProbe;

/// Test project context
///
/// Creates a temporary directory for test projects and provides
/// utilities for setting up test scenarios.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Create a directory in the test project
    pub fn create_dir(&self, name: &str) {
        let path = self.dir.path().join(name);
        std::fs::create_dir_all(path).expect("Failed to create directory");
    }

    /// Check if a file exists in the test project
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Read a file from the test project
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("Failed to read file")
    }

    /// Remove a file from the test project
    pub fn remove_file(&self, name: &str) {
        std::fs::remove_file(self.dir.path().join(name)).expect("Failed to remove file");
    }

    /// Populate `sysroot/` with every checklist file for aarch64
    pub fn create_complete_sysroot(&self) -> PathBuf {
        for file in AARCH64_CHECKLIST {
            self.create_file(&format!("sysroot/{file}"), "");
        }
        self.path().join("sysroot")
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Every checklist file for aarch64, relative to the sysroot
pub const AARCH64_CHECKLIST: &[&str] = &[
    "usr/lib/aarch64-linux-gnu/libudev.so",
    "usr/lib/aarch64-linux-gnu/pkgconfig/libudev.pc",
    "usr/include/libudev.h",
    "usr/lib/aarch64-linux-gnu/libssl.so",
    "usr/lib/aarch64-linux-gnu/pkgconfig/openssl.pc",
    "usr/include/openssl/ssl.h",
    "usr/lib/aarch64-linux-gnu/crt1.o",
    "usr/lib/aarch64-linux-gnu/crti.o",
    "usr/lib/aarch64-linux-gnu/crtn.o",
    "usr/lib/aarch64-linux-gnu/Scrt1.o",
];

/// aarch64 platform
pub fn aarch64() -> TargetPlatform {
    TargetPlatform::from_triple("aarch64-unknown-linux-gnu").expect("aarch64 is supported")
}

/// Build request for aarch64 with the given packages
pub fn request(path: &Path, packages: &[&str]) -> BuildRequest {
    BuildRequest {
        path: path.to_path_buf(),
        packages: PackageSet::new(packages).expect("valid packages"),
        platform: aarch64(),
        image: BaseImage::default(),
    }
}

/// One call made against the mock engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Ping,
    Start(String),
    Exec(Vec<String>),
    CopyOut(PathBuf),
    Remove(String),
}

/// Recording container engine backed by a scratch "image" directory
///
/// `exec` of an install command writes each known package's files into the
/// image; `copy_out` copies from the image to the host with the same
/// directory semantics as `docker cp`.
pub struct MockEngine {
    pub image: TempDir,
    pub package_files: BTreeMap<String, Vec<String>>,
    /// Whether `ping` succeeds
    pub reachable: bool,
    /// Whether the install command exits non-zero
    pub fail_install: bool,
    /// Source path whose copy returns an engine error
    pub fail_copy: Option<PathBuf>,
    /// Number of starts that report a name conflict before succeeding
    pub name_conflicts: Cell<u32>,
    pub calls: RefCell<Vec<Call>>,
}

impl MockEngine {
    /// Engine whose image is an aarch64 Ubuntu with the usual dev packages
    pub fn new() -> Self {
        let ma = "aarch64-linux-gnu";
        let mut package_files = BTreeMap::new();
        package_files.insert(
            "libc6-dev".to_string(),
            vec![
                format!("usr/lib/{ma}/crt1.o"),
                format!("usr/lib/{ma}/crti.o"),
                format!("usr/lib/{ma}/crtn.o"),
                format!("usr/lib/{ma}/Scrt1.o"),
                format!("usr/lib/{ma}/libc.so"),
                format!("usr/include/{ma}/bits/types.h"),
                "usr/include/stdio.h".to_string(),
            ],
        );
        package_files.insert(
            "libudev-dev".to_string(),
            vec![
                format!("usr/lib/{ma}/libudev.so"),
                format!("usr/lib/{ma}/pkgconfig/libudev.pc"),
                "usr/include/libudev.h".to_string(),
            ],
        );
        package_files.insert(
            "libssl-dev".to_string(),
            vec![
                format!("usr/lib/{ma}/libssl.so"),
                format!("usr/lib/{ma}/libcrypto.so"),
                format!("usr/lib/{ma}/pkgconfig/openssl.pc"),
                "usr/include/openssl/ssl.h".to_string(),
            ],
        );
        package_files.insert(
            "libusb-1.0-0-dev".to_string(),
            vec![
                format!("usr/lib/{ma}/libusb-1.0.so"),
                "usr/include/libusb-1.0/libusb.h".to_string(),
            ],
        );

        let engine = Self {
            image: TempDir::new().expect("Failed to create image directory"),
            package_files,
            reachable: true,
            fail_install: false,
            fail_copy: None,
            name_conflicts: Cell::new(0),
            calls: RefCell::new(Vec::new()),
        };
        // Base image content present before any install
        engine.add_image_file(&format!("lib/{ma}/libc.so.6"));
        engine.add_image_file("usr/share/pkgconfig/shared-mime-info.pc");
        engine
    }

    /// An engine whose `ping` fails
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::new()
        }
    }

    /// Put a file into the simulated image
    pub fn add_image_file(&self, relative: &str) {
        let path = self.image.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create image directory");
        }
        std::fs::write(&path, relative).expect("Failed to write image file");
    }

    /// Calls made so far
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Number of `remove` calls
    pub fn remove_count(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, Call::Remove(_)))
            .count()
    }

    /// Number of `start` calls
    pub fn start_count(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, Call::Start(_)))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn install(&self, script: &str) {
        let packages = script
            .split_whitespace()
            .skip_while(|word| *word != "--no-install-recommends")
            .skip(1);
        for package in packages {
            for file in self.package_files.get(package).into_iter().flatten() {
                self.add_image_file(file);
            }
        }
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy like `docker cp`: into `dest` if it is a directory, otherwise create
/// `dest` itself, which needs an existing parent
fn copy_tree(source: &Path, dest: &Path) -> std::io::Result<()> {
    if !dest.is_dir() && !dest.parent().is_some_and(Path::is_dir) {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!(
                "stat {}: no such file or directory",
                dest.parent().unwrap_or(dest).display()
            ),
        ));
    }
    if source.is_file() {
        std::fs::copy(source, dest)?;
        return Ok(());
    }
    for entry in walkdir::WalkDir::new(source) {
        let entry = entry.map_err(std::io::Error::other)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(std::io::Error::other)?;
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

impl ContainerEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    fn ping(&self) -> Result<(), ContainerError> {
        self.record(Call::Ping);
        if self.reachable {
            Ok(())
        } else {
            Err(ContainerError::EngineUnavailable {
                engine: "mock".to_string(),
                reason: "daemon not running".to_string(),
            })
        }
    }

    fn start(&self, spec: &ContainerSpec) -> Result<(), ContainerError> {
        self.record(Call::Start(spec.name.clone()));
        let conflicts = self.name_conflicts.get();
        if conflicts > 0 {
            self.name_conflicts.set(conflicts - 1);
            return Err(ContainerError::NameInUse {
                name: spec.name.clone(),
            });
        }
        Ok(())
    }

    fn exec(&self, _name: &str, command: &[String]) -> Result<ExecOutput, ContainerError> {
        self.record(Call::Exec(command.to_vec()));
        if self.fail_install {
            return Ok(ExecOutput {
                exit_code: Some(100),
                output: "E: Unable to locate package libudev-dev".to_string(),
            });
        }
        if let Some(script) = command.last() {
            self.install(script);
        }
        Ok(ExecOutput {
            exit_code: Some(0),
            output: String::new(),
        })
    }

    fn copy_out(&self, _name: &str, source: &Path, dest: &Path) -> Result<CopyStatus, ContainerError> {
        self.record(Call::CopyOut(source.to_path_buf()));
        if self.fail_copy.as_deref() == Some(source) {
            return Err(ContainerError::CopyFailure {
                path: source.to_path_buf(),
                reason: "input/output error".to_string(),
            });
        }

        let relative = source.strip_prefix("/").unwrap_or(source);
        let from = self.image.path().join(relative);
        if !from.exists() {
            return Ok(CopyStatus::SourceMissing);
        }
        copy_tree(&from, dest).map_err(|e| ContainerError::CopyFailure {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(CopyStatus::Copied)
    }

    fn remove(&self, name: &str) -> Result<(), ContainerError> {
        self.record(Call::Remove(name.to_string()));
        Ok(())
    }
}

/// Toolchain probe with fixed answers
pub struct FakeProbe {
    /// Installed targets, or the error listing them
    pub targets: Result<Vec<String>, String>,
    /// Executables considered present on `PATH`
    pub executables: Vec<String>,
}

impl FakeProbe {
    /// A host with the target installed and the linker present
    pub fn ready(platform: &TargetPlatform) -> Self {
        Self {
            targets: Ok(vec![platform.rust_triple().to_string()]),
            executables: vec![platform.linker()],
        }
    }
}

impl ToolchainProbe for FakeProbe {
    fn installed_targets(&self) -> Result<Vec<String>, String> {
        self.targets.clone()
    }

    fn find_executable(&self, name: &str) -> Option<PathBuf> {
        self.executables
            .iter()
            .any(|e| e == name)
            .then(|| PathBuf::from("/usr/bin").join(name))
    }
}
