//! Error types for crossroot
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Container engine and session errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContainerError {
    /// The engine binary is missing or its daemon cannot be reached
    #[error("Container engine '{engine}' is not available: {reason}")]
    EngineUnavailable { engine: String, reason: String },

    /// The image could not be started
    #[error("Failed to start container from image '{image}': {reason}")]
    ContainerStartFailure { image: String, reason: String },

    /// A container with the requested name already exists
    #[error("A container named '{name}' already exists")]
    NameInUse { name: String },

    /// The package install command exited non-zero
    #[error("Package installation failed (exit code {}): {output}", .exit_code.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    PackageInstallFailure {
        exit_code: Option<i32>,
        output: String,
    },

    /// A required path could not be copied out of the container
    #[error("Failed to copy required path '{path}' out of the container: {reason}")]
    CopyFailure { path: PathBuf, reason: String },

    /// The container could not be removed
    #[error("Failed to remove container '{name}': {reason}")]
    TeardownFailure { name: String, reason: String },

    /// The session was used after teardown
    #[error("Container session '{name}' is not running")]
    NotRunning { name: String },
}

/// Package set errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PackageError {
    /// Name is not a valid package name
    #[error("Invalid package name '{name}'")]
    InvalidName { name: String },

    /// No packages were given
    #[error("Package set is empty; at least one package is required")]
    EmptyPackageSet,

    /// The package name pattern failed to compile
    #[error("Invalid package name pattern: {error}")]
    InvalidPattern { error: String },
}

/// Target triple errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TargetError {
    /// Triple is not one crossroot knows how to provision
    #[error("Unsupported target triple '{target}'. Supported targets: {}", .supported.join(", "))]
    UnsupportedTarget {
        target: String,
        supported: Vec<String>,
    },
}

/// Host toolchain preflight failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PreflightError {
    /// Rust target is not installed
    #[error("Rust target '{target}' is not installed")]
    MissingToolchainTarget { target: String },

    /// Cross-linker is not on PATH
    #[error("Cross-linker '{linker}' not found in PATH")]
    MissingCrossLinker { linker: String },
}

/// Filesystem errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to remove directory
    #[error("Failed to remove directory '{path}': {error}")]
    RemoveDir { path: PathBuf, error: String },

    /// Failed to write file
    #[error("Failed to write file '{path}': {error}")]
    WriteFile { path: PathBuf, error: String },

    /// Failed to create symlink
    #[error("Failed to create symlink '{link}': {error}")]
    Symlink { link: PathBuf, error: String },
}

/// Sysroot provisioning and inspection errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SysrootError {
    /// Container step failed
    #[error(transparent)]
    Container(#[from] ContainerError),

    /// Filesystem step failed
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),

    /// Symlink destination is already occupied
    #[error("Symlink '{link}' already exists")]
    SymlinkAlreadyExists { link: PathBuf },

    /// Refusing to wipe a path that is not a named directory
    #[error("Refusing to use '{path}' as a sysroot path")]
    UnsafeSysrootPath { path: PathBuf },

    /// Sysroot directory does not exist
    #[error("Sysroot not found at '{path}'. Run 'crossroot sysroot' first")]
    MissingSysroot { path: PathBuf },

    /// Sysroot exists but checklist entries are missing
    #[error("Sysroot is incomplete; missing: {}", .missing.join(", "))]
    IncompleteSysroot { missing: Vec<String> },
}

/// Build configuration artifact errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArtifactError {
    /// Model could not be serialized
    #[error("Failed to render build configuration: {error}")]
    Render { error: String },

    /// Rendered text did not parse back
    #[error("Rendered build configuration is malformed: {error}")]
    Malformed { error: String },

    /// Filesystem error while persisting
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}

/// Project configuration file errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file '{path}': {error}")]
    Read { path: PathBuf, error: String },

    /// Failed to parse config file
    #[error("Failed to parse config file '{path}': {error}")]
    Parse { path: PathBuf, error: String },
}

/// Top-level crossroot error type
#[derive(Error, Debug)]
pub enum CrossrootError {
    /// Container error
    #[error("Container error: {0}")]
    Container(#[from] ContainerError),

    /// Package error
    #[error("Package error: {0}")]
    Package(#[from] PackageError),

    /// Target error
    #[error("Target error: {0}")]
    Target(#[from] TargetError),

    /// Preflight error
    #[error("Preflight error: {0}")]
    Preflight(#[from] PreflightError),

    /// Sysroot error
    #[error("Sysroot error: {0}")]
    Sysroot(#[from] SysrootError),

    /// Artifact error
    #[error("Configuration artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    /// Filesystem error
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),

    /// Config error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
