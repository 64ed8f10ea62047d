//! Container engine access using Docker/Podman
//!
//! The sysroot builder only needs five primitives from an engine: a
//! reachability probe, detached start, synchronous exec, copy-out and forced
//! removal. [`ContainerEngine`] names those; [`DockerCli`] implements them by
//! driving the `docker` or `podman` command line.

use std::path::Path;
use std::process::{Command, Output};

use crate::error::ContainerError;

/// Container runtime type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerRuntime {
    /// Docker container runtime
    Docker,
    /// Podman container runtime
    Podman,
}

impl ContainerRuntime {
    /// Get the command name for this runtime
    pub fn command(&self) -> &'static str {
        match self {
            ContainerRuntime::Docker => "docker",
            ContainerRuntime::Podman => "podman",
        }
    }

    /// Parse a runtime from its command name
    pub fn from_command(name: &str) -> Option<Self> {
        match name {
            "docker" => Some(ContainerRuntime::Docker),
            "podman" => Some(ContainerRuntime::Podman),
            _ => None,
        }
    }

    /// Detect an installed runtime, preferring Docker
    pub fn detect() -> Option<Self> {
        [ContainerRuntime::Docker, ContainerRuntime::Podman]
            .into_iter()
            .find(|runtime| which::which(runtime.command()).is_ok())
    }
}

/// What to start
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerSpec {
    /// Container name
    pub name: String,
    /// Image reference, including tag
    pub image: String,
    /// `--platform` value
    pub platform: Option<String>,
}

/// Captured result of a command run inside a container
#[derive(Debug, Clone, PartialEq)]
pub struct ExecOutput {
    /// Exit code, `None` when terminated by a signal
    pub exit_code: Option<i32>,
    /// Combined stdout and stderr
    pub output: String,
}

impl ExecOutput {
    /// Whether the command exited zero
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Low-level copy-out result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStatus {
    /// Path was copied
    Copied,
    /// Path does not exist inside the container
    SourceMissing,
}

/// Primitive operations of a container engine
pub trait ContainerEngine {
    /// Engine name used in messages
    fn name(&self) -> &str;

    /// Check that the engine can be reached
    fn ping(&self) -> Result<(), ContainerError>;

    /// Start a detached container
    ///
    /// Returns `ContainerError::NameInUse` when the name is taken.
    fn start(&self, spec: &ContainerSpec) -> Result<(), ContainerError>;

    /// Run a command to completion inside a running container
    fn exec(&self, name: &str, command: &[String]) -> Result<ExecOutput, ContainerError>;

    /// Copy `source` out of the container to `dest` on the host
    ///
    /// When `dest` is an existing directory the contents of `source` are
    /// copied into it; otherwise `dest` is created as a copy of `source`.
    fn copy_out(&self, name: &str, source: &Path, dest: &Path) -> Result<CopyStatus, ContainerError>;

    /// Stop and remove a container, whether running or not
    fn remove(&self, name: &str) -> Result<(), ContainerError>;
}

/// Engine backed by the Docker or Podman CLI
#[derive(Debug, Clone)]
pub struct DockerCli {
    runtime: ContainerRuntime,
}

impl DockerCli {
    /// Create an engine for a specific runtime
    pub fn new(runtime: ContainerRuntime) -> Self {
        Self { runtime }
    }

    /// Create an engine for the detected runtime, falling back to Docker so
    /// the reachability probe reports the missing binary
    pub fn detect() -> Self {
        Self::new(ContainerRuntime::detect().unwrap_or(ContainerRuntime::Docker))
    }

    /// Get the runtime in use
    pub fn runtime(&self) -> ContainerRuntime {
        self.runtime
    }

    /// Build the `run` arguments for a detached container
    pub fn build_run_args(spec: &ContainerSpec) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            "--detach".to_string(),
            format!("--name={}", spec.name),
        ];
        if let Some(platform) = &spec.platform {
            args.push(format!("--platform={platform}"));
        }
        args.push(spec.image.clone());
        // Keep the container alive for exec/cp
        args.extend(["sleep".to_string(), "infinity".to_string()]);
        args
    }

    fn run(&self, args: &[String]) -> Result<Output, ContainerError> {
        tracing::debug!("{} {}", self.runtime.command(), args.join(" "));
        Command::new(self.runtime.command())
            .args(args)
            .output()
            .map_err(|e| ContainerError::EngineUnavailable {
                engine: self.runtime.command().to_string(),
                reason: e.to_string(),
            })
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::detect()
    }
}

fn combined_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}").trim().to_string()
}

/// Whether engine stderr reports a container name collision
pub fn is_name_conflict(stderr: &str) -> bool {
    stderr.contains("is already in use") || stderr.contains("already exists")
}

/// Whether engine stderr reports a missing copy source
///
/// Only the container-side forms count. A host-side `stat` failure on the
/// destination is a copy failure, not a missing source.
pub fn is_missing_source(stderr: &str) -> bool {
    stderr.contains("Could not find the file")
        || stderr.contains("No such container:path")
        || stderr.contains("could not be found on container")
}

/// Whether engine stderr reports that the container does not exist
pub fn is_missing_container(stderr: &str) -> bool {
    stderr.to_lowercase().contains("no such container")
}

impl ContainerEngine for DockerCli {
    fn name(&self) -> &str {
        self.runtime.command()
    }

    fn ping(&self) -> Result<(), ContainerError> {
        let output = self.run(&["info".to_string()])?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ContainerError::EngineUnavailable {
                engine: self.runtime.command().to_string(),
                reason: combined_output(&output),
            })
        }
    }

    fn start(&self, spec: &ContainerSpec) -> Result<(), ContainerError> {
        let output = self.run(&Self::build_run_args(spec))?;
        if output.status.success() {
            return Ok(());
        }

        let message = combined_output(&output);
        if is_name_conflict(&message) {
            Err(ContainerError::NameInUse {
                name: spec.name.clone(),
            })
        } else {
            Err(ContainerError::ContainerStartFailure {
                image: spec.image.clone(),
                reason: message,
            })
        }
    }

    fn exec(&self, name: &str, command: &[String]) -> Result<ExecOutput, ContainerError> {
        let mut args = vec!["exec".to_string(), name.to_string()];
        args.extend(command.iter().cloned());
        let output = self.run(&args)?;
        Ok(ExecOutput {
            exit_code: output.status.code(),
            output: combined_output(&output),
        })
    }

    fn copy_out(&self, name: &str, source: &Path, dest: &Path) -> Result<CopyStatus, ContainerError> {
        let source_arg = if dest.is_dir() {
            format!("{name}:{}/.", source.display())
        } else {
            format!("{name}:{}", source.display())
        };
        let output = self.run(&[
            "cp".to_string(),
            source_arg,
            dest.display().to_string(),
        ])?;

        if output.status.success() {
            return Ok(CopyStatus::Copied);
        }

        let message = combined_output(&output);
        if is_missing_source(&message) {
            Ok(CopyStatus::SourceMissing)
        } else {
            Err(ContainerError::CopyFailure {
                path: source.to_path_buf(),
                reason: message,
            })
        }
    }

    fn remove(&self, name: &str) -> Result<(), ContainerError> {
        let output = self.run(&["rm".to_string(), "--force".to_string(), name.to_string()])?;
        let message = combined_output(&output);
        if output.status.success() || is_missing_container(&message) {
            Ok(())
        } else {
            Err(ContainerError::TeardownFailure {
                name: name.to_string(),
                reason: message,
            })
        }
    }
}
