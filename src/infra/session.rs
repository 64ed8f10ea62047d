//! Ephemeral container session
//!
//! A [`ContainerSession`] owns one build container from allocation to
//! removal. Teardown is registered when the session value is created, before
//! the engine is contacted, and runs exactly once: either through
//! [`ContainerSession::close`] or, on any early return or panic, through
//! `Drop`.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::ContainerError;
use crate::infra::container::{ContainerEngine, ContainerSpec, CopyStatus, ExecOutput};

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    /// Teardown registered, container not yet started
    Allocated,
    /// Container started and usable
    Running,
    /// Teardown has run
    Removed,
}

/// Whether a copy-out source must exist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyRequirement {
    /// Missing source aborts the operation
    Required,
    /// Missing source is reported and skipped
    Optional,
}

/// Result of a successful copy-out call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CopyOutcome {
    /// Path was copied
    Copied,
    /// Optional path was absent from the container
    OptionalCopyMissing { path: PathBuf },
    /// Optional path could not be copied; the engine error is kept as text
    OptionalCopyFailed { path: PathBuf, reason: String },
}

/// One build container, removed on every exit path
pub struct ContainerSession<'e> {
    engine: &'e dyn ContainerEngine,
    spec: ContainerSpec,
    state: SessionState,
}

impl std::fmt::Debug for ContainerSession<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerSession")
            .field("engine", &self.engine.name())
            .field("spec", &self.spec)
            .field("state", &self.state)
            .finish()
    }
}

impl<'e> ContainerSession<'e> {
    /// Allocate a session without starting it
    ///
    /// From this point on, dropping the session removes the container.
    pub fn new(engine: &'e dyn ContainerEngine, spec: ContainerSpec) -> Self {
        Self {
            engine,
            spec,
            state: SessionState::Allocated,
        }
    }

    /// Allocate and start a session
    ///
    /// If starting fails the half-built session is dropped, which runs
    /// teardown before the error reaches the caller.
    pub fn open(engine: &'e dyn ContainerEngine, spec: ContainerSpec) -> Result<Self, ContainerError> {
        let mut session = Self::new(engine, spec);
        session.start()?;
        Ok(session)
    }

    /// Start the container
    ///
    /// A name collision with a leftover container is resolved by removing it
    /// and retrying exactly once.
    pub fn start(&mut self) -> Result<(), ContainerError> {
        if self.state != SessionState::Allocated {
            return Err(ContainerError::NotRunning {
                name: self.spec.name.clone(),
            });
        }

        self.engine.ping()?;

        match self.engine.start(&self.spec) {
            Ok(()) => {}
            Err(ContainerError::NameInUse { name }) => {
                tracing::warn!("Removing stale container '{name}' and retrying");
                self.engine.remove(&name).map_err(|e| ContainerError::ContainerStartFailure {
                    image: self.spec.image.clone(),
                    reason: format!("stale container '{name}' could not be removed: {e}"),
                })?;
                self.engine.start(&self.spec).map_err(|e| match e {
                    ContainerError::NameInUse { name } => ContainerError::ContainerStartFailure {
                        image: self.spec.image.clone(),
                        reason: format!("container name '{name}' still in use after removal"),
                    },
                    other => other,
                })?;
            }
            Err(e) => return Err(e),
        }

        tracing::info!("Started container '{}' from {}", self.spec.name, self.spec.image);
        self.state = SessionState::Running;
        Ok(())
    }

    /// Container name
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    fn ensure_running(&self) -> Result<(), ContainerError> {
        if self.state == SessionState::Running {
            Ok(())
        } else {
            Err(ContainerError::NotRunning {
                name: self.spec.name.clone(),
            })
        }
    }

    /// Run a command synchronously; a non-zero exit is an install failure
    pub fn exec(&self, command: &[String]) -> Result<ExecOutput, ContainerError> {
        self.ensure_running()?;
        let output = self.engine.exec(&self.spec.name, command)?;
        if output.success() {
            Ok(output)
        } else {
            Err(ContainerError::PackageInstallFailure {
                exit_code: output.exit_code,
                output: output.output,
            })
        }
    }

    /// Copy a file or tree out of the container
    pub fn copy_out(
        &self,
        source: &Path,
        dest: &Path,
        requirement: CopyRequirement,
    ) -> Result<CopyOutcome, ContainerError> {
        self.ensure_running()?;
        let status = match self.engine.copy_out(&self.spec.name, source, dest) {
            Ok(status) => status,
            Err(e) if requirement == CopyRequirement::Optional => {
                tracing::warn!("Optional copy of {} failed: {e}", source.display());
                return Ok(CopyOutcome::OptionalCopyFailed {
                    path: source.to_path_buf(),
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        };

        match (status, requirement) {
            (CopyStatus::Copied, _) => Ok(CopyOutcome::Copied),
            (CopyStatus::SourceMissing, CopyRequirement::Optional) => {
                Ok(CopyOutcome::OptionalCopyMissing {
                    path: source.to_path_buf(),
                })
            }
            (CopyStatus::SourceMissing, CopyRequirement::Required) => {
                Err(ContainerError::CopyFailure {
                    path: source.to_path_buf(),
                    reason: "path does not exist in the container".to_string(),
                })
            }
        }
    }

    /// Stop and remove the container
    pub fn close(mut self) -> Result<(), ContainerError> {
        self.teardown()
    }

    fn teardown(&mut self) -> Result<(), ContainerError> {
        if self.state == SessionState::Removed {
            return Ok(());
        }
        self.state = SessionState::Removed;
        tracing::debug!("Removing container '{}'", self.spec.name);
        self.engine.remove(&self.spec.name)
    }
}

impl Drop for ContainerSession<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            tracing::warn!("Container teardown failed: {e}");
        }
    }
}
