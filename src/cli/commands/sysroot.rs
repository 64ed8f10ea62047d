//! CLI command for `crossroot sysroot`
//!
//! Provisions a sysroot by installing packages into a throwaway container
//! and copying the results out. The blocking build runs on a worker thread
//! while the main task watches for Ctrl-C; on interruption the container is
//! force-removed by its deterministic name before exiting.

use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::output::{
    create_spinner, is_json, print_detail, print_failure, print_json, print_success,
    print_warning,
};
use crate::config::defaults::{INTERRUPTED_EXIT_CODE, INTERRUPT_GRACE_PERIOD};
use crate::core::packages::PackageSet;
use crate::core::sysroot::{self, BaseImage, BuildRequest, ProvisionWarning};
use crate::core::target::TargetPlatform;
use crate::infra::container::{ContainerEngine, ContainerRuntime, DockerCli};

/// Options for the sysroot command, after precedence is applied
#[derive(Debug, Clone)]
pub struct SysrootOptions {
    /// Target platform
    pub platform: TargetPlatform,
    /// Absolute sysroot path
    pub path: PathBuf,
    /// Base image repository
    pub image: String,
    /// Base image release tag
    pub release: String,
    /// Packages to install
    pub packages: Vec<String>,
    /// Pinned engine command
    pub engine: Option<String>,
}

/// Pick the container engine, honouring an explicit choice
pub fn select_engine(engine: Option<&str>) -> Result<DockerCli> {
    match engine {
        Some(command) => ContainerRuntime::from_command(command)
            .map(DockerCli::new)
            .ok_or_else(|| anyhow!("Unsupported container engine '{command}' (expected docker or podman)")),
        None => Ok(DockerCli::detect()),
    }
}

fn describe(warning: &ProvisionWarning) -> String {
    match warning {
        ProvisionWarning::OptionalCopyMissing { path } => {
            format!("Optional path {} not present in image, skipped", path.display())
        }
        ProvisionWarning::OptionalCopyFailed { path, reason } => {
            format!("Optional path {} could not be copied, skipped: {reason}", path.display())
        }
        ProvisionWarning::SymlinkAlreadyExists { link } => {
            format!("Symlink {} already exists, left unchanged", link.display())
        }
    }
}

fn remove_container(engine: &dyn ContainerEngine, name: &str) {
    if let Err(e) = engine.remove(name) {
        tracing::warn!("Could not remove container '{name}': {e}");
    }
}

/// Remove the build container after an interrupt
///
/// The worker may still be between `ping` and `start`, so the container
/// is removed once immediately and once more after the worker finishes or
/// `grace` elapses.
pub async fn remove_after_interrupt<T>(
    engine: &dyn ContainerEngine,
    name: &str,
    worker: tokio::task::JoinHandle<T>,
    grace: Duration,
) {
    remove_container(engine, name);
    if tokio::time::timeout(grace, worker).await.is_err() {
        tracing::warn!("Build worker still running after {}s", grace.as_secs());
    }
    remove_container(engine, name);
}

/// Execute the sysroot command
pub async fn execute(options: SysrootOptions) -> Result<()> {
    let engine = select_engine(options.engine.as_deref())?;
    let packages = PackageSet::new(&options.packages)?;
    let container = sysroot::container_name(&options.platform);

    let request = BuildRequest {
        path: options.path.clone(),
        packages,
        platform: options.platform.clone(),
        image: BaseImage::new(options.image, options.release),
    };

    tracing::info!(
        "Provisioning {} sysroot at {} using {}",
        request.platform,
        request.path.display(),
        engine.name()
    );

    let spinner = create_spinner(&format!(
        "Provisioning {} sysroot from {}...",
        request.platform,
        request.image.reference()
    ));

    let worker_engine = engine.clone();
    let mut task = tokio::task::spawn_blocking(move || sysroot::build(&worker_engine, &request));

    let joined = tokio::select! {
        joined = &mut task => Some(joined),
        Ok(()) = tokio::signal::ctrl_c() => None,
    };
    let Some(joined) = joined else {
        spinner.finish_and_clear();
        print_warning(&format!("Interrupted, removing container '{container}'"));
        remove_after_interrupt(&engine, &container, task, INTERRUPT_GRACE_PERIOD).await;
        std::process::exit(INTERRUPTED_EXIT_CODE);
    };
    spinner.finish_and_clear();
    let result = joined.context("Sysroot build task failed")?;

    let built = result.with_context(|| {
        format!("Failed to provision sysroot at {}", options.path.display())
    })?;

    for warning in &built.warnings {
        print_warning(&describe(warning));
    }

    let missing = built.report.missing();

    if is_json() {
        print_json(&serde_json::json!({
            "status": if missing.is_empty() { "success" } else { "error" },
            "sysroot": built.sysroot,
            "files": sysroot::file_count(&built.sysroot.root),
            "verification": built.report,
            "warnings": built.warnings,
        }));
    } else if missing.is_empty() {
        print_success(&format!(
            "Sysroot ready at {} ({} files)",
            built.sysroot.root.display(),
            sysroot::file_count(&built.sysroot.root)
        ));
        print_detail(&format!(
            "Next: crossroot config --target {} --path {}",
            built.sysroot.platform,
            built.sysroot.root.display()
        ));
    } else {
        for status in &missing {
            print_failure(&format!(
                "{}: {}",
                status.entry.name,
                status.checked_path.display()
            ));
        }
    }

    if !missing.is_empty() {
        bail!(
            "Sysroot is incomplete: {} of {} checklist entries missing",
            missing.len(),
            built.report.entries.len()
        );
    }

    Ok(())
}
