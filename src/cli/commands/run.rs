//! CLI command for `crossroot run`
//!
//! Spawns a command with the toolchain environment set on the child only.

use anyhow::{bail, Context, Result};
use std::process::Command;

use crate::cli::commands::ResolvedTarget;
use crate::core::build_env::ToolchainEnvironment;
use crate::core::verify::verify;
use crate::error::SysrootError;

/// Build the child command without spawning it
pub fn prepare(target: &ResolvedTarget, argv: &[String]) -> Result<Command> {
    let Some((program, args)) = argv.split_first() else {
        bail!("No command given");
    };
    let mut command = Command::new(program);
    command.args(args);
    ToolchainEnvironment::for_sysroot(&target.sysroot, &target.platform).apply(&mut command);
    Ok(command)
}

/// Execute the run command
pub async fn execute(target: &ResolvedTarget, argv: &[String]) -> Result<()> {
    let report = verify(&target.sysroot, &target.platform);
    if !report.sysroot_exists {
        return Err(SysrootError::MissingSysroot {
            path: target.sysroot.clone(),
        }
        .into());
    }

    let mut command = prepare(target, argv)?;
    tracing::debug!("Running {argv:?} against {}", target.sysroot.display());

    let status = tokio::task::spawn_blocking(move || command.status())
        .await
        .context("Command task failed")?
        .with_context(|| format!("Failed to run '{}'", argv[0]))?;

    if !status.success() {
        std::process::exit(status.code().unwrap_or(1));
    }
    Ok(())
}
