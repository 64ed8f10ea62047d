//! CLI command for `crossroot config`
//!
//! Verifies the sysroot, runs the toolchain preflight and writes the Cargo
//! build configuration. A missing sysroot is fatal. An incomplete sysroot
//! is only a warning. Preflight failures are fatal unless `--force` is
//! given, in which case the configuration still names the expected linker.

use anyhow::{bail, Result};
use std::path::Path;

use crate::cli::commands::ResolvedTarget;
use crate::cli::output::{
    is_json, print_detail, print_failure, print_json, print_success, print_warning,
};
use crate::core::cargo_config;
use crate::core::preflight::PreflightReport;
use crate::infra::toolchain::HostToolchain;

/// Print each failed preflight check with its remediation steps
pub fn print_preflight_failures(report: &PreflightReport) {
    for check in report.failed() {
        let message = check
            .error
            .as_ref()
            .map_or_else(|| check.name.clone(), ToString::to_string);
        print_failure(&message);
        for (i, step) in check.remediation.iter().enumerate() {
            print_detail(&format!("{}. {step}", i + 1));
        }
    }
}

/// Execute the config command
pub async fn execute(target: &ResolvedTarget, output: &Path, force: bool) -> Result<()> {
    let outcome = cargo_config::configure(
        &HostToolchain::default(),
        &target.sysroot,
        &target.platform,
        output,
        force,
    )?;

    for status in outcome.verification.missing() {
        print_warning(&format!(
            "Sysroot is missing {} ({})",
            status.entry.name,
            status.checked_path.display()
        ));
    }

    let preflight_passed = outcome.preflight.all_passed();
    if !preflight_passed && !is_json() {
        print_preflight_failures(&outcome.preflight);
    }

    if is_json() {
        let complete = outcome.verification.is_complete();
        print_json(&serde_json::json!({
            "status": match (&outcome.artifact, complete && preflight_passed) {
                (None, _) => "error",
                (Some(_), true) => "success",
                (Some(_), false) => "warning",
            },
            "output": output,
            "outcome": &outcome,
        }));
    }

    if outcome.artifact.is_none() {
        bail!(
            "{} of {} preflight checks failed (use --force to write the configuration anyway)",
            outcome.preflight.failed().len(),
            outcome.preflight.checks.len()
        );
    }
    if !preflight_passed {
        print_warning("Wrote configuration despite failed preflight checks");
    }

    print_success(&format!("Wrote {}", output.display()));
    print_detail(&format!("Target: {}", target.platform));
    print_detail(&format!("Linker: {}", target.platform.linker()));
    print_detail(&format!("Sysroot: {}", target.sysroot.display()));
    if outcome.verification.is_complete() {
        print_detail(&format!("Build with: cargo build --target {}", target.platform));
    }

    Ok(())
}
