//! CLI command for `crossroot doctor`
//!
//! Checks the host toolchain and reports issues with remediation steps.

use anyhow::{anyhow, Result};

use crate::cli::commands::config::print_preflight_failures;
use crate::cli::output::{
    is_json, is_quiet, print_info, print_json, print_success, print_warning, status,
};
use crate::core::preflight::{self, PreflightReport};
use crate::core::target::TargetPlatform;
use crate::error::PreflightError;
use crate::infra::toolchain::HostToolchain;

/// Install the Rust target if its check failed, then re-run the checks
fn fix_target(
    toolchain: &HostToolchain,
    platform: &TargetPlatform,
    report: PreflightReport,
) -> Result<PreflightReport> {
    let target_missing = report
        .failed()
        .iter()
        .any(|c| matches!(c.error, Some(PreflightError::MissingToolchainTarget { .. })));
    if !target_missing {
        return Ok(report);
    }

    print_info(&format!("Running rustup target add {platform}..."));
    toolchain
        .add_target(platform.rust_triple())
        .map_err(|e| anyhow!("Failed to install Rust target {platform}: {e}"))?;
    Ok(preflight::check(toolchain, platform))
}

/// Execute the doctor command
pub async fn execute(platform: &TargetPlatform, fix: bool) -> Result<()> {
    let toolchain = HostToolchain::default();
    let mut report = preflight::check(&toolchain, platform);
    if fix {
        report = fix_target(&toolchain, platform, report)?;
        if !report.all_passed() {
            print_warning("--fix only installs the Rust target; the cross-linker must be installed manually");
        }
    }
    let passed = report.passed_count();
    let total = report.checks.len();

    // JSON output mode
    if is_json() {
        print_json(&serde_json::json!({
            "status": if report.all_passed() { "success" } else { "error" },
            "report": &report,
            "passed_count": passed,
            "total_count": total,
        }));
        if !report.all_passed() {
            return Err(anyhow!("{} of {total} checks failed", total - passed));
        }
        return Ok(());
    }

    // Quiet mode - only show errors
    if is_quiet() {
        for check in report.failed() {
            eprintln!("{} {}", status::ERROR, check.name);
        }
    } else {
        print_info(&format!("Checking toolchain for {platform}..."));
        println!();
        for check in report.checks.iter().filter(|c| c.passed) {
            let detail = check
                .detail
                .as_ref()
                .map(|d| format!(" ({d})"))
                .unwrap_or_default();
            println!("  {} {}{detail}", status::SUCCESS, check.name);
        }
        print_preflight_failures(&report);
        println!();
    }

    if report.all_passed() {
        print_success(&format!("All checks passed ({passed}/{total})"));
        Ok(())
    } else {
        Err(anyhow!(
            "{passed}/{total} checks passed. Install the missing tools listed above."
        ))
    }
}
