//! CLI command for `crossroot verify`

use anyhow::Result;

use crate::cli::commands::ResolvedTarget;
use crate::cli::output::{is_json, is_quiet, print_info, print_json, print_success, status};
use crate::core::verify::{verify, EntryKind};

/// Execute the verify command
pub async fn execute(target: &ResolvedTarget) -> Result<()> {
    let report = verify(&target.sysroot, &target.platform);

    if is_json() {
        print_json(&serde_json::json!({
            "status": if report.is_complete() { "success" } else { "error" },
            "found_count": report.found_count(),
            "total_count": report.entries.len(),
            "report": &report,
        }));
    } else if !is_quiet() && report.sysroot_exists {
        print_info(&format!(
            "Verifying {} sysroot at {}",
            target.platform,
            target.sysroot.display()
        ));
        println!();
        for kind in [EntryKind::Critical, EntryKind::Startup] {
            for entry in report.entries.iter().filter(|e| e.entry.kind == kind) {
                let marker = if entry.found { status::SUCCESS } else { status::ERROR };
                println!("  {marker} {}", entry.checked_path.display());
            }
        }
        println!();
        if report.is_complete() {
            print_success(&format!(
                "All {} entries present",
                report.entries.len()
            ));
        }
    }

    report.into_result()?;
    Ok(())
}
