//! CLI command for `crossroot env`
//!
//! Prints the toolchain environment as `export` lines so a shell can
//! `eval "$(crossroot env)"`.

use anyhow::Result;

use crate::cli::commands::ResolvedTarget;
use crate::cli::output::{is_json, print_json, print_warning};
use crate::core::build_env::ToolchainEnvironment;

/// Execute the env command
pub async fn execute(target: &ResolvedTarget) -> Result<()> {
    if !target.sysroot.is_dir() {
        print_warning(&format!(
            "Sysroot {} does not exist yet",
            target.sysroot.display()
        ));
    }

    let environment = ToolchainEnvironment::for_sysroot(&target.sysroot, &target.platform);

    if is_json() {
        print_json(&serde_json::to_value(environment.vars())?);
    } else {
        print!("{}", environment.to_shell_exports());
    }
    Ok(())
}
