//! Host toolchain queries
//!
//! Asks rustup which targets are installed and looks up executables on
//! `PATH`.

use std::path::{Path, PathBuf};
use std::process::Command;

/// What the preflight checks need to know about the host
pub trait ToolchainProbe {
    /// Installed Rust targets, or an error message if they cannot be listed
    fn installed_targets(&self) -> Result<Vec<String>, String>;

    /// Resolve an executable on the search path
    fn find_executable(&self, name: &str) -> Option<PathBuf>;
}

/// Probe backed by `rustup` and the `which` crate
#[derive(Debug, Clone)]
pub struct HostToolchain {
    rustup: PathBuf,
}

impl HostToolchain {
    /// Create a probe using a specific rustup binary
    pub fn new(rustup: PathBuf) -> Self {
        Self { rustup }
    }

    /// Get the rustup binary in use
    pub fn rustup(&self) -> &Path {
        &self.rustup
    }

    /// Install a Rust target with `rustup target add`
    pub fn add_target(&self, triple: &str) -> Result<(), String> {
        tracing::info!("Installing Rust target {triple}");
        let output = Command::new(&self.rustup)
            .args(["target", "add", triple])
            .output()
            .map_err(|e| format!("failed to run {}: {e}", self.rustup.display()))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(String::from_utf8_lossy(&output.stderr).trim().to_string())
        }
    }
}

impl Default for HostToolchain {
    fn default() -> Self {
        Self::new(PathBuf::from("rustup"))
    }
}

/// Parse `rustup target list --installed` output
pub fn parse_installed_targets(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.trim_end_matches(" (installed)").to_string())
        .collect()
}

impl ToolchainProbe for HostToolchain {
    fn installed_targets(&self) -> Result<Vec<String>, String> {
        let output = Command::new(&self.rustup)
            .args(["target", "list", "--installed"])
            .output()
            .map_err(|e| format!("failed to run {}: {e}", self.rustup.display()))?;

        if !output.status.success() {
            return Err(String::from_utf8_lossy(&output.stderr).trim().to_string());
        }
        Ok(parse_installed_targets(&String::from_utf8_lossy(&output.stdout)))
    }

    fn find_executable(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_installed_targets() {
        let output = "x86_64-unknown-linux-gnu\naarch64-unknown-linux-gnu\n\n";
        assert_eq!(
            parse_installed_targets(output),
            vec!["x86_64-unknown-linux-gnu", "aarch64-unknown-linux-gnu"]
        );
    }

    #[test]
    fn test_parse_strips_installed_marker() {
        let output = "aarch64-unknown-linux-gnu (installed)\n";
        assert_eq!(parse_installed_targets(output), vec!["aarch64-unknown-linux-gnu"]);
    }

    #[test]
    fn test_add_target_reports_missing_rustup() {
        let toolchain = HostToolchain::new(PathBuf::from("/nonexistent/rustup"));
        let err = toolchain.add_target("aarch64-unknown-linux-gnu").unwrap_err();
        assert!(err.contains("/nonexistent/rustup"));
    }

    #[test]
    fn test_default_uses_rustup_on_path() {
        assert_eq!(HostToolchain::default().rustup(), Path::new("rustup"));
    }
}
