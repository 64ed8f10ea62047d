//! Toolchain preflight checks
//!
//! Inspects the host, independent of any sysroot: is the Rust target
//! installed, and is the conventional cross-linker on `PATH`. Both checks
//! always run so one pass lists every remediation.

use serde::Serialize;

use crate::config::urls;
use crate::core::target::TargetPlatform;
use crate::error::PreflightError;
use crate::infra::toolchain::ToolchainProbe;

/// Result of a single preflight check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    /// Name of the check
    pub name: String,
    /// Whether the check passed
    pub passed: bool,
    /// What was found (e.g. the resolved linker path)
    pub detail: Option<String>,
    /// Failure, if any
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<PreflightError>,
    /// Remediation steps, as alternatives in preference order
    pub remediation: Vec<String>,
}

fn serialize_error<S: serde::Serializer>(
    error: &Option<PreflightError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

impl CheckResult {
    /// Create a passing check result
    pub fn pass(name: &str, detail: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            detail,
            error: None,
            remediation: Vec::new(),
        }
    }

    /// Create a failing check result
    pub fn fail(name: &str, error: PreflightError, remediation: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            detail: None,
            error: Some(error),
            remediation,
        }
    }
}

/// All preflight results for one target
#[derive(Debug, Clone, Default, Serialize)]
pub struct PreflightReport {
    /// Target that was checked
    pub target: String,
    /// Individual check results, in run order
    pub checks: Vec<CheckResult>,
}

impl PreflightReport {
    /// Check if all checks passed
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    /// Count passed checks
    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    /// Get all failed checks
    pub fn failed(&self) -> Vec<&CheckResult> {
        self.checks.iter().filter(|c| !c.passed).collect()
    }
}

/// Is the Rust target installed?
pub fn check_target_installed(probe: &dyn ToolchainProbe, platform: &TargetPlatform) -> CheckResult {
    const NAME: &str = "Rust target";
    let triple = platform.rust_triple();
    let missing = PreflightError::MissingToolchainTarget {
        target: triple.to_string(),
    };

    match probe.installed_targets() {
        Ok(targets) if targets.iter().any(|t| t == triple) => {
            CheckResult::pass(NAME, Some(format!("{triple} installed")))
        }
        Ok(_) => CheckResult::fail(NAME, missing, vec![format!("rustup target add {triple}")]),
        Err(reason) => {
            tracing::debug!("Could not list installed targets: {reason}");
            CheckResult::fail(
                NAME,
                missing,
                vec![
                    format!("Install rustup from {}", urls::RUSTUP_INSTALL),
                    format!("rustup target add {triple}"),
                ],
            )
        }
    }
}

/// Is the cross-linker on `PATH`?
pub fn check_cross_linker(probe: &dyn ToolchainProbe, platform: &TargetPlatform) -> CheckResult {
    const NAME: &str = "Cross-linker";
    let linker = platform.linker();

    if let Some(path) = probe.find_executable(&linker) {
        return CheckResult::pass(NAME, Some(path.display().to_string()));
    }

    let triple = platform.rust_triple();
    let multiarch = platform.multiarch();
    CheckResult::fail(
        NAME,
        PreflightError::MissingCrossLinker {
            linker: linker.clone(),
        },
        vec![
            format!(
                "Native package manager: sudo apt-get install gcc-{multiarch} (Fedora: sudo dnf install gcc-{multiarch})"
            ),
            format!(
                "Containerized cross-build wrapper: cargo install cross, then cross build --target {triple} (see {})",
                urls::CROSS_REPOSITORY
            ),
            format!(
                "Docker-based build: docker run --rm -v \"$PWD\":/project -w /project {}/{triple}:main cargo build --target {triple}",
                urls::CROSS_IMAGE_REGISTRY
            ),
        ],
    )
}

/// Run every preflight check
pub fn check(probe: &dyn ToolchainProbe, platform: &TargetPlatform) -> PreflightReport {
    let checks = vec![
        check_target_installed(probe, platform),
        check_cross_linker(probe, platform),
    ];

    for failed in checks.iter().filter(|c| !c.passed) {
        if let Some(error) = &failed.error {
            tracing::warn!("{error}");
        }
    }

    PreflightReport {
        target: platform.rust_triple().to_string(),
        checks,
    }
}
