//! Build configuration artifact
//!
//! A typed model of the Cargo configuration file that wires a cross build
//! to a sysroot. The model is serialized through one renderer, the rendered
//! text is parsed back before anything touches disk, and the file is always
//! replaced whole.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::core::build_env::{linker_flags, ToolchainEnvironment};
use crate::core::preflight::{self, PreflightReport};
use crate::core::target::TargetPlatform;
use crate::core::verify::{verify, VerificationReport};
use crate::error::{ArtifactError, CrossrootError, SysrootError};
use crate::infra::filesystem;
use crate::infra::toolchain::ToolchainProbe;

/// `[build]` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSection {
    /// Default build target
    pub target: String,
}

/// `[target.<triple>]` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSection {
    /// Linker override
    pub linker: String,
    /// Ordered linker/compiler flags
    pub rustflags: Vec<String>,
}

/// The persisted build configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfigArtifact {
    /// Build target
    pub build: BuildSection,
    /// Per-target settings, keyed by triple
    pub target: BTreeMap<String, TargetSection>,
    /// Environment block
    pub env: BTreeMap<String, String>,
}

impl BuildConfigArtifact {
    /// Derive the artifact from a sysroot path and target
    pub fn derive(sysroot: &Path, platform: &TargetPlatform) -> Self {
        Self::from_environment(
            platform,
            &ToolchainEnvironment::for_sysroot(sysroot, platform),
            linker_flags(sysroot, platform),
        )
    }

    /// Assemble the artifact from an already derived environment
    pub fn from_environment(
        platform: &TargetPlatform,
        environment: &ToolchainEnvironment,
        rustflags: Vec<String>,
    ) -> Self {
        let triple = platform.rust_triple().to_string();
        let mut target = BTreeMap::new();
        target.insert(
            triple.clone(),
            TargetSection {
                linker: platform.linker(),
                rustflags,
            },
        );

        Self {
            build: BuildSection { target: triple },
            target,
            env: environment.vars().clone(),
        }
    }

    /// Linker override for the build target
    pub fn linker(&self) -> Option<&str> {
        self.target
            .get(&self.build.target)
            .map(|t| t.linker.as_str())
    }

    /// Render the artifact with a generation timestamp header
    ///
    /// The header comment is the only part that varies between runs.
    pub fn render(&self, generated_at: OffsetDateTime) -> Result<String, ArtifactError> {
        let body = toml::to_string(self).map_err(|e| ArtifactError::Render {
            error: e.to_string(),
        })?;

        // Never hand out text that does not read back as the same model
        let parsed: Self = toml::from_str(&body).map_err(|e| ArtifactError::Malformed {
            error: e.to_string(),
        })?;
        if &parsed != self {
            return Err(ArtifactError::Malformed {
                error: "rendered configuration does not round-trip".to_string(),
            });
        }

        let timestamp = generated_at
            .format(&Rfc3339)
            .map_err(|e| ArtifactError::Render {
                error: e.to_string(),
            })?;

        Ok(format!(
            "# Generated by crossroot at {timestamp}\n# Regenerate with `crossroot config`; manual edits are overwritten.\n\n{body}"
        ))
    }

    /// Render and write the artifact, replacing any existing file
    pub fn write_to(&self, path: &Path) -> Result<(), ArtifactError> {
        let content = self.render(OffsetDateTime::now_utc())?;
        filesystem::write_file_atomic(path, &content)?;
        tracing::info!("Wrote build configuration to {}", path.display());
        Ok(())
    }
}

/// Derive and persist the build configuration for a sysroot
///
/// Does not check the sysroot or the host toolchain; callers run
/// verification and preflight first and decide whether to proceed.
pub fn generate(
    sysroot: &Path,
    platform: &TargetPlatform,
    output: &Path,
) -> Result<BuildConfigArtifact, ArtifactError> {
    let artifact = BuildConfigArtifact::derive(sysroot, platform);
    artifact.write_to(output)?;
    Ok(artifact)
}

/// Result of the verify, preflight, generate sequence
#[derive(Debug, Clone, Serialize)]
pub struct ConfigureOutcome {
    /// Sysroot verification, possibly incomplete
    pub verification: VerificationReport,
    /// Host toolchain checks
    pub preflight: PreflightReport,
    /// Written artifact; `None` when preflight failed and was not forced
    pub artifact: Option<BuildConfigArtifact>,
}

/// Verify the sysroot, check the host and write the configuration
///
/// A missing sysroot is an error. An incomplete sysroot is reported in the
/// outcome and does not stop generation. A failed preflight stops
/// generation unless `force` is set.
pub fn configure(
    probe: &dyn ToolchainProbe,
    sysroot: &Path,
    platform: &TargetPlatform,
    output: &Path,
    force: bool,
) -> Result<ConfigureOutcome, CrossrootError> {
    let verification = verify(sysroot, platform);
    if !verification.sysroot_exists {
        return Err(SysrootError::MissingSysroot {
            path: sysroot.to_path_buf(),
        }
        .into());
    }
    if !verification.is_complete() {
        tracing::warn!(
            "Sysroot is missing {} of {} checklist entries",
            verification.missing().len(),
            verification.entries.len()
        );
    }

    let preflight = preflight::check(probe, platform);
    let artifact = if preflight.all_passed() || force {
        Some(generate(sysroot, platform, output)?)
    } else {
        None
    };

    Ok(ConfigureOutcome {
        verification,
        preflight,
        artifact,
    })
}

/// Strip comment lines, leaving the deterministic body
pub fn body_without_comments(rendered: &str) -> String {
    rendered
        .lines()
        .filter(|line| !line.starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
}
