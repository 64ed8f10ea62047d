//! Sysroot tree builder
//!
//! Populates a local directory with the foreign platform's libraries,
//! headers and pkg-config metadata by installing packages into a throwaway
//! container and copying the results out.
//!
//! The build always starts from an empty tree: an existing sysroot at the
//! same path is removed first so files from an earlier package set never
//! survive into the new one.

use serde::Serialize;
use std::path::{Component, Path, PathBuf};

use crate::config::defaults;
use crate::core::packages::PackageSet;
use crate::core::target::TargetPlatform;
use crate::core::verify::{verify, VerificationReport};
use crate::error::SysrootError;
use crate::infra::container::{ContainerEngine, ContainerSpec};
use crate::infra::filesystem::{self, SymlinkStatus};
use crate::infra::session::{ContainerSession, CopyOutcome, CopyRequirement};

/// Base image and release to provision from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BaseImage {
    /// Image repository (e.g. `ubuntu`)
    pub repository: String,
    /// Platform-version tag (e.g. `22.04`)
    pub release: String,
}

impl BaseImage {
    /// Create a base image reference
    pub fn new(repository: impl Into<String>, release: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            release: release.into(),
        }
    }

    /// Full image reference
    pub fn reference(&self) -> String {
        format!("{}:{}", self.repository, self.release)
    }
}

impl Default for BaseImage {
    fn default() -> Self {
        Self::new(defaults::DEFAULT_BASE_IMAGE, defaults::DEFAULT_RELEASE)
    }
}

/// A path copied out of the container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyStep {
    /// Absolute path inside the container
    pub source: PathBuf,
    /// Path relative to the sysroot root
    pub dest: PathBuf,
    /// Whether a missing source aborts the build
    pub requirement: CopyRequirement,
}

/// A compatibility symlink inside the sysroot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatLink {
    /// Link path relative to the sysroot root
    pub link: PathBuf,
    /// Relative link target
    pub target: PathBuf,
}

/// Directory layout of a sysroot for one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysrootLayout {
    multiarch: String,
    rust_triple: String,
}

impl SysrootLayout {
    /// Layout for a target platform
    pub fn for_target(platform: &TargetPlatform) -> Self {
        Self {
            multiarch: platform.multiarch().to_string(),
            rust_triple: platform.rust_triple().to_string(),
        }
    }

    /// Directories created before any copy
    ///
    /// Required destinations are created outright so their contents are
    /// copied into them. Optional destinations only get their parent, since
    /// engines do not create missing parents on copy-out.
    pub fn skeleton(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = Vec::new();
        for step in self.copy_steps() {
            let dir = match step.requirement {
                CopyRequirement::Required => Some(step.dest),
                CopyRequirement::Optional => step
                    .dest
                    .parent()
                    .filter(|parent| !parent.as_os_str().is_empty())
                    .map(Path::to_path_buf),
            };
            if let Some(dir) = dir {
                if !dirs.contains(&dir) {
                    dirs.push(dir);
                }
            }
        }
        dirs
    }

    /// Copy-out steps, required ones first
    pub fn copy_steps(&self) -> Vec<CopyStep> {
        let required = [
            format!("usr/lib/{}", self.multiarch),
            format!("lib/{}", self.multiarch),
            "usr/include".to_string(),
        ];
        let optional = ["lib64", "usr/lib/pkgconfig", "usr/share/pkgconfig"];

        required
            .iter()
            .map(|rel| CopyStep {
                source: Path::new("/").join(rel),
                dest: PathBuf::from(rel),
                requirement: CopyRequirement::Required,
            })
            .chain(optional.iter().map(|rel| CopyStep {
                source: Path::new("/").join(rel),
                dest: PathBuf::from(rel),
                requirement: CopyRequirement::Optional,
            }))
            .collect()
    }

    /// Symlinks that let a linker that skips the multiarch directory still
    /// find libraries
    pub fn compat_links(&self) -> Vec<CompatLink> {
        vec![
            CompatLink {
                link: PathBuf::from("usr/lib64"),
                target: PathBuf::from("lib").join(&self.multiarch),
            },
            CompatLink {
                link: PathBuf::from("usr/lib").join(&self.rust_triple),
                target: PathBuf::from(&self.multiarch),
            },
        ]
    }
}

/// Non-fatal event recorded during a build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProvisionWarning {
    /// An optional path did not exist in the container
    OptionalCopyMissing { path: PathBuf },
    /// Copying an optional path failed for another reason
    OptionalCopyFailed { path: PathBuf, reason: String },
    /// A compatibility symlink was already present and left alone
    SymlinkAlreadyExists { link: PathBuf },
}

/// A provisioned sysroot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sysroot {
    /// Root directory
    pub root: PathBuf,
    /// Target it was built for
    pub platform: TargetPlatform,
    /// Subpaths that were populated from the container
    pub populated: Vec<PathBuf>,
}

/// Result of [`build`]
#[derive(Debug, Clone, Serialize)]
pub struct SysrootBuild {
    /// The sysroot
    pub sysroot: Sysroot,
    /// Verification run straight after the build
    pub report: VerificationReport,
    /// Non-fatal events, in order
    pub warnings: Vec<ProvisionWarning>,
}

/// Inputs of a sysroot build
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Sysroot directory
    pub path: PathBuf,
    /// Packages to install
    pub packages: PackageSet,
    /// Target platform
    pub platform: TargetPlatform,
    /// Base image
    pub image: BaseImage,
}

/// Deterministic container name for a target
pub fn container_name(platform: &TargetPlatform) -> String {
    format!("{}-{}", defaults::CONTAINER_NAME_PREFIX, platform.rust_triple())
}

/// Reject paths that would make the initial wipe dangerous
///
/// The last component must be a plain name, and the path must not resolve
/// to the working directory or one of its ancestors.
fn check_sysroot_path(path: &Path) -> Result<(), SysrootError> {
    let unsafe_path = || SysrootError::UnsafeSysrootPath {
        path: path.to_path_buf(),
    };

    if !matches!(path.components().next_back(), Some(Component::Normal(_))) {
        return Err(unsafe_path());
    }

    // `components()` drops a trailing `.`, so `<cwd>/.` has to be caught here
    if let Ok(cwd) = std::env::current_dir() {
        let resolved = path.canonicalize().unwrap_or_else(|_| cwd.join(path));
        let cwd = cwd.canonicalize().unwrap_or(cwd);
        if cwd.starts_with(&resolved) {
            return Err(unsafe_path());
        }
    }
    Ok(())
}

/// Create the compatibility symlinks
///
/// A link that already exists is skipped and reported as a warning.
pub fn link_search_paths(
    root: &Path,
    layout: &SysrootLayout,
) -> Result<Vec<ProvisionWarning>, SysrootError> {
    let mut warnings = Vec::new();
    for compat in layout.compat_links() {
        match create_compat_link(root, &compat) {
            Ok(()) => {}
            Err(SysrootError::SymlinkAlreadyExists { link }) => {
                tracing::warn!("Symlink {} already exists, skipping", link.display());
                warnings.push(ProvisionWarning::SymlinkAlreadyExists { link });
            }
            Err(e) => return Err(e),
        }
    }
    Ok(warnings)
}

/// Create one compatibility symlink
///
/// Fails with `SysrootError::SymlinkAlreadyExists` if the link path is taken.
pub fn create_compat_link(root: &Path, compat: &CompatLink) -> Result<(), SysrootError> {
    let link = root.join(&compat.link);
    match filesystem::create_symlink(&compat.target, &link)? {
        SymlinkStatus::Created => {
            tracing::debug!("Linked {} -> {}", link.display(), compat.target.display());
            Ok(())
        }
        SymlinkStatus::AlreadyExists => Err(SysrootError::SymlinkAlreadyExists { link }),
    }
}

/// Build a sysroot
///
/// Required-step failures abort after the container is removed. Missing
/// checklist entries do not fail the build; they are returned in the report.
pub fn build(
    engine: &dyn ContainerEngine,
    request: &BuildRequest,
) -> Result<SysrootBuild, SysrootError> {
    let root = &request.path;
    check_sysroot_path(root)?;
    let layout = SysrootLayout::for_target(&request.platform);

    if root.symlink_metadata().is_ok() {
        tracing::info!("Removing existing sysroot at {}", root.display());
        filesystem::remove_dir_all(root)?;
    }
    for dir in layout.skeleton() {
        filesystem::create_dir_all(&root.join(dir))?;
    }

    let spec = ContainerSpec {
        name: container_name(&request.platform),
        image: request.image.reference(),
        platform: Some(request.platform.container_platform().to_string()),
    };

    let mut warnings = Vec::new();
    let mut populated = Vec::new();

    let session = ContainerSession::open(engine, spec)?;

    tracing::info!(
        "Installing {} packages: {}",
        request.packages.len(),
        request.packages.as_slice().join(" ")
    );
    session.exec(&request.packages.install_command())?;

    for step in layout.copy_steps() {
        let dest = root.join(&step.dest);
        match session.copy_out(&step.source, &dest, step.requirement)? {
            CopyOutcome::Copied => {
                tracing::debug!("Copied {} -> {}", step.source.display(), dest.display());
                populated.push(step.dest);
            }
            CopyOutcome::OptionalCopyMissing { path } => {
                tracing::warn!("Optional path {} not present in container", path.display());
                warnings.push(ProvisionWarning::OptionalCopyMissing { path });
            }
            CopyOutcome::OptionalCopyFailed { path, reason } => {
                warnings.push(ProvisionWarning::OptionalCopyFailed { path, reason });
            }
        }
    }

    warnings.extend(link_search_paths(root, &layout)?);

    if let Err(e) = session.close() {
        tracing::warn!("Container teardown failed: {e}");
    }

    let report = verify(root, &request.platform);
    tracing::info!(
        "Sysroot verification: {}/{} entries found",
        report.found_count(),
        report.entries.len()
    );

    Ok(SysrootBuild {
        sysroot: Sysroot {
            root: root.clone(),
            platform: request.platform.clone(),
            populated,
        },
        report,
        warnings,
    })
}

/// Count regular files under a sysroot
pub fn file_count(root: &Path) -> usize {
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .count()
}
