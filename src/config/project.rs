//! Project configuration management
//!
//! Reads optional settings from `crossroot.toml` in the working directory.
//! Every field is optional; CLI flags take precedence over the file and the
//! file takes precedence over [`crate::config::defaults`].

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::defaults;
use crate::error::ConfigError;

/// Project configuration for crossroot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Target settings
    #[serde(default)]
    pub target: TargetConfig,

    /// Sysroot provisioning settings
    #[serde(default)]
    pub sysroot: SysrootConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Target configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Rust target triple
    pub triple: Option<String>,
}

/// Sysroot provisioning configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SysrootConfig {
    /// Sysroot directory
    pub path: Option<PathBuf>,

    /// Base image repository
    pub image: Option<String>,

    /// Platform-version tag of the base image
    pub release: Option<String>,

    /// Packages to install, in install order
    pub packages: Option<Vec<String>>,

    /// Container engine command (`docker` or `podman`)
    pub engine: Option<String>,
}

/// Output configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Where the build configuration artifact is written
    pub config_path: Option<PathBuf>,
}

impl ProjectConfig {
    /// Load the project configuration from a directory
    ///
    /// Returns defaults when `crossroot.toml` does not exist.
    pub fn load(project_dir: &Path) -> Result<Self, ConfigError> {
        Self::load_from_path(&project_dir.join(defaults::PROJECT_CONFIG_FILE))
    }

    /// Load the project configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` if the file exists but is not valid
    /// TOML or contains unknown keys.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Effective target triple
    pub fn target_or(&self, cli: Option<&str>) -> String {
        cli.map(String::from)
            .or_else(|| self.target.triple.clone())
            .unwrap_or_else(|| defaults::DEFAULT_TARGET.to_string())
    }

    /// Effective sysroot path
    pub fn sysroot_path_or(&self, cli: Option<&Path>) -> PathBuf {
        cli.map(Path::to_path_buf)
            .or_else(|| self.sysroot.path.clone())
            .unwrap_or_else(|| PathBuf::from(defaults::DEFAULT_SYSROOT_DIR))
    }

    /// Effective base image repository
    pub fn image_or(&self, cli: Option<&str>) -> String {
        cli.map(String::from)
            .or_else(|| self.sysroot.image.clone())
            .unwrap_or_else(|| defaults::DEFAULT_BASE_IMAGE.to_string())
    }

    /// Effective platform-version tag
    pub fn release_or(&self, cli: Option<&str>) -> String {
        cli.map(String::from)
            .or_else(|| self.sysroot.release.clone())
            .unwrap_or_else(|| defaults::DEFAULT_RELEASE.to_string())
    }

    /// Effective package list; an empty CLI list falls through to the file
    pub fn packages_or(&self, cli: &[String]) -> Vec<String> {
        if !cli.is_empty() {
            return cli.to_vec();
        }
        self.sysroot.packages.clone().unwrap_or_else(|| {
            defaults::DEFAULT_PACKAGES
                .iter()
                .map(|p| (*p).to_string())
                .collect()
        })
    }

    /// Effective engine command, if pinned
    pub fn engine_or(&self, cli: Option<&str>) -> Option<String> {
        cli.map(String::from).or_else(|| self.sysroot.engine.clone())
    }

    /// Effective artifact location
    pub fn config_output_or(&self, cli: Option<&Path>) -> PathBuf {
        cli.map(Path::to_path_buf)
            .or_else(|| self.output.config_path.clone())
            .unwrap_or_else(|| PathBuf::from(defaults::DEFAULT_CONFIG_OUTPUT))
    }
}
