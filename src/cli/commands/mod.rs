//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod config;
pub mod doctor;
pub mod env;
pub mod run;
pub mod sysroot;
pub mod verify;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::project::ProjectConfig;
use crate::core::target::TargetPlatform;

/// Target and sysroot selection shared by most commands
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Rust target triple (e.g. aarch64-unknown-linux-gnu)
    #[arg(short, long)]
    pub target: Option<String>,

    /// Sysroot directory
    #[arg(short, long)]
    pub path: Option<PathBuf>,
}

/// Target and absolute sysroot path after applying precedence
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    /// Target platform
    pub platform: TargetPlatform,
    /// Absolute sysroot path
    pub sysroot: PathBuf,
}

impl TargetArgs {
    /// Resolve against the project file and defaults
    ///
    /// Relative sysroot paths are anchored at `base` so the generated
    /// configuration never depends on where cargo is later invoked from.
    pub fn resolve(&self, project: &ProjectConfig, base: &Path) -> Result<ResolvedTarget> {
        let triple = project.target_or(self.target.as_deref());
        let platform = TargetPlatform::from_triple(&triple)?;
        let sysroot = absolute(base, &project.sysroot_path_or(self.path.as_deref()));
        Ok(ResolvedTarget { platform, sysroot })
    }
}

/// Anchor a possibly relative path at `base`
pub fn absolute(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Provision a sysroot from a container image
    Sysroot {
        #[command(flatten)]
        target: TargetArgs,

        /// Base image repository
        #[arg(long)]
        image: Option<String>,

        /// Base image release tag
        #[arg(long)]
        release: Option<String>,

        /// Package to install (repeatable, replaces the default set)
        #[arg(long = "package", value_name = "NAME")]
        packages: Vec<String>,

        /// Container engine command (docker or podman)
        #[arg(long, env = "CROSSROOT_ENGINE")]
        engine: Option<String>,
    },

    /// Generate the Cargo build configuration for a sysroot
    Config {
        #[command(flatten)]
        target: TargetArgs,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the configuration even if preflight checks fail
        #[arg(short, long)]
        force: bool,
    },

    /// Check a sysroot for required libraries, headers and startup files
    Verify {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Check the host for the Rust target and cross-linker
    Doctor {
        /// Rust target triple
        #[arg(short, long)]
        target: Option<String>,

        /// Install the Rust target with rustup if it is missing
        #[arg(long)]
        fix: bool,
    },

    /// Print shell exports for the toolchain environment
    Env {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Run a command with the toolchain environment applied
    Run {
        #[command(flatten)]
        target: TargetArgs,

        /// Command and arguments
        #[arg(trailing_var_arg = true, required = true, value_name = "COMMAND")]
        command: Vec<String>,
    },
}

impl Commands {
    /// Execute the command
    pub async fn run(self, config_file: Option<&Path>) -> Result<()> {
        let current_dir = std::env::current_dir()?;
        let project = match config_file {
            Some(path) if !path.is_file() => {
                bail!("Config file '{}' not found", path.display())
            }
            Some(path) => ProjectConfig::load_from_path(path),
            None => ProjectConfig::load(&current_dir),
        }
        .context("Failed to load project configuration")?;

        match self {
            Self::Sysroot {
                target,
                image,
                release,
                packages,
                engine,
            } => {
                let resolved = target.resolve(&project, &current_dir)?;
                let options = sysroot::SysrootOptions {
                    platform: resolved.platform,
                    path: resolved.sysroot,
                    image: project.image_or(image.as_deref()),
                    release: project.release_or(release.as_deref()),
                    packages: project.packages_or(&packages),
                    engine: project.engine_or(engine.as_deref()),
                };
                sysroot::execute(options).await
            }
            Self::Config {
                target,
                output,
                force,
            } => {
                let resolved = target.resolve(&project, &current_dir)?;
                let output = absolute(&current_dir, &project.config_output_or(output.as_deref()));
                config::execute(&resolved, &output, force).await
            }
            Self::Verify { target } => {
                let resolved = target.resolve(&project, &current_dir)?;
                verify::execute(&resolved).await
            }
            Self::Doctor { target, fix } => {
                let platform =
                    TargetPlatform::from_triple(&project.target_or(target.as_deref()))?;
                doctor::execute(&platform, fix).await
            }
            Self::Env { target } => {
                let resolved = target.resolve(&project, &current_dir)?;
                env::execute(&resolved).await
            }
            Self::Run { target, command } => {
                let resolved = target.resolve(&project, &current_dir)?;
                run::execute(&resolved, &command).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_anchors_relative_sysroot() {
        let args = TargetArgs {
            target: Some("x86_64-unknown-linux-gnu".to_string()),
            path: Some(PathBuf::from("build/sysroot")),
        };
        let resolved = args
            .resolve(&ProjectConfig::default(), Path::new("/work"))
            .unwrap();
        assert_eq!(resolved.sysroot, PathBuf::from("/work/build/sysroot"));
        assert_eq!(resolved.platform.multiarch(), "x86_64-linux-gnu");
    }

    #[test]
    fn test_resolve_keeps_absolute_sysroot() {
        let args = TargetArgs {
            target: None,
            path: Some(PathBuf::from("/opt/sysroot")),
        };
        let resolved = args
            .resolve(&ProjectConfig::default(), Path::new("/work"))
            .unwrap();
        assert_eq!(resolved.sysroot, PathBuf::from("/opt/sysroot"));
        assert_eq!(resolved.platform.rust_triple(), "aarch64-unknown-linux-gnu");
    }

    #[test]
    fn test_resolve_rejects_unknown_target() {
        let args = TargetArgs {
            target: Some("mips-unknown-linux-gnu".to_string()),
            path: None,
        };
        assert!(args
            .resolve(&ProjectConfig::default(), Path::new("/work"))
            .is_err());
    }
}
