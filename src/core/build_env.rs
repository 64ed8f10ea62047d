//! Cross-build environment derivation
//!
//! Computes the environment variables and linker flags a cross build needs
//! from nothing but a sysroot path and a target platform. The result is an
//! explicit value: it is rendered into the configuration artifact, printed
//! as shell exports, or applied to a child process, and never written into
//! this process's own environment.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::core::target::TargetPlatform;

/// Names of the variables derived from the sysroot
pub const PKG_CONFIG_PATH: &str = "PKG_CONFIG_PATH";
pub const PKG_CONFIG_LIBDIR: &str = "PKG_CONFIG_LIBDIR";
pub const PKG_CONFIG_SYSROOT_DIR: &str = "PKG_CONFIG_SYSROOT_DIR";
pub const OPENSSL_DIR: &str = "OPENSSL_DIR";
pub const OPENSSL_LIB_DIR: &str = "OPENSSL_LIB_DIR";
pub const OPENSSL_INCLUDE_DIR: &str = "OPENSSL_INCLUDE_DIR";
pub const CPPFLAGS: &str = "CPPFLAGS";
pub const LDFLAGS: &str = "LDFLAGS";
pub const TARGET_CFLAGS: &str = "TARGET_CFLAGS";

/// pkg-config control variables
pub const PKG_CONFIG_DIR: &str = "PKG_CONFIG_DIR";
pub const PKG_CONFIG_ALLOW_CROSS: &str = "PKG_CONFIG_ALLOW_CROSS";

/// Well-known directories inside a sysroot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysrootPaths {
    root: PathBuf,
    multiarch: String,
}

impl SysrootPaths {
    /// Paths for a sysroot and target
    pub fn new(root: &Path, platform: &TargetPlatform) -> Self {
        Self {
            root: root.to_path_buf(),
            multiarch: platform.multiarch().to_string(),
        }
    }

    /// Sysroot root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/usr`
    pub fn usr(&self) -> PathBuf {
        self.root.join("usr")
    }

    /// `<root>/usr/lib/<multiarch>`
    pub fn usr_lib_arch(&self) -> PathBuf {
        self.root.join("usr/lib").join(&self.multiarch)
    }

    /// `<root>/lib/<multiarch>`
    pub fn lib_arch(&self) -> PathBuf {
        self.root.join("lib").join(&self.multiarch)
    }

    /// `<root>/usr/include`
    pub fn include(&self) -> PathBuf {
        self.root.join("usr/include")
    }

    /// `<root>/usr/include/<multiarch>`
    pub fn include_arch(&self) -> PathBuf {
        self.root.join("usr/include").join(&self.multiarch)
    }

    /// pkg-config search directories: architecture-specific, generic, share
    pub fn pkgconfig_dirs(&self) -> [PathBuf; 3] {
        [
            self.usr_lib_arch().join("pkgconfig"),
            self.root.join("usr/lib/pkgconfig"),
            self.root.join("usr/share/pkgconfig"),
        ]
    }
}

fn join_paths(paths: &[PathBuf], sep: &str) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(sep)
}

/// Environment variables for a cross build
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToolchainEnvironment {
    vars: BTreeMap<String, String>,
}

impl ToolchainEnvironment {
    /// Derive the environment for a sysroot
    ///
    /// Pure: the result depends only on the arguments, not on what exists
    /// on disk.
    pub fn for_sysroot(sysroot: &Path, platform: &TargetPlatform) -> Self {
        let paths = SysrootPaths::new(sysroot, platform);
        let pkgconfig = join_paths(&paths.pkgconfig_dirs(), ":");
        let include_flags = format!(
            "-I{} -I{}",
            paths.include().display(),
            paths.include_arch().display()
        );
        let lib_flags = format!(
            "-L{} -L{}",
            paths.usr_lib_arch().display(),
            paths.lib_arch().display()
        );

        let mut vars = BTreeMap::new();
        vars.insert(PKG_CONFIG_PATH.to_string(), pkgconfig.clone());
        vars.insert(PKG_CONFIG_LIBDIR.to_string(), pkgconfig);
        vars.insert(
            PKG_CONFIG_SYSROOT_DIR.to_string(),
            paths.root().display().to_string(),
        );
        vars.insert(PKG_CONFIG_DIR.to_string(), String::new());
        vars.insert(PKG_CONFIG_ALLOW_CROSS.to_string(), "1".to_string());
        vars.insert(OPENSSL_DIR.to_string(), paths.usr().display().to_string());
        vars.insert(
            OPENSSL_LIB_DIR.to_string(),
            paths.usr_lib_arch().display().to_string(),
        );
        vars.insert(
            OPENSSL_INCLUDE_DIR.to_string(),
            paths.include().display().to_string(),
        );
        vars.insert(
            TARGET_CFLAGS.to_string(),
            format!("{include_flags} --sysroot={}", paths.root().display()),
        );
        vars.insert(CPPFLAGS.to_string(), include_flags);
        vars.insert(LDFLAGS.to_string(), lib_flags);

        Self { vars }
    }

    /// Look up one variable
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// All variables, sorted by name
    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    /// Number of variables
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether there are no variables
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// POSIX shell `export` lines, suitable for `eval`
    pub fn to_shell_exports(&self) -> String {
        self.vars
            .iter()
            .map(|(key, value)| format!("export {key}={}\n", shell_quote(value)))
            .collect()
    }

    /// Apply to a child process
    pub fn apply(&self, command: &mut Command) {
        command.envs(&self.vars);
    }
}

/// Single-quote a value for POSIX shells
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Linker invocation flags, in the order the linker must see them
///
/// The linker override comes first, then the `-rpath-link` directories,
/// then `--sysroot`.
pub fn linker_flags(sysroot: &Path, platform: &TargetPlatform) -> Vec<String> {
    let paths = SysrootPaths::new(sysroot, platform);
    vec![
        "-C".to_string(),
        format!("linker={}", platform.linker()),
        "-C".to_string(),
        format!("link-arg=-Wl,-rpath-link,{}", paths.usr_lib_arch().display()),
        "-C".to_string(),
        format!("link-arg=-Wl,-rpath-link,{}", paths.lib_arch().display()),
        "-C".to_string(),
        format!("link-arg=--sysroot={}", paths.root().display()),
    ]
}
