//! Target platform resolution
//!
//! Maps a Rust target triple onto the names the foreign platform uses for
//! the same thing: the Debian multiarch tuple, the container platform and
//! the conventional cross-linker binary.

use serde::Serialize;
use std::fmt;

use crate::error::TargetError;

/// Static description of one supported target
struct TargetSpec {
    rust_triple: &'static str,
    multiarch: &'static str,
    container_platform: &'static str,
}

const SUPPORTED_TARGETS: &[TargetSpec] = &[
    TargetSpec {
        rust_triple: "aarch64-unknown-linux-gnu",
        multiarch: "aarch64-linux-gnu",
        container_platform: "linux/arm64",
    },
    TargetSpec {
        rust_triple: "armv7-unknown-linux-gnueabihf",
        multiarch: "arm-linux-gnueabihf",
        container_platform: "linux/arm/v7",
    },
    TargetSpec {
        rust_triple: "x86_64-unknown-linux-gnu",
        multiarch: "x86_64-linux-gnu",
        container_platform: "linux/amd64",
    },
    TargetSpec {
        rust_triple: "riscv64gc-unknown-linux-gnu",
        multiarch: "riscv64-linux-gnu",
        container_platform: "linux/riscv64",
    },
];

/// A resolved target platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetPlatform {
    rust_triple: String,
    multiarch: String,
    container_platform: String,
}

impl TargetPlatform {
    /// Resolve a Rust target triple
    pub fn from_triple(triple: &str) -> Result<Self, TargetError> {
        SUPPORTED_TARGETS
            .iter()
            .find(|spec| spec.rust_triple == triple)
            .map(|spec| Self {
                rust_triple: spec.rust_triple.to_string(),
                multiarch: spec.multiarch.to_string(),
                container_platform: spec.container_platform.to_string(),
            })
            .ok_or_else(|| TargetError::UnsupportedTarget {
                target: triple.to_string(),
                supported: supported_triples(),
            })
    }

    /// Rust target triple (e.g. `aarch64-unknown-linux-gnu`)
    pub fn rust_triple(&self) -> &str {
        &self.rust_triple
    }

    /// Debian multiarch tuple (e.g. `aarch64-linux-gnu`)
    pub fn multiarch(&self) -> &str {
        &self.multiarch
    }

    /// Container engine `--platform` value
    pub fn container_platform(&self) -> &str {
        &self.container_platform
    }

    /// Conventional cross-linker binary name
    pub fn linker(&self) -> String {
        format!("{}-gcc", self.multiarch)
    }
}

impl fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rust_triple)
    }
}

/// All triples crossroot can provision
pub fn supported_triples() -> Vec<String> {
    SUPPORTED_TARGETS
        .iter()
        .map(|spec| spec.rust_triple.to_string())
        .collect()
}
