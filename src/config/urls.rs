//! Remediation and documentation URLs

/// rustup installer
pub const RUSTUP_INSTALL: &str = "https://rustup.rs";

/// `cross` containerized cross-build wrapper
pub const CROSS_REPOSITORY: &str = "https://github.com/cross-rs/cross";

/// Prebuilt cross-rs images, suffixed with the target triple
pub const CROSS_IMAGE_REGISTRY: &str = "ghcr.io/cross-rs";
