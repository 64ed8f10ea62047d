//! Core business logic module
//!
//! # Submodules
//!
//! - [`target`] - Target triple resolution
//! - [`packages`] - Ordered package sets
//! - [`sysroot`] - Sysroot tree builder
//! - [`verify`] - Sysroot verification against a fixed checklist
//! - [`preflight`] - Host toolchain checks
//! - [`build_env`] - Cross-build environment derivation
//! - [`cargo_config`] - Build configuration artifact

pub mod build_env;
pub mod cargo_config;
pub mod packages;
pub mod preflight;
pub mod sysroot;
pub mod target;
pub mod verify;
