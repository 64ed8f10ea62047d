//! Crossroot - foreign-platform sysroots for Rust cross builds
//!
//! Provisions a sysroot of another platform's shared libraries and headers
//! from a throwaway container, then derives the Cargo configuration that
//! links a cross build against it.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Sysroot layout, verification, preflight and configuration logic
//! - [`infra`] - Container engine, host toolchain and filesystem access
//! - [`config`] - Defaults and the optional project file
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;
