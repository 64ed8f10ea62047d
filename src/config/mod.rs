//! Configuration and constants
//!
//! - [`defaults`] - Built-in default values
//! - [`urls`] - Remediation and documentation URLs
//! - [`project`] - Optional `crossroot.toml` project file

pub mod defaults;
pub mod project;
pub mod urls;
