//! Package set handling
//!
//! An ordered, de-duplicated list of platform package names. Insertion order
//! is install order.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

use crate::error::PackageError;

/// Debian package name, optionally qualified with `:arch`
const PACKAGE_NAME_PATTERN: &str = r"^[a-z0-9][a-z0-9+.\-]*(:[a-z0-9]+)?$";

fn package_name_regex() -> Result<&'static Regex, PackageError> {
    static RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PACKAGE_NAME_PATTERN))
        .as_ref()
        .map_err(|e| PackageError::InvalidPattern {
            error: e.to_string(),
        })
}

/// Immutable ordered set of packages to install
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageSet {
    packages: Vec<String>,
}

impl PackageSet {
    /// Build a package set, validating each name
    ///
    /// Duplicates are dropped, keeping the first occurrence.
    pub fn new<I, S>(names: I) -> Result<Self, PackageError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let pattern = package_name_regex()?;
        let mut packages: Vec<String> = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            if !pattern.is_match(name) {
                return Err(PackageError::InvalidName {
                    name: name.to_string(),
                });
            }
            if !packages.iter().any(|p| p == name) {
                packages.push(name.to_string());
            }
        }

        if packages.is_empty() {
            return Err(PackageError::EmptyPackageSet);
        }

        Ok(Self { packages })
    }

    /// Packages in install order
    pub fn as_slice(&self) -> &[String] {
        &self.packages
    }

    /// Number of packages
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Always false; an empty set cannot be constructed
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Shell command that refreshes the index and installs every package in
    /// one invocation
    pub fn install_command(&self) -> Vec<String> {
        let script = format!(
            "apt-get update && DEBIAN_FRONTEND=noninteractive apt-get install -y --no-install-recommends {}",
            self.packages.join(" ")
        );
        vec!["sh".to_string(), "-c".to_string(), script]
    }
}
