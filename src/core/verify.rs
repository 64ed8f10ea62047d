//! Sysroot verification
//!
//! Checks a sysroot against a fixed checklist of the files a cross link
//! needs. The checklist depends only on the target platform; the report is
//! recomputed from the filesystem on every call.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::core::target::TargetPlatform;
use crate::error::SysrootError;

/// Libraries whose link inputs must be present
const LIBRARIES_OF_INTEREST: &[LibraryFiles] = &[
    LibraryFiles {
        name: "libudev",
        library: "libudev.so",
        pkgconfig: "libudev.pc",
        header: "libudev.h",
    },
    LibraryFiles {
        name: "openssl",
        library: "libssl.so",
        pkgconfig: "openssl.pc",
        header: "openssl/ssl.h",
    },
];

/// C runtime objects needed to link a dynamic executable
const STARTUP_OBJECTS: &[&str] = &["crt1.o", "crti.o", "crtn.o", "Scrt1.o"];

struct LibraryFiles {
    name: &'static str,
    library: &'static str,
    pkgconfig: &'static str,
    header: &'static str,
}

/// Checklist partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Library, header or pkg-config file
    Critical,
    /// C runtime startup object
    Startup,
}

/// One file the sysroot must contain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistEntry {
    /// Logical name (e.g. `libudev library`)
    pub name: String,
    /// Partition
    pub kind: EntryKind,
    /// Path relative to the sysroot root
    pub relative_path: PathBuf,
}

/// Ordered checklist for one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChecklist {
    entries: Vec<ChecklistEntry>,
}

impl FileChecklist {
    /// Checklist for a target platform
    pub fn for_target(platform: &TargetPlatform) -> Self {
        let lib_dir = PathBuf::from("usr/lib").join(platform.multiarch());
        let include_dir = PathBuf::from("usr/include");

        let mut entries = Vec::new();
        for lib in LIBRARIES_OF_INTEREST {
            entries.push(ChecklistEntry {
                name: format!("{} library", lib.name),
                kind: EntryKind::Critical,
                relative_path: lib_dir.join(lib.library),
            });
            entries.push(ChecklistEntry {
                name: format!("{} pkg-config", lib.name),
                kind: EntryKind::Critical,
                relative_path: lib_dir.join("pkgconfig").join(lib.pkgconfig),
            });
            entries.push(ChecklistEntry {
                name: format!("{} header", lib.name),
                kind: EntryKind::Critical,
                relative_path: include_dir.join(lib.header),
            });
        }
        for object in STARTUP_OBJECTS {
            entries.push(ChecklistEntry {
                name: (*object).to_string(),
                kind: EntryKind::Startup,
                relative_path: lib_dir.join(object),
            });
        }

        Self { entries }
    }

    /// Entries in check order
    pub fn entries(&self) -> &[ChecklistEntry] {
        &self.entries
    }
}

/// Found/missing status of one checklist entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryStatus {
    /// The checklist entry
    #[serde(flatten)]
    pub entry: ChecklistEntry,
    /// Absolute path that was checked
    pub checked_path: PathBuf,
    /// Whether the file exists
    pub found: bool,
}

/// Result of verifying a sysroot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    /// Sysroot root that was inspected
    pub sysroot: PathBuf,
    /// Whether the root directory exists at all
    pub sysroot_exists: bool,
    /// One status per checklist entry, in checklist order
    pub entries: Vec<EntryStatus>,
}

impl VerificationReport {
    /// Entries that were not found
    pub fn missing(&self) -> Vec<&EntryStatus> {
        self.entries.iter().filter(|e| !e.found).collect()
    }

    /// Entries that were found
    pub fn found_count(&self) -> usize {
        self.entries.iter().filter(|e| e.found).count()
    }

    /// Whether every entry was found
    pub fn is_complete(&self) -> bool {
        self.sysroot_exists && self.entries.iter().all(|e| e.found)
    }

    /// Convert into an error if the sysroot is absent or incomplete
    pub fn into_result(self) -> Result<Self, SysrootError> {
        if !self.sysroot_exists {
            return Err(SysrootError::MissingSysroot { path: self.sysroot });
        }
        if !self.is_complete() {
            return Err(SysrootError::IncompleteSysroot {
                missing: self
                    .missing()
                    .iter()
                    .map(|e| e.checked_path.display().to_string())
                    .collect(),
            });
        }
        Ok(self)
    }
}

/// Verify a sysroot for a target
///
/// Read-only. A missing sysroot yields a report with every entry missing.
pub fn verify(sysroot: &Path, platform: &TargetPlatform) -> VerificationReport {
    let entries = FileChecklist::for_target(platform)
        .entries
        .into_iter()
        .map(|entry| {
            let checked_path = sysroot.join(&entry.relative_path);
            // Follows symlinks: a dangling link is missing
            let found = checked_path.exists();
            EntryStatus {
                entry,
                checked_path,
                found,
            }
        })
        .collect();

    VerificationReport {
        sysroot: sysroot.to_path_buf(),
        sysroot_exists: sysroot.is_dir(),
        entries,
    }
}
