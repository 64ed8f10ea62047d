//! Filesystem operations
//!
//! Handles file, directory and symlink operations.

use std::io::ErrorKind;
use std::path::Path;

use crate::error::FilesystemError;

/// Create a directory and all parent directories
pub fn create_dir_all(path: &Path) -> Result<(), FilesystemError> {
    std::fs::create_dir_all(path).map_err(|e| FilesystemError::CreateDir {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Remove a directory and all its contents
pub fn remove_dir_all(path: &Path) -> Result<(), FilesystemError> {
    if path.symlink_metadata().is_ok() {
        std::fs::remove_dir_all(path).map_err(|e| FilesystemError::RemoveDir {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
    }
    Ok(())
}

/// Write content to a file
pub fn write_file(path: &Path, content: &str) -> Result<(), FilesystemError> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    std::fs::write(path, content).map_err(|e| FilesystemError::WriteFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Replace a file's content in one step
///
/// The content goes to a sibling `.tmp` file that is then renamed over the
/// destination, so readers see either the old file or the new one.
pub fn write_file_atomic(path: &Path, content: &str) -> Result<(), FilesystemError> {
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    write_file(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        FilesystemError::WriteFile {
            path: path.to_path_buf(),
            error: e.to_string(),
        }
    })
}

/// Outcome of [`create_symlink`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymlinkStatus {
    /// Link was created
    Created,
    /// Something already exists at the link path; nothing was changed
    AlreadyExists,
}

/// Create a symlink at `link` pointing to `target`
///
/// An existing entry at `link`, including a dangling symlink, is left
/// untouched and reported as [`SymlinkStatus::AlreadyExists`].
#[cfg(unix)]
pub fn create_symlink(target: &Path, link: &Path) -> Result<SymlinkStatus, FilesystemError> {
    if link.symlink_metadata().is_ok() {
        return Ok(SymlinkStatus::AlreadyExists);
    }
    if let Some(parent) = link.parent() {
        create_dir_all(parent)?;
    }
    match std::os::unix::fs::symlink(target, link) {
        Ok(()) => Ok(SymlinkStatus::Created),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(SymlinkStatus::AlreadyExists),
        Err(e) => Err(FilesystemError::Symlink {
            link: link.to_path_buf(),
            error: e.to_string(),
        }),
    }
}
