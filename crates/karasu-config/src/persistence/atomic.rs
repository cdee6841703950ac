//! Text file operations for config persistence.
//!
//! Writes go through a sibling temp file:
//! 1. Write the full text to a temp file in the target's directory
//! 2. Sync it to disk
//! 3. Optionally copy the current target to a `.bak` backup
//! 4. Atomically rename the temp file over the target
//!
//! Readers therefore see either the old content or the new content, never a
//! half-written file.

use crate::config::StoreConfig;
use crate::error::{ConfigError, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Read a whole text file.
pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::FileNotFound(path.to_path_buf())
        } else {
            ConfigError::Io {
                message: format!("Failed to read {}", path.display()),
                path: Some(path.to_path_buf()),
                source: Some(e),
            }
        }
    })
}

/// Path of the backup copy kept for `path`.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(StoreConfig::BACKUP_EXTENSION);
    path.with_file_name(name)
}

/// Replace the content of `path` with `text`.
pub fn write_text_atomic(path: &Path, text: &str, keep_backup: bool) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !parent.exists() {
        fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
            message: format!("Failed to create directory {}", parent.display()),
            path: Some(parent.to_path_buf()),
            source: Some(e),
        })?;
    }

    let mut temp = tempfile::Builder::new()
        .prefix(StoreConfig::TEMP_FILE_PREFIX)
        .suffix(StoreConfig::TEMP_FILE_SUFFIX)
        .tempfile_in(parent)
        .map_err(|e| ConfigError::Io {
            message: format!("Failed to create temp file in {}", parent.display()),
            path: Some(parent.to_path_buf()),
            source: Some(e),
        })?;

    temp.write_all(text.as_bytes())
        .and_then(|_| temp.flush())
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| ConfigError::Io {
            message: format!("Failed to write temp file {}", temp.path().display()),
            path: Some(temp.path().to_path_buf()),
            source: Some(e),
        })?;

    if keep_backup && path.exists() {
        let backup = backup_path(path);
        if let Err(e) = fs::copy(path, &backup) {
            warn!("Failed to create backup {}: {}", backup.display(), e);
        } else {
            debug!("Created backup: {}", backup.display());
        }
    }

    temp.persist(path).map_err(|e| ConfigError::Io {
        message: format!("Failed to replace {}", path.display()),
        path: Some(path.to_path_buf()),
        source: Some(e.error),
    })?;

    debug!("Wrote {}", path.display());
    Ok(())
}
