//! Filesystem utilities.

use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};

/// Remove a directory and all its contents, if it exists.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .with_context(|| format!("failed to remove directory: {}", path.display()))?;
    }
    Ok(())
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Write a string to a file unless it already holds exactly these bytes.
///
/// Returns whether the file was written. Leaving an unchanged file alone
/// keeps its mtime, so neither toolchain sees a spurious change.
pub fn write_if_changed(path: &Path, contents: &str) -> Result<bool> {
    match fs::read(path) {
        Ok(existing) if existing == contents.as_bytes() => return Ok(false),
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read file: {}", path.display()))
        }
    }

    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents)
        .with_context(|| format!("failed to write file: {}", path.display()))?;
    Ok(true)
}

/// Move a file, overwriting the destination.
///
/// A missing source is not an error: returns `Ok(false)` and touches nothing.
/// Falls back to copy + remove when a rename crosses filesystems.
pub fn move_file(src: &Path, dst: &Path) -> Result<bool> {
    match fs::symlink_metadata(src) {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!("skip mv {} (not produced)", src.display());
            return Ok(false);
        }
        Err(e) => return Err(e).with_context(|| format!("failed to stat {}", src.display())),
    }

    if let Some(parent) = dst.parent() {
        ensure_dir(parent)?;
    }

    if let Err(rename_err) = fs::rename(src, dst) {
        fs::copy(src, dst).with_context(|| {
            format!(
                "failed to move {} to {} (rename: {})",
                src.display(),
                dst.display(),
                rename_err
            )
        })?;
        fs::remove_file(src)
            .with_context(|| format!("failed to remove {}", src.display()))?;
    }

    tracing::debug!("mv {} -> {}", src.display(), dst.display());
    Ok(true)
}
