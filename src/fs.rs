//! Atomic filesystem operations for cascade.
//!
//! Every persisted artifact (results, accumulated context, summary) goes
//! through [`atomic_write_file`], so a crash mid-session never leaves a
//! partial or garbled file behind.
//!
//! # Implementation Strategy
//!
//! 1. Write content to a temporary file in the same directory
//! 2. Sync the file to disk (fsync)
//! 3. Atomically replace the original file via `rename()`
//!
//! Source and destination stay in the same directory, so the rename is
//! atomic on POSIX filesystems. On crash, a temporary file named
//! `.{filename}.tmp` may remain.

use crate::error::{CascadeError, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Atomically write bytes to a file, creating parent directories as needed.
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            CascadeError::UserError(format!(
                "failed to create parent directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let temp_path = generate_temp_path(path)?;
    write_and_sync(&temp_path, content)?;
    atomic_replace(&temp_path, path)?;

    Ok(())
}

/// Atomically write a string to a file.
///
/// Convenience wrapper around `atomic_write` for string content.
pub fn atomic_write_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    atomic_write(path, content.as_bytes())
}

/// Generate a temporary file path in the same directory as the target.
fn generate_temp_path(target: &Path) -> Result<PathBuf> {
    let parent = target.parent().unwrap_or(Path::new("."));
    let filename = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CascadeError::UserError("invalid file path".to_string()))?;

    let temp_name = format!(".{}.tmp", filename);
    Ok(parent.join(temp_name))
}

/// Write content to a file and sync to disk.
fn write_and_sync(path: &Path, content: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| {
        CascadeError::UserError(format!(
            "failed to create temporary file '{}': {}",
            path.display(),
            e
        ))
    })?;

    file.write_all(content).map_err(|e| {
        let _ = fs::remove_file(path);
        CascadeError::UserError(format!("failed to write to temporary file: {}", e))
    })?;

    file.sync_all().map_err(|e| {
        let _ = fs::remove_file(path);
        CascadeError::UserError(format!("failed to sync temporary file to disk: {}", e))
    })?;

    Ok(())
}

/// Atomically replace the target file with the source file.
fn atomic_replace(source: &Path, target: &Path) -> Result<()> {
    // rename() replaces the destination atomically when both live in the
    // same directory. Windows refuses to replace an existing file, so the
    // stale target is removed first there.
    #[cfg(windows)]
    if target.exists() {
        let _ = fs::remove_file(target);
    }

    fs::rename(source, target).map_err(|e| {
        let _ = fs::remove_file(source);
        CascadeError::UserError(format!(
            "failed to atomically replace '{}': {}",
            target.display(),
            e
        ))
    })?;

    // Sync the parent directory so the directory entry is persisted too.
    if let Some(parent) = target.parent()
        && let Ok(dir) = File::open(parent)
    {
        let _ = dir.sync_all();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_creates_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.md");

        atomic_write_file(&path, "hello").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");
    }

    #[test]
    fn atomic_write_replaces_existing_content() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.md");

        atomic_write_file(&path, "first").unwrap();
        atomic_write_file(&path, "second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn atomic_write_creates_parent_directories() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/deeper/out.md");

        atomic_write_file(&path, "content").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "content");
    }

    #[test]
    fn no_temp_file_remains_after_write() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.md");

        atomic_write_file(&path, "content").unwrap();

        assert!(!temp.path().join(".out.md.tmp").exists());
    }
}
