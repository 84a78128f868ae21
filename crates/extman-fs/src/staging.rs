//! Asset staging around install and uninstall.
//!
//! Extensions ship `public/` and `config/` directories that the host serves
//! or edits. Staging copies them into the host layout on install and removes
//! them on uninstall. A missing source is not an error: most extensions ship
//! neither directory.

use std::fs;
use std::path::Path;

use crate::{Error, NormalizedPath, Result};

/// Result of a staging step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// Files were copied or removed.
    Applied,
    /// Nothing to do.
    Skipped,
}

/// Recursively copy `src` into `dst`, creating `dst` as needed.
///
/// Existing files in `dst` are overwritten.
pub fn copy_directory(src: &NormalizedPath, dst: &NormalizedPath) -> Result<StageOutcome> {
    if !src.is_dir() {
        tracing::debug!(src = %src, "nothing to stage");
        return Ok(StageOutcome::Skipped);
    }
    copy_tree(&src.to_native(), &dst.to_native())?;
    tracing::debug!(src = %src, dst = %dst, "staged directory");
    Ok(StageOutcome::Applied)
}

/// Remove `path` and everything below it.
pub fn remove_directory(path: &NormalizedPath) -> Result<StageOutcome> {
    let native = path.to_native();
    match fs::remove_dir_all(&native) {
        Ok(()) => {
            tracing::debug!(path = %path, "removed staged directory");
            Ok(StageOutcome::Applied)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StageOutcome::Skipped),
        Err(e) => Err(Error::io(native, e)),
    }
}

fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst).map_err(|e| Error::io(dst, e))?;
    for entry in fs::read_dir(src).map_err(|e| Error::io(src, e))? {
        let entry = entry.map_err(|e| Error::io(src, e))?;
        let from = entry.path();
        let to = dst.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| Error::io(&from, e))?;
        if file_type.is_dir() {
            copy_tree(&from, &to)?;
        } else {
            fs::copy(&from, &to).map_err(|e| Error::io(&from, e))?;
        }
    }
    Ok(())
}
