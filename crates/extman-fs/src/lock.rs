//! Advisory install lock.
//!
//! Install, uninstall, enable, disable and move are read-modify-write
//! sequences over the registry document. The lock serializes them across
//! processes: it is an exclusive `fs2` lock on a sibling `.lock` file and is
//! released when the guard is dropped.

use std::fs::{File, OpenOptions};

use fs2::FileExt;

use crate::{Error, NormalizedPath, Result};

/// Guard holding the exclusive install lock.
#[derive(Debug)]
pub struct InstallLock {
    file: File,
    path: NormalizedPath,
}

impl InstallLock {
    /// Block until the lock at `path` is acquired.
    pub fn acquire(path: &NormalizedPath) -> Result<Self> {
        let file = Self::open(path)?;
        file.lock_exclusive().map_err(|_| Error::LockFailed {
            path: path.to_native(),
        })?;
        tracing::debug!(lock = %path, "install lock acquired");
        Ok(Self {
            file,
            path: path.clone(),
        })
    }

    /// Acquire the lock without blocking; `None` if another holder has it.
    pub fn try_acquire(path: &NormalizedPath) -> Result<Option<Self>> {
        let file = Self::open(path)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self {
                file,
                path: path.clone(),
            })),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => Ok(None),
            Err(_) => Err(Error::LockFailed {
                path: path.to_native(),
            }),
        }
    }

    /// Path of the lock file.
    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }

    fn open(path: &NormalizedPath) -> Result<File> {
        let native = path.to_native();
        if let Some(parent) = native.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
            }
        }
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&native)
            .map_err(|e| Error::io(&native, e))
    }
}

impl Drop for InstallLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
