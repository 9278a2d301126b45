use std::env;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};

/// Scoped change of the process working directory.
///
/// The directory that was current when the guard was created is restored by
/// [`restore`](Self::restore), or on drop if the guard goes out of scope
/// first (early return, `?`, panic).
#[derive(Debug)]
pub struct WorkdirGuard {
    original: PathBuf,
    restored: bool,
}

impl WorkdirGuard {
    /// Switches into `dir`, remembering the current directory.
    pub fn enter(dir: &Path) -> io::Result<Self> {
        let original = env::current_dir()?;
        env::set_current_dir(dir)?;
        debug!("Entered {:?} (was {:?})", dir, original);
        Ok(Self {
            original,
            restored: false,
        })
    }

    /// The directory that will be restored.
    pub fn original(&self) -> &Path {
        &self.original
    }

    /// Restores the original directory, reporting failure to the caller.
    pub fn restore(mut self) -> io::Result<()> {
        self.restored = true;
        env::set_current_dir(&self.original)?;
        debug!("Restored {:?}", self.original);
        Ok(())
    }
}

impl Drop for WorkdirGuard {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        if let Err(e) = env::set_current_dir(&self.original) {
            warn!("Failed to restore working directory {:?}: {}", self.original, e);
        }
    }
}

/// Serializes tests that change the process working directory.
#[cfg(test)]
pub(crate) static CWD_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
