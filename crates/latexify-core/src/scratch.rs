use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};
use tempfile::TempDir;

use crate::document::JobName;

/// Prefix of the per-run directory created under the temp root.
pub const SCRATCH_PREFIX: &str = "latexify-";

/// The per-run directory holding the `.tex`, `.dvi`, `.log` and `.aux` files.
///
/// The directory is created with a unique name, so concurrent runs never
/// share intermediate files. It is removed when the `Scratch` is finished or
/// dropped, unless it was created with `keep` set.
#[derive(Debug)]
pub struct Scratch {
    dir: Option<TempDir>,
    root: PathBuf,
    job: JobName,
    keep: bool,
}

impl Scratch {
    pub fn create(parent: &Path, job: JobName, keep: bool) -> io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(parent)?;
        let root = dir.path().to_path_buf();
        debug!("Created scratch directory {:?} for {}", root, job);
        Ok(Self {
            dir: Some(dir),
            root,
            job,
            keep,
        })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn job(&self) -> &JobName {
        &self.job
    }

    pub fn tex_path(&self) -> PathBuf {
        self.root.join(self.job.tex_file())
    }

    pub fn dvi_path(&self) -> PathBuf {
        self.root.join(self.job.dvi_file())
    }

    pub fn log_path(&self) -> PathBuf {
        self.root.join(self.job.log_file())
    }

    /// Removes the directory, or hands back its path when it is being kept.
    pub fn finish(mut self) -> io::Result<Option<PathBuf>> {
        match self.dir.take() {
            Some(dir) if self.keep => Ok(Some(dir.keep())),
            Some(dir) => {
                dir.close()?;
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            if self.keep {
                info!("Kept temporary files in {:?}", dir.keep());
            }
            // Otherwise `TempDir` removes the directory as it drops.
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_paths_share_job_name() {
        let parent = tempfile::tempdir().unwrap();
        let scratch = Scratch::create(parent.path(), JobName::random(), false).unwrap();
        let job = scratch.job().clone();

        assert!(scratch.path().starts_with(parent.path()));
        assert_eq!(scratch.tex_path(), scratch.path().join(format!("{job}.tex")));
        assert_eq!(scratch.dvi_path(), scratch.path().join(format!("{job}.dvi")));
        assert_eq!(scratch.log_path(), scratch.path().join(format!("{job}.log")));
    }

    #[test]
    fn test_finish_removes_directory() {
        let parent = tempfile::tempdir().unwrap();
        let scratch = Scratch::create(parent.path(), JobName::random(), false).unwrap();
        let root = scratch.path().to_path_buf();
        fs::write(scratch.tex_path(), "x").unwrap();

        assert_eq!(scratch.finish().unwrap(), None);
        assert!(!root.exists());
    }

    #[test]
    fn test_drop_removes_directory() {
        let parent = tempfile::tempdir().unwrap();
        let root = {
            let scratch = Scratch::create(parent.path(), JobName::random(), false).unwrap();
            fs::write(scratch.dvi_path(), "x").unwrap();
            scratch.path().to_path_buf()
        };
        assert!(!root.exists());
    }

    #[test]
    fn test_keep_retains_directory_on_finish_and_drop() {
        let parent = tempfile::tempdir().unwrap();

        let kept = Scratch::create(parent.path(), JobName::random(), true).unwrap();
        let root = kept.path().to_path_buf();
        assert_eq!(kept.finish().unwrap(), Some(root.clone()));
        assert!(root.is_dir());

        let dropped = Scratch::create(parent.path(), JobName::random(), true).unwrap();
        let root = dropped.path().to_path_buf();
        drop(dropped);
        assert!(root.is_dir());
    }

    #[test]
    fn test_two_runs_never_share_a_directory() {
        let parent = tempfile::tempdir().unwrap();
        let job = JobName::random();
        let a = Scratch::create(parent.path(), job.clone(), false).unwrap();
        let b = Scratch::create(parent.path(), job, false).unwrap();
        assert_ne!(a.tex_path(), b.tex_path());
    }

    #[test]
    fn test_missing_parent_is_an_error() {
        let parent = tempfile::tempdir().unwrap();
        let missing = parent.path().join("nope");
        assert!(Scratch::create(&missing, JobName::random(), false).is_err());
    }
}
