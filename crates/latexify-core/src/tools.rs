//! Locating the external `latex` and `dvipng` binaries.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::ConvertError;

/// The TeX-to-DVI compiler.
pub const LATEX: &str = "latex";
/// The DVI-to-PNG rasterizer.
pub const DVIPNG: &str = "dvipng";

/// Resolved locations of both tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub latex: PathBuf,
    pub dvipng: PathBuf,
}

impl Toolchain {
    pub fn new(latex: impl Into<PathBuf>, dvipng: impl Into<PathBuf>) -> Self {
        Self {
            latex: latex.into(),
            dvipng: dvipng.into(),
        }
    }
}

/// Looks tools up on a search path without touching the filesystem beyond
/// `stat` calls.
///
/// A name containing a path separator is taken as a direct path and only has
/// to be an executable file; otherwise every directory of the search path is
/// tried in order.
#[derive(Debug, Clone)]
pub struct ToolLocator {
    search_path: Option<OsString>,
    latex: String,
    dvipng: String,
}

impl Default for ToolLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolLocator {
    /// A locator using the process `PATH` and the standard tool names.
    pub fn new() -> Self {
        Self {
            search_path: None,
            latex: LATEX.to_string(),
            dvipng: DVIPNG.to_string(),
        }
    }

    /// Searches `paths` (in `PATH` syntax) instead of the process environment.
    pub fn with_search_path(mut self, paths: impl Into<OsString>) -> Self {
        self.search_path = Some(paths.into());
        self
    }

    /// Overrides the names (or paths) of the two tools.
    pub fn with_tools(mut self, latex: &str, dvipng: &str) -> Self {
        self.latex = latex.to_string();
        self.dvipng = dvipng.to_string();
        self
    }

    /// Resolves a single executable.
    pub fn find(&self, name: &str) -> Option<PathBuf> {
        let found = match &self.search_path {
            Some(paths) => {
                let cwd = env::current_dir().unwrap_or_else(|_| Path::new(".").to_path_buf());
                which::which_in(name, Some(paths), cwd)
            }
            None => which::which(name),
        };
        match found {
            Ok(path) => {
                debug!("Resolved `{}` to {:?}", name, path);
                Some(path)
            }
            Err(e) => {
                debug!("`{}` not found: {}", name, e);
                None
            }
        }
    }

    /// Resolves both tools, reporting every one that is missing.
    pub fn locate(&self) -> Result<Toolchain, ConvertError> {
        let latex = self.find(&self.latex);
        let dvipng = self.find(&self.dvipng);

        match (latex, dvipng) {
            (Some(latex), Some(dvipng)) => {
                info!("Using {:?} and {:?}", latex, dvipng);
                Ok(Toolchain { latex, dvipng })
            }
            (latex, dvipng) => {
                let mut missing = Vec::new();
                if latex.is_none() {
                    missing.push(self.latex.clone());
                }
                if dvipng.is_none() {
                    missing.push(self.dvipng.clone());
                }
                Err(ConvertError::MissingTools(missing))
            }
        }
    }
}
