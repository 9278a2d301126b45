use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::converter::Stage;

/// Everything that can end a conversion early.
///
/// Each variant maps to its own process exit code through
/// [`ConvertError::exit_code`], so scripts can tell a missing toolchain apart
/// from a formula TeX refused to compile.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// One or more external tools are not on the search path.
    #[error(
        "the {} required and could not be found in your environment",
        describe_missing(.0)
    )]
    MissingTools(Vec<String>),

    /// The options describe a run that cannot succeed (e.g. a zero DPI).
    #[error("invalid option: {0}")]
    InvalidOption(String),

    /// The expression was rejected before any file was written.
    #[error("expression rejected: {0}")]
    InvalidExpression(String),

    /// `latex` exited unsuccessfully or left no `.dvi` behind.
    #[error("{stage} failed ({}): {reason}", describe_status(.status))]
    CompileFailed {
        stage: Stage,
        status: Option<i32>,
        reason: String,
    },

    /// `dvipng` exited unsuccessfully or its output is not a PNG.
    #[error("{stage} failed ({}): {reason}", describe_status(.status))]
    RasterizeFailed {
        stage: Stage,
        status: Option<i32>,
        reason: String,
    },

    /// A filesystem operation the converter performs itself failed.
    #[error("{stage} failed on `{}`: {source}", .path.display())]
    Io {
        stage: Stage,
        path: PathBuf,
        source: io::Error,
    },

    /// Any of the above, from a run whose scratch directory was kept.
    #[error("{source} (intermediate files kept in `{}`)", .scratch.display())]
    Kept {
        source: Box<ConvertError>,
        scratch: PathBuf,
    },
}

impl ConvertError {
    pub(crate) fn io(stage: Stage, path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io {
            stage,
            path,
            source,
        }
    }

    pub(crate) fn kept_in(self, scratch: PathBuf) -> Self {
        Self::Kept {
            source: Box::new(self),
            scratch,
        }
    }

    /// Directory holding the intermediate files of the failed run, when
    /// `keep_temp` was set.
    pub fn kept_scratch(&self) -> Option<&Path> {
        match self {
            Self::Kept { scratch, .. } => Some(scratch),
            _ => None,
        }
    }

    /// Process exit code for this failure class. `2` is left to usage errors.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Kept { source, .. } => source.exit_code(),
            Self::InvalidOption(_) => 2,
            Self::MissingTools(_) => 3,
            Self::CompileFailed { .. } => 4,
            Self::RasterizeFailed { .. } => 5,
            Self::Io { .. } => 6,
            Self::InvalidExpression(_) => 7,
        }
    }

    /// The stage the run was trying to reach when it failed, if it got that far.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::CompileFailed { stage, .. }
            | Self::RasterizeFailed { stage, .. }
            | Self::Io { stage, .. } => Some(*stage),
            Self::MissingTools(_) => Some(Stage::ToolsChecked),
            Self::InvalidOption(_) | Self::InvalidExpression(_) => None,
            Self::Kept { source, .. } => source.stage(),
        }
    }
}

fn describe_missing(tools: &[String]) -> String {
    let quoted: Vec<String> = tools.iter().map(|t| format!("`{t}`")).collect();
    match quoted.as_slice() {
        [one] => format!("command {one} is"),
        _ => format!("commands {} are", quoted.join(" and ")),
    }
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit status {code}"),
        None => "no exit status".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tools_message() {
        let err = ConvertError::MissingTools(vec!["latex".into(), "dvipng".into()]);
        assert_eq!(
            err.to_string(),
            "the commands `latex` and `dvipng` are required and could not be found in your environment"
        );

        let err = ConvertError::MissingTools(vec!["dvipng".into()]);
        assert!(err.to_string().starts_with("the command `dvipng` is required"));
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        let errors = [
            ConvertError::InvalidOption(String::new()),
            ConvertError::MissingTools(vec![]),
            ConvertError::CompileFailed {
                stage: Stage::Compiled,
                status: Some(1),
                reason: String::new(),
            },
            ConvertError::RasterizeFailed {
                stage: Stage::Rasterized,
                status: None,
                reason: String::new(),
            },
            ConvertError::io(Stage::SourceWritten, "x.tex")(io::ErrorKind::PermissionDenied.into()),
            ConvertError::InvalidExpression(String::new()),
        ];
        let codes: Vec<u8> = errors.iter().map(ConvertError::exit_code).collect();
        assert_eq!(codes, vec![2, 3, 4, 5, 6, 7]);
        assert!(codes.iter().all(|&code| code != 0 && code != 1));
    }

    #[test]
    fn test_stage_of_each_failure() {
        let io = ConvertError::io(Stage::SourceWritten, "x.tex")(io::ErrorKind::NotFound.into());
        assert_eq!(io.stage(), Some(Stage::SourceWritten));
        assert_eq!(
            ConvertError::MissingTools(vec!["latex".into()]).stage(),
            Some(Stage::ToolsChecked)
        );
        assert_eq!(ConvertError::InvalidExpression("$".into()).stage(), None);
        assert_eq!(ConvertError::InvalidOption("dpi".into()).stage(), None);
    }

    #[test]
    fn test_kept_scratch_wraps_without_changing_class() {
        let err = ConvertError::RasterizeFailed {
            stage: Stage::Rasterized,
            status: Some(1),
            reason: "bad dvi".into(),
        }
        .kept_in(PathBuf::from("/tmp/latexify-abc"));

        assert_eq!(err.exit_code(), 5);
        assert_eq!(err.stage(), Some(Stage::Rasterized));
        assert_eq!(err.kept_scratch(), Some(Path::new("/tmp/latexify-abc")));
        assert!(err.to_string().ends_with("(intermediate files kept in `/tmp/latexify-abc`)"));
    }

    #[test]
    fn test_compile_failure_names_stage_and_status() {
        let err = ConvertError::CompileFailed {
            stage: Stage::Compiled,
            status: Some(1),
            reason: "Undefined control sequence.".into(),
        };
        assert_eq!(
            err.to_string(),
            "compiling with latex failed (exit status 1): Undefined control sequence."
        );
    }
}
