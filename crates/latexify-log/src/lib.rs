//! # latexify log reader
//!
//! Turns the `.log` file that `latex` leaves next to its `.dvi` into typed
//! [`LogEvent`](ir::LogEvent)s, and condenses those into a [`LogSummary`] that
//! the converter uses to explain a failed compilation.
//!
//! ## Recognized messages
//!
//! - `! <message>` errors, followed by TeX's `l.<n> <excerpt>` pointer
//! - `LaTeX Warning:`, `Package <name> Warning:`, overfull/underfull boxes and
//!   missing characters
//! - `Output written on <file> (<n> page, <m> bytes).`
//! - `No pages of output.`
//!
//! Lines TeX wrapped at [`parser::MAX_PRINT_LINE`] bytes are re-joined
//! before classification.
//!
//! ## Example
//!
//! ```
//! use latexify_log::LogSummary;
//!
//! let log = "! Undefined control sequence.\nl.3 $\\foo\n";
//! let summary = LogSummary::from_log(log);
//! let error = summary.first_error.unwrap();
//! assert_eq!(error.message, "Undefined control sequence.");
//! assert_eq!(error.line, Some(3));
//! ```

/// Typed log events.
pub mod ir;
/// Line-oriented log parser.
pub mod parser;


use std::fmt;

use serde::Serialize;

use crate::ir::{EventPayload, LogEvent};
pub use parser::LogParser;

/// The first TeX error of a run together with the input line it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TexError {
    pub message: String,
    pub line: Option<u32>,
    pub excerpt: Option<String>,
}

impl fmt::Display for TexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(line) = self.line {
            write!(f, " (line {line}")?;
            if let Some(excerpt) = &self.excerpt {
                write!(f, ": {excerpt}")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// What a single compilation said about itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogSummary {
    pub first_error: Option<TexError>,
    pub error_count: usize,
    pub warnings: Vec<String>,
    /// File named in the `Output written on` line.
    pub output: Option<String>,
    pub pages: Option<u32>,
    /// TeX reported `No pages of output.`
    pub no_output: bool,
}

impl LogSummary {
    /// Parses `log` and summarizes it.
    pub fn from_log(log: &str) -> Self {
        Self::from_events(&LogParser::new().parse(log))
    }

    /// Summarizes a log read straight from disk, whatever its encoding.
    pub fn from_log_bytes(log: &[u8]) -> Self {
        Self::from_events(&LogParser::new().parse_bytes(log))
    }

    pub fn from_events(events: &[LogEvent]) -> Self {
        let mut summary = Self::default();
        let mut awaiting_line_ref = false;

        for event in events {
            match &event.payload {
                EventPayload::ErrorStart { message } => {
                    summary.error_count += 1;
                    awaiting_line_ref = summary.first_error.is_none();
                    if awaiting_line_ref {
                        summary.first_error = Some(TexError {
                            message: message.clone(),
                            line: None,
                            excerpt: None,
                        });
                    }
                }
                EventPayload::ErrorLineRef {
                    line,
                    source_excerpt,
                } => {
                    if awaiting_line_ref {
                        if let Some(error) = summary.first_error.as_mut() {
                            error.line = Some(*line);
                            error.excerpt = source_excerpt.clone();
                        }
                        awaiting_line_ref = false;
                    }
                }
                EventPayload::Warning { message } => summary.warnings.push(message.clone()),
                EventPayload::OutputArtifact { path, pages } => {
                    summary.output = Some(path.clone());
                    summary.pages = *pages;
                }
                EventPayload::NoOutput => summary.no_output = true,
            }
        }

        summary
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }
}
