//! Running the external tools.
//!
//! All process launches go through the [`CommandRunner`] trait so the
//! conversion pipeline can be exercised without a TeX installation.

use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use log::debug;

/// What happens to a tool's standard streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPolicy {
    /// The tool writes straight to the caller's terminal.
    Inherit,
    /// stdout is discarded and stderr captured for error reporting.
    Quiet,
}

impl StreamPolicy {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Self::Inherit
        } else {
            Self::Quiet
        }
    }
}

/// A single external command.
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
    /// Short name used in banners and log lines (`latex`, `dvipng`).
    pub label: &'static str,
    pub program: &'a Path,
    pub args: Vec<OsString>,
    pub streams: StreamPolicy,
}

impl<'a> Invocation<'a> {
    pub fn new(label: &'static str, program: &'a Path, streams: StreamPolicy) -> Self {
        Self {
            label,
            program,
            args: Vec::new(),
            streams,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }
}

/// Trait for launching a command and waiting for it to exit.
pub trait CommandRunner: Send + Sync + fmt::Debug {
    /// Runs `invocation` in the current working directory and blocks until it
    /// exits. An `Err` means the process could not be started at all.
    fn run(&self, invocation: &Invocation<'_>) -> io::Result<Output>;
}

/// [`CommandRunner`] backed by `std::process::Command`.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation<'_>) -> io::Result<Output> {
        let mut cmd = Command::new(invocation.program);
        cmd.args(&invocation.args).stdin(Stdio::null());

        match invocation.streams {
            StreamPolicy::Inherit => {
                // stdout belongs to the caller (e.g. a JSON report), so both
                // of the tool's streams go to our stderr.
                eprint!("{}", banner(invocation.label));
                cmd.stdout(io::stderr()).stderr(Stdio::inherit());
            }
            StreamPolicy::Quiet => {
                cmd.stdout(Stdio::null()).stderr(Stdio::piped());
            }
        }

        debug!("Running {:?}", cmd);
        let output = cmd.output()?;

        if invocation.streams == StreamPolicy::Inherit {
            eprintln!();
        }
        Ok(output)
    }
}

/// Heading printed before a tool's streamed output.
fn banner(label: &str) -> String {
    format!("{} output\n{}\n\n", label, "-".repeat(40))
}

/// The last few non-empty lines of captured stderr, for error messages.
pub fn stderr_tail(output: &Output, max_lines: usize) -> Option<String> {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.is_empty() {
        return None;
    }
    let start = lines.len().saturating_sub(max_lines);
    Some(lines[start..].join("\n"))
}
