//! The conversion pipeline: document source → `latex` → `dvipng` → PNG.

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Output;

use latexify_log::LogSummary;
use log::{debug, info, warn};
use serde::Serialize;

use crate::document::{self, JobName};
use crate::error::ConvertError;
use crate::exec::{stderr_tail, CommandRunner, Invocation, StreamPolicy, SystemRunner};
use crate::options::ConvertOptions;
use crate::scratch::Scratch;
use crate::tools::{ToolLocator, Toolchain, DVIPNG, LATEX};
use crate::workdir::WorkdirGuard;

/// Lines of captured stderr quoted in a failure message.
const STDERR_LINES: usize = 5;

/// Progress of a single run.
///
/// A run moves through the states in declaration order. Errors carry the
/// state the run was trying to reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Start,
    ToolsChecked,
    WorkdirSwitched,
    SourceWritten,
    Compiled,
    WorkdirRestored,
    Rasterized,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Start => "starting",
            Self::ToolsChecked => "checking for latex and dvipng",
            Self::WorkdirSwitched => "switching to the temp directory",
            Self::SourceWritten => "writing the document source",
            Self::Compiled => "compiling with latex",
            Self::WorkdirRestored => "restoring the working directory",
            Self::Rasterized => "rasterizing with dvipng",
            Self::Done => "cleaning up",
        })
    }
}

fn reached(stage: Stage) {
    debug!("Reached {:?}", stage);
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionReport {
    /// Absolute path of the PNG.
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub bytes: u64,
    pub dpi: u32,
    pub job: String,
    /// Set when the scratch directory was kept.
    pub kept_scratch: Option<PathBuf>,
    /// Warnings `latex` wrote to its log.
    pub warnings: Vec<String>,
}

/// Renders expressions with a located [`Toolchain`].
#[derive(Debug)]
pub struct Converter {
    tools: Toolchain,
    runner: Box<dyn CommandRunner>,
}

impl Converter {
    pub fn new(tools: Toolchain) -> Self {
        Self {
            tools,
            runner: Box::new(SystemRunner),
        }
    }

    /// Uses `runner` instead of spawning real processes.
    pub fn with_runner(tools: Toolchain, runner: Box<dyn CommandRunner>) -> Self {
        Self { tools, runner }
    }

    /// Locates both tools on `PATH`. Fails before any side effect if either
    /// is missing.
    pub fn detect() -> Result<Self, ConvertError> {
        ToolLocator::new().locate().map(Self::new)
    }

    pub fn tools(&self) -> &Toolchain {
        &self.tools
    }

    /// Runs one conversion.
    ///
    /// The process working directory is switched into the scratch directory
    /// while the source is written and compiled, and is back where it started
    /// when this returns, whatever the outcome.
    pub fn convert(&self, options: &ConvertOptions) -> Result<ConversionReport, ConvertError> {
        options.validate()?;
        reached(Stage::ToolsChecked);

        let start = env::current_dir().map_err(ConvertError::io(Stage::Start, "."))?;
        let temp_root = start.join(&options.temp_dir);
        let output = start.join(&options.output);

        let scratch = Scratch::create(&temp_root, JobName::random(), options.keep_temp)
            .map_err(ConvertError::io(Stage::WorkdirSwitched, &temp_root))?;
        let job = scratch.job().to_string();

        let outcome = self.run_stages(&scratch, &start, &output, options);
        let kept_scratch = match scratch.finish() {
            Ok(kept) => kept,
            Err(e) => {
                warn!("Failed to remove temporary files: {}", e);
                None
            }
        };
        let (summary, width, height, bytes) = match outcome {
            Ok(done) => done,
            Err(err) => {
                debug!("Run failed at {:?}", err.stage());
                return Err(match kept_scratch {
                    Some(kept) => err.kept_in(kept),
                    None => err,
                });
            }
        };
        reached(Stage::Done);
        info!(
            "Wrote {:?} ({}x{} px, {} bytes)",
            output, width, height, bytes
        );

        Ok(ConversionReport {
            output,
            width,
            height,
            bytes,
            dpi: options.dpi,
            job,
            kept_scratch,
            warnings: summary.warnings,
        })
    }

    /// Everything between creating the scratch directory and disposing of it.
    fn run_stages(
        &self,
        scratch: &Scratch,
        start: &Path,
        output: &Path,
        options: &ConvertOptions,
    ) -> Result<(LogSummary, u32, u32, u64), ConvertError> {
        let guard = WorkdirGuard::enter(scratch.path())
            .map_err(ConvertError::io(Stage::WorkdirSwitched, scratch.path()))?;
        reached(Stage::WorkdirSwitched);

        let compiled = self
            .write_source(scratch, &options.expression)
            .and_then(|()| self.compile(scratch, options));
        let restored = guard
            .restore()
            .map_err(ConvertError::io(Stage::WorkdirRestored, start));
        let summary = compiled?;
        restored?;
        reached(Stage::WorkdirRestored);

        let (width, height, bytes) = self.rasterize(scratch, output, options)?;
        Ok((summary, width, height, bytes))
    }

    fn write_source(&self, scratch: &Scratch, expression: &str) -> Result<(), ConvertError> {
        // Relative to the scratch directory, which is the working directory here.
        fs::write(scratch.job().tex_file(), document::render(expression))
            .map_err(ConvertError::io(Stage::SourceWritten, scratch.tex_path()))?;
        reached(Stage::SourceWritten);
        Ok(())
    }

    fn compile(&self, scratch: &Scratch, options: &ConvertOptions) -> Result<LogSummary, ConvertError> {
        let job = scratch.job();
        let mut invocation = Invocation::new(
            LATEX,
            &self.tools.latex,
            StreamPolicy::from_verbose(options.verbose),
        )
        .arg("-src")
        .arg("-interaction=nonstopmode");
        for flag in options.policy.latex_flags() {
            invocation = invocation.arg(*flag);
        }
        let invocation = invocation.arg(job.tex_file());

        let result = self
            .runner
            .run(&invocation)
            .map_err(|e| ConvertError::CompileFailed {
                stage: Stage::Compiled,
                status: None,
                reason: format!("could not start {:?}: {}", self.tools.latex, e),
            })?;

        let summary = match fs::read(job.log_file()) {
            Ok(log) => LogSummary::from_log_bytes(&log),
            Err(e) => {
                debug!("No readable log for {}: {}", job, e);
                LogSummary::default()
            }
        };
        for warning in &summary.warnings {
            info!("latex: {}", warning);
        }

        let has_dvi = Path::new(&job.dvi_file()).is_file();
        if result.status.success() && has_dvi {
            reached(Stage::Compiled);
            return Ok(summary);
        }

        Err(ConvertError::CompileFailed {
            stage: Stage::Compiled,
            status: result.status.code(),
            reason: compile_failure_reason(&summary, &result, has_dvi),
        })
    }

    fn rasterize(
        &self,
        scratch: &Scratch,
        output: &Path,
        options: &ConvertOptions,
    ) -> Result<(u32, u32, u64), ConvertError> {
        let invocation = Invocation::new(
            DVIPNG,
            &self.tools.dvipng,
            StreamPolicy::from_verbose(options.verbose),
        )
        .arg("--width*")
        .arg("--height*")
        .arg("-T")
        .arg("tight")
        .arg("-D")
        .arg(options.dpi.to_string())
        .arg(scratch.dvi_path())
        .arg("-o")
        .arg(output);

        let failed = |status: Option<i32>, reason: String| ConvertError::RasterizeFailed {
            stage: Stage::Rasterized,
            status,
            reason,
        };

        let result = self
            .runner
            .run(&invocation)
            .map_err(|e| failed(None, format!("could not start {:?}: {}", self.tools.dvipng, e)))?;
        let status = result.status.code();

        if !result.status.success() {
            let reason = stderr_tail(&result, STDERR_LINES)
                .unwrap_or_else(|| "dvipng reported no diagnostic".to_string());
            return Err(failed(status, reason));
        }
        if !output.is_file() {
            return Err(failed(status, format!("no image was written to {:?}", output)));
        }

        let (width, height) = image::image_dimensions(output)
            .map_err(|e| failed(status, format!("{:?} is not a readable PNG: {}", output, e)))?;
        let bytes = fs::metadata(output)
            .map_err(ConvertError::io(Stage::Rasterized, output))?
            .len();
        reached(Stage::Rasterized);

        Ok((width, height, bytes))
    }
}

fn compile_failure_reason(summary: &LogSummary, result: &Output, has_dvi: bool) -> String {
    if let Some(error) = &summary.first_error {
        return error.to_string();
    }
    if summary.no_output {
        return "latex produced no pages of output".to_string();
    }
    let stderr = stderr_tail(result, STDERR_LINES);
    match (has_dvi, stderr) {
        (false, Some(stderr)) => format!("no DVI file was produced: {stderr}"),
        (false, None) => "no DVI file was produced".to_string(),
        (true, Some(stderr)) => stderr,
        (true, None) => "latex reported no diagnostic".to_string(),
    }
}
