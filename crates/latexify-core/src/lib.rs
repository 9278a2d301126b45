//! # latexify core
//!
//! Renders a LaTeX math expression to a tightly cropped PNG by driving the
//! external `latex` and `dvipng` programs.
//!
//! ## Pipeline
//!
//! ```text
//! ToolLocator::locate ──► Converter::convert
//!                            │
//!                            ├─ Scratch::create        (per-run temp dir)
//!                            ├─ WorkdirGuard::enter    (cwd → scratch)
//!                            ├─ document::render       (<job>.tex)
//!                            ├─ latex -src -interaction=nonstopmode <job>.tex
//!                            ├─ WorkdirGuard::restore  (cwd → back)
//!                            ├─ dvipng -T tight -D <dpi> <job>.dvi -o <out>.png
//!                            └─ Scratch::finish        (remove or keep)
//! ```
//!
//! Every step checks its outcome. A non-zero exit status, a missing `.dvi`
//! or an output that is not a PNG ends the run with a [`ConvertError`] naming
//! the [`Stage`] that failed. The working directory is restored on every path.
//!
//! ## Modules
//!
//! - [`tools`] - Finding `latex` and `dvipng` on the search path
//! - [`document`] - The wrapper document, job names, and the sanitizing policy
//! - [`exec`] - Launching processes through a mockable [`CommandRunner`]
//! - [`workdir`] - Scoped working-directory changes
//! - [`scratch`] - The per-run directory for intermediate files
//! - [`converter`] - The pipeline itself
//!
//! ## Example
//!
//! ```no_run
//! use latexify_core::{ConvertOptions, Converter};
//!
//! let converter = Converter::detect()?;
//! let options = ConvertOptions::new("x^2+y^2=z^2").with_output("pythagoras");
//! let report = converter.convert(&options)?;
//! println!("{}x{} px written to {:?}", report.width, report.height, report.output);
//! # Ok::<(), latexify_core::ConvertError>(())
//! ```

pub mod converter;
pub mod document;
pub mod error;
pub mod exec;
pub mod options;
pub mod scratch;
pub mod tools;
pub mod workdir;

pub use converter::{ConversionReport, Converter, Stage};
pub use document::{ExpressionPolicy, JobName};
pub use error::ConvertError;
pub use exec::{CommandRunner, Invocation, StreamPolicy, SystemRunner};
pub use options::{normalize_output_name, ConvertOptions, DEFAULT_DPI, DEFAULT_OUTPUT};
pub use tools::{ToolLocator, Toolchain};
