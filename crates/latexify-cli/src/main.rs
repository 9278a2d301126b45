use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use latexify_core::{
    ConvertError, ConvertOptions, Converter, ExpressionPolicy, ToolLocator, DEFAULT_DPI,
    DEFAULT_OUTPUT,
};
use log::info;

#[derive(Parser, Debug)]
#[command(name = "latexify", version)]
#[command(about = "LaTeX to PNG utility", long_about = None)]
struct Cli {
    /// Math expression to typeset in latex
    #[arg(value_name = "EXPRESSION")]
    expression: String,

    /// Show output from latex and dvipng commands
    #[arg(short, long)]
    verbose: bool,

    /// Output file name (will be a PNG file)
    #[arg(short = 'o', long = "outputFn", value_name = "FILE", default_value = DEFAULT_OUTPUT)]
    output_fn: String,

    /// DPI of output PNG
    #[arg(short, long, default_value_t = DEFAULT_DPI, value_parser = clap::value_parser!(u32).range(1..))]
    dpi: u32,

    /// Directory where latex's intermediate files will be written to
    #[arg(
        long = "tempDir",
        value_name = "DIR",
        env = "LATEXIFY_TEMP_DIR",
        default_value_os_t = std::env::temp_dir()
    )]
    temp_dir: PathBuf,

    /// Keep the intermediate .tex, .dvi and .log files
    #[arg(long)]
    keep_temp: bool,

    /// Reject expressions that could escape math mode or reach TeX file primitives
    #[arg(long)]
    strict: bool,

    /// Print a JSON report of the conversion on stdout
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn options(&self) -> ConvertOptions {
        let policy = if self.strict {
            ExpressionPolicy::Strict
        } else {
            ExpressionPolicy::Verbatim
        };
        ConvertOptions::new(self.expression.as_str())
            .with_output(&self.output_fn)
            .with_dpi(self.dpi)
            .with_temp_dir(&self.temp_dir)
            .with_verbose(self.verbose)
            .with_keep_temp(self.keep_temp)
            .with_policy(policy)
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    // Nothing is written or spawned until both tools are known to exist.
    let tools = ToolLocator::new().locate()?;
    let converter = Converter::new(tools);
    let report = converter.convert(&cli.options())?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if let Some(dir) = &report.kept_scratch {
        eprintln!("Intermediate files kept in {}", dir.display());
    }
    info!(
        "{} ({}x{} px at {} dpi)",
        report.output.display(),
        report.width,
        report.height,
        report.dpi
    );
    Ok(())
}

fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<ConvertError>()
        .map_or(1, ConvertError::exit_code)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error! {err}");
            ExitCode::from(exit_code(&err))
        }
    }
}
