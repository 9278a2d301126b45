use std::env;
use std::path::PathBuf;

use crate::document::ExpressionPolicy;
use crate::error::ConvertError;

/// Output file used when none is given.
pub const DEFAULT_OUTPUT: &str = "temp.png";
/// Rasterization resolution used when none is given.
pub const DEFAULT_DPI: u32 = 120;
/// Suffix every output path ends in.
pub const PNG_SUFFIX: &str = ".png";

/// Appends [`PNG_SUFFIX`] unless `name` already ends with it.
pub fn normalize_output_name(name: &str) -> String {
    if name.ends_with(PNG_SUFFIX) {
        name.to_string()
    } else {
        format!("{name}{PNG_SUFFIX}")
    }
}

/// Parameters of one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    pub expression: String,
    /// Output path, relative paths resolve against the invocation directory.
    pub output: PathBuf,
    pub dpi: u32,
    /// Parent of the per-run scratch directory.
    pub temp_dir: PathBuf,
    /// Stream tool output to the terminal.
    pub verbose: bool,
    /// Keep the scratch directory after the run.
    pub keep_temp: bool,
    pub policy: ExpressionPolicy,
}

impl ConvertOptions {
    /// Options with every default applied.
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            dpi: DEFAULT_DPI,
            temp_dir: env::temp_dir(),
            verbose: false,
            keep_temp: false,
            policy: ExpressionPolicy::default(),
        }
    }

    /// Sets the output path, appending `.png` when missing.
    pub fn with_output(mut self, name: &str) -> Self {
        self.output = PathBuf::from(normalize_output_name(name));
        self
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_keep_temp(mut self, keep: bool) -> Self {
        self.keep_temp = keep;
        self
    }

    pub fn with_policy(mut self, policy: ExpressionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Checks the options without touching the filesystem.
    pub fn validate(&self) -> Result<(), ConvertError> {
        if self.dpi == 0 {
            return Err(ConvertError::InvalidOption(
                "the resolution must be a positive number of dots per inch".into(),
            ));
        }
        self.policy.check(&self.expression)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_appends_suffix() {
        assert_eq!(normalize_output_name("result"), "result.png");
        assert_eq!(normalize_output_name("out/formula"), "out/formula.png");
        assert_eq!(normalize_output_name("result.jpg"), "result.jpg.png");
    }

    #[test]
    fn test_normalize_keeps_existing_suffix() {
        assert_eq!(normalize_output_name("temp.png"), "temp.png");
        assert_eq!(normalize_output_name("a.b.png"), "a.b.png");
    }

    #[test]
    fn test_defaults() {
        let options = ConvertOptions::new("x^2+y^2=z^2");
        assert_eq!(options.output, PathBuf::from("temp.png"));
        assert_eq!(options.dpi, 120);
        assert_eq!(options.temp_dir, env::temp_dir());
        assert!(!options.verbose);
        assert!(!options.keep_temp);
        assert_eq!(options.policy, ExpressionPolicy::Verbatim);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_with_output_normalizes() {
        let options = ConvertOptions::new("x").with_output("result");
        assert_eq!(options.output, PathBuf::from("result.png"));
    }

    #[test]
    fn test_zero_dpi_rejected() {
        let err = ConvertOptions::new("x").with_dpi(0).validate().unwrap_err();
        assert!(matches!(err, ConvertError::InvalidOption(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_validate_applies_policy() {
        let options = ConvertOptions::new(r"\input{x}");
        assert!(options.validate().is_ok());
        assert!(options
            .with_policy(ExpressionPolicy::Strict)
            .validate()
            .is_err());
    }
}
