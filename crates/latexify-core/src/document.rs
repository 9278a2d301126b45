//! The `.tex` source wrapped around an expression, and the job name its
//! files are stored under.

use std::fmt;

use rand::Rng;

use crate::error::ConvertError;

/// Prefix shared by every generated job name.
pub const JOB_PREFIX: &str = "latexify_";
/// Number of random lowercase letters after [`JOB_PREFIX`].
pub const JOB_ID_LEN: usize = 16;

/// Base name (without extension) of the `.tex`/`.dvi`/`.log` files of one run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobName(String);

impl JobName {
    /// A fresh name drawn from the thread-local generator.
    pub fn random() -> Self {
        Self::from_rng(&mut rand::thread_rng())
    }

    pub fn from_rng<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let id: String = (0..JOB_ID_LEN)
            .map(|_| rng.gen_range(b'a'..=b'z') as char)
            .collect();
        Self(format!("{JOB_PREFIX}{id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn tex_file(&self) -> String {
        format!("{}.tex", self.0)
    }

    pub fn dvi_file(&self) -> String {
        format!("{}.dvi", self.0)
    }

    pub fn log_file(&self) -> String {
        format!("{}.log", self.0)
    }
}

impl fmt::Display for JobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builds the document `latex` compiles.
///
/// The `minimal` class has no page numbers, so the tight bounding box
/// `dvipng` computes contains the formula and nothing else. The expression is
/// inserted as-is; see [`ExpressionPolicy`] for what that allows.
pub fn render(expression: &str) -> String {
    format!("\\documentclass{{minimal}}\n\\begin{{document}}\n${expression}$\n\\end{{document}}\n")
}

/// Control words refused under [`ExpressionPolicy::Strict`]. They read or
/// write files, redefine macros, build arbitrary control sequences or pass
/// data to the DVI driver. The second group turns tokens into characters or
/// characters back into tokens, which would let a forbidden name be spelled
/// out piecewise (`\string\i nput`).
const FORBIDDEN_COMMANDS: &[&str] = &[
    "input",
    "include",
    "openin",
    "openout",
    "read",
    "write",
    "immediate",
    "def",
    "edef",
    "gdef",
    "xdef",
    "let",
    "catcode",
    "csname",
    "special",
    "usepackage",
    "documentclass",
    "scantokens",
    "string",
    "detokenize",
    "meaning",
    "lowercase",
    "uppercase",
    "expandafter",
    "endinput",
    "everyeof",
    "noexpand",
    "romannumeral",
    "jobname",
];

/// How much of TeX an expression may reach.
///
/// Under [`Verbatim`](Self::Verbatim) the text goes straight into the
/// document, so anything TeX accepts in math mode (and, by closing the `$`,
/// anything it accepts at all) is possible. Run untrusted input with
/// [`Strict`](Self::Strict).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExpressionPolicy {
    #[default]
    Verbatim,
    /// Rejects expressions that could leave math mode, end the document, or
    /// use one of the file/macro primitives.
    Strict,
}

impl ExpressionPolicy {
    pub fn check(self, expression: &str) -> Result<(), ConvertError> {
        if expression.trim().is_empty() {
            return Err(ConvertError::InvalidExpression(
                "the expression is empty".into(),
            ));
        }
        if self == Self::Verbatim {
            return Ok(());
        }

        for (ch, what) in [
            ('$', "`$` would leave math mode"),
            ('%', "`%` would comment out the closing `$`"),
        ] {
            if expression.contains(ch) {
                return Err(ConvertError::InvalidExpression(what.into()));
            }
        }
        if expression.contains("^^") {
            return Err(ConvertError::InvalidExpression(
                "`^^` character escapes are not allowed".into(),
            ));
        }

        let mut rest = expression;
        while let Some(idx) = rest.find('\\') {
            let after = &rest[idx + 1..];
            let name_len = after
                .find(|c: char| !c.is_ascii_alphabetic())
                .unwrap_or(after.len());
            let name = &after[..name_len];

            if FORBIDDEN_COMMANDS.contains(&name) {
                return Err(ConvertError::InvalidExpression(format!(
                    "`\\{name}` is not allowed"
                )));
            }
            if (name == "begin" || name == "end")
                && after[name_len..].trim_start().starts_with("{document}")
            {
                return Err(ConvertError::InvalidExpression(format!(
                    "`\\{name}{{document}}` is not allowed"
                )));
            }

            // A control symbol such as `\\` or `\{` consumes one character.
            let skip = if name_len == 0 {
                after.chars().next().map_or(0, char::len_utf8)
            } else {
                name_len
            };
            rest = &after[skip..];
        }

        Ok(())
    }

    /// Extra `latex` flags this policy asks for.
    pub fn latex_flags(self) -> &'static [&'static str] {
        match self {
            Self::Verbatim => &[],
            Self::Strict => &["-no-shell-escape"],
        }
    }
}
