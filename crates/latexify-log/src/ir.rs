use serde::{Deserialize, Serialize};

/// Byte range of an event inside the log text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub span: Span,
    #[serde(flatten)]
    pub payload: EventPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum EventPayload {
    /// A line starting with `!`.
    ErrorStart { message: String },
    /// The `l.<n> <excerpt>` line TeX prints after an error.
    ErrorLineRef {
        line: u32,
        source_excerpt: Option<String>,
    },
    Warning { message: String },
    /// `Output written on <file> (<n> pages, <m> bytes).`
    OutputArtifact { path: String, pages: Option<u32> },
    /// `No pages of output.`
    NoOutput,
}
