use crate::ir::{EventPayload, LogEvent, Span};

/// TeX hard-wraps log lines at this many bytes (`max_print_line`).
pub const MAX_PRINT_LINE: usize = 79;

/// A line-oriented reader for the log TeX writes next to the `.dvi`.
///
/// Only the handful of messages a single-formula document can produce are
/// recognized: errors with their `l.<n>` references, warnings, and the final
/// output line. Everything else is skipped.
#[derive(Debug, Default)]
pub struct LogParser {
    events: Vec<LogEvent>,
}

impl LogParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a complete log and returns its events in order of appearance.
    pub fn parse(self, input: &str) -> Vec<LogEvent> {
        self.parse_bytes(input.as_bytes())
    }

    /// Parses a log as read from disk.
    ///
    /// TeX writes bytes, not text: 8-bit output and wraps that cut a UTF-8
    /// sequence in half are both common. Lines are re-joined on raw bytes and
    /// only then decoded, replacing whatever is still invalid.
    pub fn parse_bytes(mut self, input: &[u8]) -> Vec<LogEvent> {
        for (span, text) in logical_lines(input) {
            self.classify(span, &text);
        }
        self.events
    }

    fn classify(&mut self, span: Span, text: &str) {
        let payload = if let Some(message) = text.strip_prefix('!') {
            EventPayload::ErrorStart {
                message: message.trim().to_string(),
            }
        } else if let Some(payload) = parse_line_ref(text) {
            payload
        } else if is_warning(text) {
            EventPayload::Warning {
                message: text.trim().to_string(),
            }
        } else if let Some(rest) = text.strip_prefix("Output written on ") {
            parse_output(rest)
        } else if text.starts_with("No pages of output.") {
            EventPayload::NoOutput
        } else {
            return;
        };

        self.events.push(LogEvent { span, payload });
    }
}

/// Joins physical lines that TeX split at [`MAX_PRINT_LINE`] bytes.
fn logical_lines(input: &[u8]) -> Vec<(Span, String)> {
    let mut out = Vec::new();
    let mut current: Option<(usize, Vec<u8>)> = None;
    let mut offset = 0;

    for raw in input.split_inclusive(|&b| b == b'\n') {
        let start = offset;
        offset += raw.len();
        let line = trim_line_end(raw);
        let end = start + line.len();

        let (span_start, mut bytes) = current.take().unwrap_or((start, Vec::new()));
        bytes.extend_from_slice(line);

        if line.len() == MAX_PRINT_LINE {
            current = Some((span_start, bytes));
            continue;
        }

        out.push((Span::new(span_start, end), decode(bytes)));
    }

    if let Some((span_start, bytes)) = current {
        out.push((Span::new(span_start, offset), decode(bytes)));
    }
    out
}

fn trim_line_end(mut line: &[u8]) -> &[u8] {
    while let [rest @ .., b'\n' | b'\r'] = line {
        line = rest;
    }
    line
}

fn decode(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes)
        .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

fn is_warning(text: &str) -> bool {
    ((text.starts_with("LaTeX") || text.starts_with("Package") || text.starts_with("Class"))
        && text.contains("Warning:"))
        || text.starts_with("Overfull \\hbox")
        || text.starts_with("Underfull \\hbox")
        || text.starts_with("Missing character:")
}

fn parse_line_ref(text: &str) -> Option<EventPayload> {
    let number_part = text.strip_prefix("l.")?;
    let digits: String = number_part
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    let line = digits.parse::<u32>().ok()?;
    let excerpt = number_part[digits.len()..].trim();
    Some(EventPayload::ErrorLineRef {
        line,
        source_excerpt: (!excerpt.is_empty()).then(|| excerpt.to_string()),
    })
}

fn parse_output(rest: &str) -> EventPayload {
    // "temp.dvi (1 page, 228 bytes)."
    let (path, details) = match rest.find(" (") {
        Some(idx) => (&rest[..idx], &rest[idx + 2..]),
        None => (rest.trim_end_matches('.'), ""),
    };
    let pages = details
        .split_whitespace()
        .next()
        .and_then(|n| n.parse::<u32>().ok());
    EventPayload::OutputArtifact {
        path: path.to_string(),
        pages,
    }
}
