/*
 * syntax.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Syntax-error normalization and rendering.
 */

//! Syntax-error normalization.
//!
//! The syntax checker reports failures in one of three textual dialects:
//!
//! - `Sorry: TabError: <message> (<file>, line <N>)`
//! - `Sorry: IndentationError: <message> (<file>, line <N>)`
//! - the generic traceback form:
//!
//! ```text
//!   File "x.py", line 9
//!     def f(:
//!          ^
//! SyntaxError: invalid syntax
//! ```
//!
//! [`SyntaxNormalizer`] turns any of them into a [`SyntaxDiagnostic`], or fails
//! with [`FaultlineError::MalformedDiagnostic`] when the text cannot be read
//! reliably.

use ariadne::{Color, Config, Label, Report as AriadneReport, ReportKind, Source};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{FaultlineError, Result};
use crate::report::{Block, Report, Span, Tone};

const TAB_PREFIX: &str = "Sorry: TabError:";
const INDENT_PREFIX: &str = "Sorry: IndentationError:";

static MESSAGE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_.]*(?:Error|Warning)):\s*(.*)$")
        .expect("MESSAGE_LINE is a valid static regex pattern")
});

static DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+").expect("DIGITS is a valid static regex pattern"));

/// Diagnostic text dialect, chosen by its prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxDialect {
    Tab,
    Indentation,
    Generic,
}

impl SyntaxDialect {
    pub fn detect(raw: &str) -> Self {
        let raw = raw.trim_start();
        if raw.starts_with(TAB_PREFIX) {
            SyntaxDialect::Tab
        } else if raw.starts_with(INDENT_PREFIX) {
            SyntaxDialect::Indentation
        } else {
            SyntaxDialect::Generic
        }
    }
}

/// Caret span relative to the stripped source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pointer {
    pub start: usize,
    pub width: usize,
}

/// A syntax failure in a form every renderer understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxDiagnostic {
    pub kind: String,
    /// 1-based line in the user's file.
    pub line_number: usize,
    /// The offending line without surrounding whitespace.
    pub source_line: String,
    pub pointer: Pointer,
    pub message: String,
}

/// Outcome of a syntax check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxCheck {
    Intact,
    Broken(SyntaxDiagnostic),
}

impl SyntaxCheck {
    pub fn is_intact(&self) -> bool {
        matches!(self, SyntaxCheck::Intact)
    }
}

/// Parses raw checker output.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntaxNormalizer {
    injected_lines: usize,
}

impl SyntaxNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of lines the checker placed ahead of the user's source.
    ///
    /// Only the generic dialect reports positions in the checked file; the
    /// `Sorry:` dialects already refer to the user's file.
    pub fn with_injected_lines(injected_lines: usize) -> Self {
        Self { injected_lines }
    }

    /// Normalize `raw` checker output. Blank output means the file is intact.
    ///
    /// `source` is the user's file, needed to recover the offending line for
    /// the `Sorry:` dialects.
    pub fn normalize(&self, raw: &str, source: &str) -> Result<SyntaxCheck> {
        if raw.trim().is_empty() {
            return Ok(SyntaxCheck::Intact);
        }

        let dialect = SyntaxDialect::detect(raw);
        tracing::debug!(?dialect, "Normalizing syntax diagnostic");

        let diagnostic = match dialect {
            SyntaxDialect::Tab => parse_clause_dialect("TabError", TAB_PREFIX, raw, source)?,
            SyntaxDialect::Indentation => {
                parse_clause_dialect("IndentationError", INDENT_PREFIX, raw, source)?
            }
            SyntaxDialect::Generic => self.parse_generic(raw)?,
        };
        Ok(SyntaxCheck::Broken(diagnostic))
    }

    fn parse_generic(&self, raw: &str) -> Result<SyntaxDiagnostic> {
        let lines: Vec<&str> = raw.lines().collect();

        let header = lines
            .iter()
            .position(|line| line.trim_start().starts_with("File \""))
            .ok_or_else(|| FaultlineError::malformed("no location header", raw))?;

        let digits = lines[header]
            .split_whitespace()
            .last()
            .and_then(|token| DIGITS.find(token))
            .ok_or_else(|| FaultlineError::malformed("no line digits", raw))?;
        let reported: usize = digits
            .as_str()
            .parse()
            .map_err(|_| FaultlineError::malformed("line digits out of range", raw))?;
        let line_number = reported
            .checked_sub(self.injected_lines)
            .filter(|line| *line >= 1)
            .ok_or_else(|| FaultlineError::malformed("line precedes the user's source", raw))?;

        let (message_index, kind, message) = lines
            .iter()
            .enumerate()
            .skip(header + 1)
            .find_map(|(index, line)| {
                MESSAGE_LINE
                    .captures(line.trim())
                    .map(|caps| (index, caps[1].to_string(), caps[2].trim().to_string()))
            })
            .ok_or_else(|| FaultlineError::malformed("no message line", raw))?;

        let code_raw = lines
            .get(header + 1)
            .filter(|_| header + 1 < message_index)
            .ok_or_else(|| FaultlineError::malformed("no source line", raw))?;
        let code = code_raw.trim().to_string();
        let code_indent = leading_width(code_raw);

        let caret_line = lines[header + 2..message_index]
            .iter()
            .find(|line| is_caret_line(line));

        let pointer = match caret_line {
            Some(line) => {
                let start = leading_width(line).saturating_sub(code_indent);
                let width = line.trim().chars().count().max(1);
                Pointer { start, width }
            }
            None => Pointer {
                start: 0,
                width: code.chars().count().max(1),
            },
        };

        Ok(SyntaxDiagnostic {
            kind,
            line_number,
            source_line: code,
            pointer,
            message,
        })
    }
}

/// Tab and indentation dialects: `Sorry: Kind: message (file, line N)`.
fn parse_clause_dialect(
    kind: &str,
    prefix: &str,
    raw: &str,
    source: &str,
) -> Result<SyntaxDiagnostic> {
    let first = raw.trim_start().lines().next().unwrap_or_default();
    let body = first[prefix.len()..].trim_end();

    let open = body
        .rfind('(')
        .ok_or_else(|| FaultlineError::malformed("no location clause", raw))?;
    let message = body[..open].trim().to_string();
    let clause = body[open + 1..].trim_end_matches(')');

    let digits = clause
        .rsplit(',')
        .next()
        .and_then(|part| DIGITS.find(part))
        .ok_or_else(|| FaultlineError::malformed("no line digits", raw))?;
    let line_number: usize = digits
        .as_str()
        .parse()
        .map_err(|_| FaultlineError::malformed("line digits out of range", raw))?;

    let source_line = line_number
        .checked_sub(1)
        .and_then(|index| source.lines().nth(index))
        .ok_or_else(|| FaultlineError::malformed("referenced line does not exist", raw))?
        .trim()
        .to_string();

    Ok(SyntaxDiagnostic {
        kind: kind.to_string(),
        line_number,
        source_line,
        pointer: Pointer { start: 0, width: 1 },
        message,
    })
}

fn leading_width(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

fn is_caret_line(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| c == '^' || c == '~')
}

/// Capitalize the first letter only.
pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl SyntaxDiagnostic {
    pub fn display_message(&self) -> String {
        capitalize_first(&self.message)
    }

    /// Plain block rendering, used for file output and when the source is
    /// not available.
    pub fn to_report(&self) -> Report {
        let gutter = self.line_number.to_string();
        let blank_gutter = " ".repeat(gutter.len());
        let body = vec![
            Block::Line(vec![
                Span::new(Tone::Muted, format!("{} │ ", gutter)),
                Span::new(Tone::Value, self.source_line.clone()),
            ]),
            Block::Line(vec![
                Span::new(Tone::Muted, format!("{} │ ", blank_gutter)),
                Span::plain(" ".repeat(self.pointer.start)),
                Span::new(Tone::Pointer, "^".repeat(self.pointer.width.max(1))),
            ]),
            Block::Blank,
            Block::field("Message", self.display_message()),
        ];
        Report::titled(self.kind.clone(), Tone::Alert, body)
    }

    /// Source-annotated rendering of the diagnostic against `source`.
    ///
    /// Falls back to [`SyntaxDiagnostic::to_report`] when the line cannot be
    /// located in `source`.
    pub fn render(&self, path: &str, source: &str, color: bool) -> String {
        let Some((start, end)) = self.source_span(source) else {
            return self.to_report().to_text(color);
        };

        let mut output = Vec::new();
        let written = AriadneReport::build(ReportKind::Error, path.to_string(), start)
            .with_config(Config::default().with_color(color))
            .with_message(format!("{}: {}", self.kind, self.display_message()))
            .with_label(
                Label::new((path.to_string(), start..end))
                    .with_message(self.display_message())
                    .with_color(Color::Red),
            )
            .finish()
            .write((path.to_string(), Source::from(source)), &mut output);

        match written {
            Ok(()) => String::from_utf8_lossy(&output).into_owned(),
            Err(e) => {
                tracing::debug!("ariadne rendering failed: {}", e);
                self.to_report().to_text(color)
            }
        }
    }

    /// Character offsets of the pointed span within `source`.
    fn source_span(&self, source: &str) -> Option<(usize, usize)> {
        let mut offset = 0;
        for (index, line) in source.split_inclusive('\n').enumerate() {
            let content = line.trim_end_matches(['\n', '\r']);
            if index + 1 == self.line_number {
                let length = content.chars().count();
                let start = (leading_width(content) + self.pointer.start).min(length);
                let end = (start + self.pointer.width.max(1)).min(length.max(start + 1));
                return Some((offset + start, offset + end));
            }
            offset += line.chars().count();
        }
        None
    }
}
