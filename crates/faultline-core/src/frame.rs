/*
 * frame.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Fault and call-stack frame model.
 */

//! Fault and call-stack frame model.
//!
//! A [`FaultContext`] is the single failure a report is about. It is built
//! once from the payload the harness hook writes (see [`FaultContext::from_payload`])
//! and never mutated afterwards.
//!
//! Local variable snapshots are filtered on the way in: dunder names,
//! names bound to modules, and names reserved by the harness never reach
//! a renderer.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{FaultlineError, Result};

/// Prefix for names the harness header binds in the target's module scope.
pub const HARNESS_NAME_PREFIX: &str = "_faultline_";

/// One entry of the call stack active when the fault happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub source_path: PathBuf,
    pub function_name: String,
    /// 1-based line number as reported by the interpreter (uncorrected).
    pub line_number: usize,
    /// Line on which the implicated span ends, when it differs from `line_number`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line_number: Option<usize>,
    /// Raw text of the line, indentation preserved, without trailing newline.
    pub source_line: String,
    /// Character column where the implicated span starts (0-based).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_start: Option<usize>,
    /// Character column where the implicated span ends (exclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_end: Option<usize>,
    #[serde(default)]
    pub locals: IndexMap<String, String>,
}

impl Frame {
    pub fn new(
        source_path: impl Into<PathBuf>,
        function_name: impl Into<String>,
        line_number: usize,
        source_line: impl Into<String>,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            function_name: function_name.into(),
            line_number,
            end_line_number: None,
            source_line: source_line.into(),
            column_start: None,
            column_end: None,
            locals: IndexMap::new(),
        }
    }

    pub fn with_columns(mut self, start: usize, end: usize) -> Self {
        self.column_start = Some(start);
        self.column_end = Some(end);
        self
    }

    pub fn with_end_line(mut self, end_line_number: usize) -> Self {
        self.end_line_number = Some(end_line_number);
        self
    }

    pub fn with_local(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.locals.insert(name.into(), value.into());
        self
    }

    /// The source line without surrounding whitespace.
    pub fn code(&self) -> &str {
        self.source_line.trim()
    }

    /// Number of characters of leading indentation in `source_line`.
    pub fn indent(&self) -> usize {
        self.source_line
            .chars()
            .take_while(|c| c.is_whitespace())
            .count()
    }

    /// Whether the implicated span continues past this line.
    pub fn spans_lines(&self) -> bool {
        self.end_line_number
            .is_some_and(|end| end != self.line_number)
    }

    pub fn is_from(&self, path: &Path) -> bool {
        self.source_path == path
    }
}

/// The failure a report is produced for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultContext {
    /// Failure category, e.g. `ValueError`.
    pub kind: String,
    pub message: String,
    /// Outermost frame first.
    pub frames: Vec<Frame>,
}

impl FaultContext {
    pub fn new(kind: impl Into<String>, message: impl Into<String>, frames: Vec<Frame>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            frames,
        }
    }

    /// Decode the JSON payload written by the harness hook.
    pub fn from_payload(json: &str) -> Result<Self> {
        let raw: RawFault = serde_json::from_str(json)
            .map_err(|e| FaultlineError::MalformedFault(e.to_string()))?;
        Ok(raw.into())
    }
}

/// Wire shape of the hook payload.
#[derive(Debug, Deserialize)]
struct RawFault {
    kind: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    frames: Vec<RawFrame>,
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    path: PathBuf,
    function: String,
    line_number: usize,
    #[serde(default)]
    end_line_number: Option<usize>,
    #[serde(default)]
    column_start: Option<usize>,
    #[serde(default)]
    column_end: Option<usize>,
    #[serde(default)]
    source_line: String,
    #[serde(default)]
    locals: Vec<RawLocal>,
}

#[derive(Debug, Deserialize)]
struct RawLocal {
    name: String,
    value: String,
    /// The value is a module object.
    #[serde(default)]
    module: bool,
}

impl From<RawFault> for FaultContext {
    fn from(raw: RawFault) -> Self {
        FaultContext {
            kind: raw.kind,
            message: raw.message,
            frames: raw.frames.into_iter().map(Frame::from).collect(),
        }
    }
}

impl From<RawFrame> for Frame {
    fn from(raw: RawFrame) -> Self {
        // The interpreter reports UTF-8 byte offsets.
        let column_start = raw
            .column_start
            .map(|offset| byte_to_char_column(&raw.source_line, offset));
        let column_end = raw
            .column_end
            .map(|offset| byte_to_char_column(&raw.source_line, offset));

        let locals = raw
            .locals
            .into_iter()
            .filter(|local| is_reportable_local(&local.name, local.module))
            .map(|local| (local.name, local.value))
            .collect();

        Frame {
            source_path: raw.path,
            function_name: raw.function,
            line_number: raw.line_number,
            end_line_number: raw.end_line_number,
            source_line: raw.source_line,
            column_start,
            column_end,
            locals,
        }
    }
}

/// Whether a local binding belongs in a report.
pub fn is_reportable_local(name: &str, is_module: bool) -> bool {
    !(name.starts_with("__")
        || name.ends_with("__")
        || name.starts_with(HARNESS_NAME_PREFIX)
        || is_module)
}

/// Convert a UTF-8 byte offset into a character column of `line`.
///
/// Offsets past the end of the line (multi-line spans) clamp to the line length.
fn byte_to_char_column(line: &str, offset: usize) -> usize {
    if offset >= line.len() {
        return line.chars().count();
    }
    line.char_indices()
        .take_while(|(index, _)| *index < offset)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reportable_local_filter() {
        assert!(is_reportable_local("count", false));
        assert!(is_reportable_local("_private", false));
        assert!(!is_reportable_local("__name__", false));
        assert!(!is_reportable_local("__hidden", false));
        assert!(!is_reportable_local("trailing__", false));
        assert!(!is_reportable_local("_faultline_install", false));
        assert!(!is_reportable_local("os", true));
    }

    #[test]
    fn test_payload_decoding_filters_locals() {
        let json = r#"{
            "kind": "ZeroDivisionError",
            "message": "division by zero",
            "frames": [{
                "path": "/tmp/state/mirror.py",
                "function": "<module>",
                "line_number": 5,
                "column_start": 4,
                "column_end": 9,
                "source_line": "    1 / 0",
                "locals": [
                    {"name": "__name__", "value": "'__main__'"},
                    {"name": "sys", "value": "<module 'sys'>", "module": true},
                    {"name": "_faultline_install", "value": "<function>"},
                    {"name": "total", "value": "3"}
                ]
            }]
        }"#;

        let fault = FaultContext::from_payload(json).unwrap();
        assert_eq!(fault.kind, "ZeroDivisionError");
        assert_eq!(fault.frames.len(), 1);

        let frame = &fault.frames[0];
        assert_eq!(frame.locals.len(), 1);
        assert_eq!(frame.locals.get("total"), Some(&"3".to_string()));
        assert_eq!(frame.column_start, Some(4));
        assert_eq!(frame.column_end, Some(9));
    }

    #[test]
    fn test_payload_columns_are_converted_to_chars() {
        // "é" is two bytes; the byte offset 11 lands on the start of `boom`.
        let json = r#"{
            "kind": "NameError",
            "message": "name 'boom' is not defined",
            "frames": [{
                "path": "m.py",
                "function": "f",
                "line_number": 1,
                "column_start": 11,
                "column_end": 15,
                "source_line": "x = \"é\" + boom"
            }]
        }"#;

        let fault = FaultContext::from_payload(json).unwrap();
        let frame = &fault.frames[0];
        assert_eq!(frame.column_start, Some(10));
        assert_eq!(frame.column_end, Some(14));
    }

    #[test]
    fn test_malformed_payload() {
        let err = FaultContext::from_payload("{not json").unwrap_err();
        assert!(matches!(err, FaultlineError::MalformedFault(_)));
    }

    #[test]
    fn test_frame_helpers() {
        let frame = Frame::new("a.py", "f", 3, "        return x[1]").with_end_line(4);
        assert_eq!(frame.code(), "return x[1]");
        assert_eq!(frame.indent(), 8);
        assert!(frame.spans_lines());
    }
}
