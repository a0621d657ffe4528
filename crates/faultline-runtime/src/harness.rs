/*
 * harness.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Instrumented execution of the user's script.
 */

//! Instrumented execution of the user's script.
//!
//! The script is never run in place. Instead a *mirror file* is written to
//! the state directory: a fixed three-line header followed by the user's
//! source, unchanged. The header imports the hook module (written next to
//! the mirror) and installs it as `sys.excepthook`.
//!
//! Python only honours an encoding declaration on the first two lines and
//! requires `from __future__` imports to come first, so those lines (and
//! any module docstring, comments or blank lines around them) stay above
//! the header. See [`hoisted_prefix`].
//!
//! # Fault protocol
//!
//! - faultline sets `FAULTLINE_FAULT_FILE` to a path in the state directory
//! - on an uncaught exception the hook writes the fault there as JSON
//! - after the interpreter exits, faultline decodes the file and hands the
//!   [`FaultContext`] to a [`FaultHandler`]
//!
//! ```json
//! {
//!   "kind": "ValueError",
//!   "message": "bad input",
//!   "frames": [{"path": "...", "function": "<module>", "line_number": 4, ...}]
//! }
//! ```

use std::borrow::Cow;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use faultline_core::{FaultContext, FrameAttributor};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::traits::{ChildStdout, RuntimeResult, ScriptRuntime};

/// Lines the mirror header places ahead of the user's source.
pub const HEADER_LINES: usize = 3;

pub const FAULT_FILE_ENV: &str = "FAULTLINE_FAULT_FILE";

const HOOK_MODULE: &str = "_faultline_hook";
const HOOK_SOURCE: &str = include_str!("../resources/fault_hook.py");
const MIRROR_FILE: &str = "mirror.py";
const FAULT_FILE: &str = "fault.json";

static CODING_COOKIE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[ \t\f]*#.*?coding[:=][ \t]*[-\w.]+")
        .expect("CODING_COOKIE is a valid static regex pattern")
});

static FUTURE_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^from\s+__future__\s+import\b")
        .expect("FUTURE_IMPORT is a valid static regex pattern")
});

static STRING_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^[rRuU]?("""|'''|"|')"#).expect("STRING_START is a valid static regex pattern")
});

/// Where the instrumented copy lives and how far it is shifted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessInfo {
    pub instrumented_path: PathBuf,
    pub header_lines: usize,
    /// Source lines kept above the header, unshifted.
    pub hoisted_lines: usize,
}

impl HarnessInfo {
    pub fn attributor(&self) -> FrameAttributor {
        FrameAttributor::new(&self.instrumented_path, self.header_lines)
            .with_hoisted_lines(self.hoisted_lines)
    }
}

/// Receives the fault observed in a run.
pub trait FaultHandler {
    fn on_fault(&mut self, fault: FaultContext, harness: &HarnessInfo) -> faultline_core::Result<()>;
}

impl<F> FaultHandler for F
where
    F: FnMut(FaultContext, &HarnessInfo) -> faultline_core::Result<()>,
{
    fn on_fault(&mut self, fault: FaultContext, harness: &HarnessInfo) -> faultline_core::Result<()> {
        self(fault, harness)
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub exit_code: i32,
    pub faulted: bool,
}

/// The three header lines for a script at `script`.
pub fn mirror_header(script: &Path) -> String {
    // A JSON string literal is also a valid Python string literal.
    let literal = serde_json::Value::String(script.to_string_lossy().into_owned()).to_string();
    format!(
        "import {module}\n{module}.install({literal})\ndel {module}\n",
        module = HOOK_MODULE,
        literal = literal
    )
}

/// Number of leading lines of `source` that must stay ahead of the header.
///
/// That is everything up to and including the last `from __future__`
/// import or encoding declaration, skipping over blank lines, comments and
/// the module docstring. A docstring is kept above the header too so it
/// remains the module's `__doc__`.
pub fn hoisted_prefix(source: &[u8]) -> usize {
    let lines: Vec<Cow<'_, str>> = source
        .split(|&b| b == b'\n')
        .map(String::from_utf8_lossy)
        .collect();

    let mut keep = 0;
    let mut docstring_seen = false;
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].trim();
        if i < 2 && CODING_COOKIE.is_match(&lines[i]) {
            keep = i + 1;
            i += 1;
        } else if line.is_empty() || line.starts_with('#') {
            i += 1;
        } else if let Some(end) = docstring_end(&lines, i).filter(|_| !docstring_seen) {
            docstring_seen = true;
            i = end + 1;
            keep = i;
        } else if FUTURE_IMPORT.is_match(&lines[i]) {
            i = statement_end(&lines, i) + 1;
            keep = i;
        } else {
            break;
        }
    }
    keep.min(lines.len())
}

/// Last line of the bare string statement opening on line `start`, if
/// that line opens one.
fn docstring_end(lines: &[Cow<'_, str>], start: usize) -> Option<usize> {
    let first = lines[start].trim();
    let quotes = STRING_START.captures(first)?.get(1)?;
    let delimiter = quotes.as_str();

    let body = &first[quotes.end()..];
    if body.len() >= delimiter.len() && body.ends_with(delimiter) {
        return Some(start);
    }
    if delimiter.len() == 1 || body.contains(delimiter) {
        return None;
    }
    let end = (start + 1..lines.len()).find(|&i| lines[i].contains(delimiter))?;
    lines[end].trim_end().ends_with(delimiter).then_some(end)
}

/// Index of the last line of the statement opening on line `start`,
/// following parentheses and backslash continuations.
fn statement_end(lines: &[Cow<'_, str>], start: usize) -> usize {
    let mut depth: i32 = 0;
    let mut i = start;
    while i < lines.len() {
        let code = lines[i].split('#').next().unwrap_or("");
        depth += code.matches('(').count() as i32 - code.matches(')').count() as i32;
        if depth <= 0 && !code.trim_end().ends_with('\\') {
            return i;
        }
        i += 1;
    }
    lines.len() - 1
}

/// The mirror of `source`: hoisted prefix, header, then the rest.
fn mirror_contents(script: &Path, source: &[u8]) -> (Vec<u8>, usize) {
    let hoisted = hoisted_prefix(source);
    let split = match hoisted {
        0 => 0,
        n => source
            .iter()
            .enumerate()
            .filter(|(_, b)| **b == b'\n')
            .nth(n - 1)
            .map_or(source.len(), |(pos, _)| pos + 1),
    };
    let (prefix, rest) = source.split_at(split);

    let mut contents = Vec::with_capacity(source.len() + 256);
    contents.extend_from_slice(prefix);
    if !prefix.is_empty() && !prefix.ends_with(b"\n") {
        contents.push(b'\n');
    }
    contents.extend_from_slice(mirror_header(script).as_bytes());
    contents.extend_from_slice(rest);
    (contents, hoisted)
}

/// Writes the mirror, runs it, and collects the fault.
pub struct Instrumentation<'a, R: ScriptRuntime + ?Sized> {
    runtime: &'a R,
    state_dir: PathBuf,
    python: PathBuf,
}

impl<'a, R: ScriptRuntime + ?Sized> Instrumentation<'a, R> {
    pub fn new(runtime: &'a R, state_dir: impl Into<PathBuf>, python: impl Into<PathBuf>) -> Self {
        Self {
            runtime,
            state_dir: state_dir.into(),
            python: python.into(),
        }
    }

    fn fault_path(&self, state_dir: &Path) -> PathBuf {
        state_dir.join(FAULT_FILE)
    }

    /// Write the hook module and the mirror of `script`.
    ///
    /// `script` must be absolute; it is what the user's code sees as
    /// `sys.argv[0]`.
    pub fn prepare(&self, script: &Path) -> RuntimeResult<HarnessInfo> {
        self.runtime.dir_create(&self.state_dir)?;
        let state_dir = self.runtime.canonicalize(&self.state_dir)?;

        let source = self.runtime.file_read(script)?;
        let hook_path = state_dir.join(format!("{}.py", HOOK_MODULE));
        self.runtime.file_write(&hook_path, HOOK_SOURCE.as_bytes())?;

        let mirror = state_dir.join(MIRROR_FILE);
        let (contents, hoisted_lines) = mirror_contents(script, &source);
        self.runtime.file_write(&mirror, &contents)?;

        tracing::debug!(mirror = %mirror.display(), hoisted_lines, "Wrote instrumented copy");
        Ok(HarnessInfo {
            instrumented_path: mirror,
            header_lines: HEADER_LINES,
            hoisted_lines,
        })
    }

    /// Run `script` under the harness.
    ///
    /// When the script dies of an uncaught exception the decoded fault is
    /// passed to `handler` after the interpreter has exited.
    pub fn run(
        &self,
        script: &Path,
        args: &[String],
        stdout: ChildStdout,
        handler: &mut dyn FaultHandler,
    ) -> RuntimeResult<RunOutcome> {
        let harness = self.prepare(script)?;
        let state_dir = harness
            .instrumented_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.state_dir.clone());
        let fault_path = self.fault_path(&state_dir);
        self.runtime.file_remove(&fault_path)?;

        let mut argv: Vec<&OsStr> = vec![harness.instrumented_path.as_os_str()];
        argv.extend(args.iter().map(OsStr::new));

        tracing::info!(
            python = %self.python.display(),
            script = %script.display(),
            "Running script"
        );
        let exit_code = self.runtime.exec_inherit(
            &self.python,
            &argv,
            &[(FAULT_FILE_ENV, fault_path.as_os_str())],
            stdout,
        )?;

        if !self.runtime.is_file(&fault_path) {
            return Ok(RunOutcome {
                exit_code,
                faulted: false,
            });
        }

        let payload = self.runtime.file_read_string(&fault_path)?;
        self.runtime.file_remove(&fault_path)?;
        let fault = FaultContext::from_payload(&payload)?;
        tracing::debug!(kind = %fault.kind, frames = fault.frames.len(), "Captured fault");

        handler.on_fault(fault, &harness)?;
        Ok(RunOutcome {
            exit_code,
            faulted: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_is_three_lines() {
        let header = mirror_header(Path::new("/home/me/job.py"));
        assert_eq!(header.lines().count(), HEADER_LINES);
        assert!(header.contains("install(\"/home/me/job.py\")"));
    }

    #[test]
    fn test_header_quotes_awkward_paths() {
        let header = mirror_header(Path::new("/tmp/it's \"here\"\\x.py"));
        assert!(header.contains(r#"install("/tmp/it's \"here\"\\x.py")"#));
    }

    fn mirror_text(source: &str) -> (String, usize) {
        let (contents, hoisted) = mirror_contents(Path::new("/w/job.py"), source.as_bytes());
        (String::from_utf8(contents).unwrap(), hoisted)
    }

    #[test]
    fn test_plain_script_gets_header_first() {
        assert_eq!(hoisted_prefix(b"import os\nprint(os.sep)\n"), 0);
        let (text, _) = mirror_text("import os\n");
        assert!(text.starts_with("import _faultline_hook\n"));
        assert!(text.ends_with("del _faultline_hook\nimport os\n"));
    }

    #[test]
    fn test_future_imports_stay_first() {
        let (text, hoisted) = mirror_text(
            "from __future__ import annotations\nfrom __future__ import division\nx = 1\n",
        );
        assert_eq!(hoisted, 2);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "from __future__ import annotations");
        assert_eq!(lines[1], "from __future__ import division");
        assert_eq!(lines[2], "import _faultline_hook");
        assert_eq!(lines[5], "x = 1");
    }

    #[test]
    fn test_docstring_and_comments_before_future_import() {
        let source = "#!/usr/bin/env python3\n\"\"\"Tool.\n\nMore.\n\"\"\"\n# note\nfrom __future__ import (\n    annotations,\n)\nimport os\n";
        assert_eq!(hoisted_prefix(source.as_bytes()), 9);
    }

    #[test]
    fn test_coding_cookie_stays_on_line_one() {
        let source = b"# -*- coding: latin-1 -*-\nname = '\xe9'\n";
        assert_eq!(hoisted_prefix(source), 1);
        let (contents, _) = mirror_contents(Path::new("/w/job.py"), source);
        assert!(contents.starts_with(b"# -*- coding: latin-1 -*-\nimport _faultline_hook\n"));
        assert!(contents.ends_with(b"name = '\xe9'\n"));
    }

    #[test]
    fn test_prefix_without_trailing_newline() {
        let (text, hoisted) = mirror_text("from __future__ import annotations");
        assert_eq!(hoisted, 1);
        assert!(text.starts_with("from __future__ import annotations\nimport _faultline_hook\n"));
    }

    #[test]
    fn test_future_import_after_code_is_left_alone() {
        assert_eq!(hoisted_prefix(b"x = 1\nfrom __future__ import annotations\n"), 0);
    }

    #[test]
    fn test_string_expression_is_not_a_docstring() {
        assert_eq!(hoisted_prefix(b"\"-\".join(['a', 'b'])\nx = 1\n"), 0);
        assert_eq!(hoisted_prefix(b"'''Doc.'''\nx = 1\n"), 1);
    }

    #[test]
    fn test_hook_names_are_hidden_from_locals() {
        assert!(!faultline_core::frame::is_reportable_local(HOOK_MODULE, false));
    }
}
