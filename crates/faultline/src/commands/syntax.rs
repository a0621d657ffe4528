/*
 * commands/syntax.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Syntax check mode
 */

//! Syntax check mode (`--syntax`).

use std::path::Path;

use anyhow::Result;
use faultline_core::{
    Block, OutputSink, Report, SyntaxCheck, SyntaxDiagnostic, TerminalSink, Tone,
};
use faultline_runtime::{NativeRuntime, ScriptRuntime, SyntaxChecker};

use super::{Settings, validate_target};

pub const INTACT: &str = "INTACT";

/// Run the syntax checker over an absolute script path.
pub fn check<R: ScriptRuntime + ?Sized>(
    runtime: &R,
    settings: &Settings,
    python: &Path,
    script: &Path,
) -> Result<SyntaxCheck> {
    let checker = SyntaxChecker::new(runtime, python, settings.pycache_dir());
    Ok(checker.check(script)?)
}

/// Show a diagnostic: annotated source on the terminal, the plain block
/// when a capture sink is given.
pub fn show(
    diagnostic: &SyntaxDiagnostic,
    script: &Path,
    source: &str,
    settings: &Settings,
    sink: Option<&mut dyn OutputSink>,
) -> Result<()> {
    match sink {
        Some(sink) => sink.emit(&diagnostic.to_report())?,
        None => print!(
            "{}",
            diagnostic.render(&script.display().to_string(), source, settings.color)
        ),
    }
    Ok(())
}

/// Execute `faultline --syntax SCRIPT`
pub fn execute(settings: &Settings, script: &Path) -> Result<i32> {
    let runtime = NativeRuntime::new();
    let script = validate_target(&runtime, script)?;
    let python = settings.python()?;

    match check(&runtime, settings, &python, &script)? {
        SyntaxCheck::Intact => {
            TerminalSink::new(settings.color)
                .emit(&Report::bare(vec![Block::text(Tone::Success, INTACT)]))?;
            Ok(0)
        }
        SyntaxCheck::Broken(diagnostic) => {
            let source = runtime.file_read_string(&script)?;
            show(&diagnostic, &script, &source, settings, None)?;
            Ok(1)
        }
    }
}
