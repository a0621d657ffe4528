/*
 * run.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Run command implementation
 */

//! Run command implementation.
//!
//! `faultline [FLAGS] SCRIPT [ARGS]...`:
//!
//! 1. validate the script and the output path
//! 2. syntax check; a broken script is reported and never run
//! 3. persist the session and the resolved recipe for `--recent`
//! 4. run the script under the harness and render a report on fault

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use faultline_core::{
    FaultContext, FileSessionStore, ModeFlags, OutputSink, Recipe, RenderContext,
    ReportAssembler, SessionInfo, SessionStore, StackExchangeSearch, SyntaxCheck, TerminalSink,
    TextFileSink, validate_output_path,
};
use faultline_runtime::{ChildStdout, HarnessInfo, Instrumentation, NativeRuntime, ScriptRuntime};
use tracing::{debug, info};

use super::{Settings, syntax, validate_target};

/// Arguments for the run command
#[derive(Debug)]
pub struct RunArgs {
    pub script: PathBuf,
    /// Passed to the script unchanged
    pub args: Vec<String>,
    pub flags: ModeFlags,
    /// Capture file for the script's stdout and the report
    pub output: Option<PathBuf>,
    pub settings: Settings,
}

/// Execute the run command
pub fn execute(args: RunArgs) -> Result<i32> {
    let runtime = NativeRuntime::new();
    let script = validate_target(&runtime, &args.script)?;
    if let Some(output) = &args.output {
        validate_output_path(output)?;
    }

    let recipe = Recipe::from_flags(&args.flags);
    let session = SessionInfo::new(script, args.args);
    debug!(modes = ?recipe.modes(), "Resolved recipe");

    launch(
        &runtime,
        &args.settings,
        &session,
        &recipe,
        args.output.as_deref(),
        true,
    )
}

/// Syntax check, then run `session` with `recipe`.
///
/// Shared with replay, which passes `persist = false` since the stored
/// state is what it is replaying.
pub fn launch<R: ScriptRuntime + ?Sized>(
    runtime: &R,
    settings: &Settings,
    session: &SessionInfo,
    recipe: &Recipe,
    output: Option<&Path>,
    persist: bool,
) -> Result<i32> {
    let script = &session.target_path;
    let python = settings.python()?;

    let mut file_sink = match output {
        Some(path) => Some(TextFileSink::create(path)?),
        None => None,
    };

    if let SyntaxCheck::Broken(diagnostic) = syntax::check(runtime, settings, &python, script)? {
        let source = runtime.file_read_string(script)?;
        syntax::show(
            &diagnostic,
            script,
            &source,
            settings,
            file_sink.as_mut().map(|sink| sink as &mut dyn OutputSink),
        )?;
        return Ok(1);
    }

    if persist {
        let store = FileSessionStore::new(settings.state_dir());
        store
            .write(session)
            .context("Failed to save session state")?;
        store
            .write_recipe(recipe)
            .context("Failed to save session state")?;
    }

    let (mut sink, stdout): (Box<dyn OutputSink>, ChildStdout) = match file_sink {
        Some(sink) => {
            let handle = sink.share_handle()?;
            (Box::new(sink), ChildStdout::File(handle))
        }
        None => (
            Box::new(TerminalSink::new(settings.color)),
            ChildStdout::Inherit,
        ),
    };

    let search = StackExchangeSearch::new(settings.config.search.clone());
    let assembler = ReportAssembler::new(&search);
    let mut handler = |fault: FaultContext, harness: &HarnessInfo| {
        let attributor = harness.attributor();
        let ctx = RenderContext::new(&fault, &attributor, session);
        assembler.deliver(&ctx, recipe, sink.as_mut())
    };

    let harness = Instrumentation::new(runtime, settings.state_dir(), &python);
    let outcome = harness.run(script, &session.target_args, stdout, &mut handler)?;

    info!(
        exit_code = outcome.exit_code,
        faulted = outcome.faulted,
        "Script finished"
    );
    Ok(outcome.exit_code)
}
