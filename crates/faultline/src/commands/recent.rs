/*
 * commands/recent.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Replay of the most recent run
 */

//! Replay of the most recent run (`--recent`).

use std::path::Path;

use anyhow::Result;
use faultline_core::{FaultlineError, FileSessionStore, plan_replay};
use faultline_runtime::{NativeRuntime, PathKind, ScriptRuntime};

use super::{Settings, run};

pub const CORRUPTED: &str = "The available information is corrupted.";

/// Execute `faultline --recent`
///
/// Missing state is reported and exits cleanly; corrupted state is reported
/// and exits with status 1. In both cases nothing is run.
pub fn execute(settings: &Settings, output: Option<&Path>) -> Result<i32> {
    let runtime = NativeRuntime::new();
    let store = FileSessionStore::new(settings.state_dir());

    let plan = match plan_replay(&store, |path| {
        runtime.path_exists(path, Some(PathKind::File))
    }) {
        Ok(plan) => plan,
        Err(FaultlineError::NoPriorSession) => {
            println!("{}", FaultlineError::NoPriorSession);
            return Ok(0);
        }
        Err(FaultlineError::CorruptSessionState(detail)) => {
            tracing::debug!("Replay aborted: {}", detail);
            println!("{}", CORRUPTED);
            return Ok(1);
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(output) = output {
        faultline_core::validate_output_path(output)?;
    }

    run::launch(
        &runtime,
        settings,
        &plan.session,
        &plan.recipe,
        output,
        false,
    )
}
