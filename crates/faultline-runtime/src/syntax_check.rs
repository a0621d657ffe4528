/*
 * syntax_check.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Syntax check of the user's script before it is run.
 */

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use faultline_core::{SyntaxCheck, SyntaxNormalizer};

use crate::traits::{RuntimeResult, ScriptRuntime};

/// Keeps `py_compile` from writing `__pycache__` next to the user's script.
const PYCACHE_PREFIX_ENV: &str = "PYTHONPYCACHEPREFIX";

/// Runs `python -m py_compile` on a script and normalizes the outcome.
pub struct SyntaxChecker<'a, R: ScriptRuntime + ?Sized> {
    runtime: &'a R,
    python: PathBuf,
    cache_dir: PathBuf,
}

impl<'a, R: ScriptRuntime + ?Sized> SyntaxChecker<'a, R> {
    pub fn new(runtime: &'a R, python: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            runtime,
            python: python.into(),
            cache_dir: cache_dir.into(),
        }
    }

    /// A zero exit status means the script compiled. Warnings printed on
    /// the way (e.g. `SyntaxWarning` for invalid escapes) do not count.
    pub fn check(&self, script: &Path) -> RuntimeResult<SyntaxCheck> {
        let source = self.runtime.file_read_string(script)?;
        let output = self.runtime.exec_command(
            &self.python,
            &[OsStr::new("-m"), OsStr::new("py_compile"), script.as_os_str()],
            &[(PYCACHE_PREFIX_ENV, self.cache_dir.as_os_str())],
        )?;

        tracing::debug!(code = output.code, "Syntax check finished");
        if output.success() {
            return Ok(SyntaxCheck::Intact);
        }

        // py_compile checks the user's file directly, so nothing was injected.
        Ok(SyntaxNormalizer::new().normalize(&output.stderr_string(), &source)?)
    }
}
