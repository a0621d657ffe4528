/*
 * commands/mod.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Shared settings and target validation for the CLI commands.
 */

//! Command implementations for the faultline CLI
//!
//! Each module handles one mode of the CLI and delegates to faultline-core
//! and faultline-runtime for the actual work.

pub mod recent;
pub mod run;
pub mod syntax;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use faultline_core::{ColorChoice, Config, FaultlineError};
use faultline_runtime::{NativeRuntime, PathKind, ScriptRuntime, find_python};

/// Configuration with command-line overrides applied.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: Config,
    /// Whether terminal output is coloured.
    pub color: bool,
}

impl Settings {
    pub fn resolve(python: Option<PathBuf>, color: Option<ColorChoice>) -> Result<Self> {
        let mut config = Config::load().context("Failed to load configuration")?;
        if let Some(python) = python {
            config.python = Some(python);
        }
        if let Some(color) = color {
            config.color = color;
        }

        let color = config.color.enabled(std::io::stdout().is_terminal());
        Ok(Self { config, color })
    }

    /// The interpreter to run scripts with, searched for only when a
    /// command actually needs one.
    pub fn python(&self) -> Result<PathBuf> {
        let python = match &self.config.python {
            Some(python) => python.clone(),
            None => find_python(&NativeRuntime::new())?,
        };
        tracing::debug!(python = %python.display(), "Resolved interpreter");
        Ok(python)
    }

    pub fn state_dir(&self) -> PathBuf {
        self.config.state_dir()
    }

    /// Where `py_compile` may leave bytecode.
    pub fn pycache_dir(&self) -> PathBuf {
        self.state_dir().join("pycache")
    }
}

/// Check that `script` is an existing `.py` file and make it absolute.
pub fn validate_target<R: ScriptRuntime + ?Sized>(
    runtime: &R,
    script: &Path,
) -> std::result::Result<PathBuf, FaultlineError> {
    if !runtime.path_exists(script, None) {
        return Err(FaultlineError::InvalidTarget(format!(
            "{} does not exist",
            script.display()
        )));
    }
    if !runtime.path_exists(script, Some(PathKind::File)) {
        return Err(FaultlineError::InvalidTarget(format!(
            "{} is not a file",
            script.display()
        )));
    }
    if script.extension().is_none_or(|ext| ext != "py") {
        return Err(FaultlineError::InvalidTarget(format!(
            "{} is not a Python script",
            script.display()
        )));
    }

    runtime.canonicalize(script).map_err(|e| {
        FaultlineError::InvalidTarget(format!("{}: {}", script.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_script_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let err = validate_target(&NativeRuntime::new(), &temp.path().join("nope.py")).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_directory_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("pkg.py");
        std::fs::create_dir(&dir).unwrap();
        let err = validate_target(&NativeRuntime::new(), &dir).unwrap_err();
        assert!(err.to_string().contains("is not a file"));
    }

    #[test]
    fn test_non_python_file_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("notes.txt");
        std::fs::write(&file, "hi").unwrap();
        let err = validate_target(&NativeRuntime::new(), &file).unwrap_err();
        assert!(err.to_string().contains("is not a Python script"));
    }

    #[test]
    fn test_configured_python_is_used_as_is() {
        let config = Config {
            python: Some(PathBuf::from("/opt/py/bin/python3")),
            ..Config::default()
        };
        let settings = Settings {
            config,
            color: false,
        };
        assert_eq!(settings.python().unwrap(), PathBuf::from("/opt/py/bin/python3"));
    }

    #[test]
    fn test_script_is_made_absolute() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("job.py");
        std::fs::write(&file, "pass\n").unwrap();
        let resolved = validate_target(&NativeRuntime::new(), &file).unwrap();
        assert!(resolved.is_absolute());
        assert_eq!(resolved, file.canonicalize().unwrap());
    }
}
