/*
 * traits.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Defines the ScriptRuntime trait and supporting types.
 *
 * The harness and the syntax checker only touch the system through this
 * trait, so both can be exercised against a fake in tests.
 */

use std::ffi::OsStr;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use faultline_core::FaultlineError;
use thiserror::Error;

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur during runtime operations
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No interpreter could be found.
    #[error("Could not find {0}")]
    BinaryNotFound(String),

    /// Process could not be started.
    #[error("Failed to run {program}: {message}")]
    ProcessFailed { program: String, message: String },

    /// Reading the fault or reporting on it failed.
    #[error(transparent)]
    Fault(#[from] FaultlineError),
}

/// Type of filesystem path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    File,
    Directory,
}

/// Output from a command execution
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code (0 = success)
    pub code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// Get stderr as a string (lossy UTF-8 conversion)
    pub fn stderr_string(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Where a child's standard output goes.
#[derive(Debug)]
pub enum ChildStdout {
    Inherit,
    File(File),
}

/// Low-level system operations used by the harness.
pub trait ScriptRuntime {
    // ═══════════════════════════════════════════════════════════════════════
    // FILE OPERATIONS
    // ═══════════════════════════════════════════════════════════════════════

    /// Read entire file contents as bytes.
    fn file_read(&self, path: &Path) -> RuntimeResult<Vec<u8>>;

    /// Read file as string with UTF-8 encoding.
    fn file_read_string(&self, path: &Path) -> RuntimeResult<String> {
        let bytes = self.file_read(path)?;
        String::from_utf8(bytes).map_err(|e| {
            RuntimeError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid UTF-8 in file: {}", e),
            ))
        })
    }

    /// Write bytes to file (creates or overwrites).
    fn file_write(&self, path: &Path, contents: &[u8]) -> RuntimeResult<()>;

    /// Delete a file. Missing files are not an error.
    fn file_remove(&self, path: &Path) -> RuntimeResult<()>;

    /// Create directory and its parents.
    fn dir_create(&self, path: &Path) -> RuntimeResult<()>;

    /// Check if path exists, optionally filtering by type.
    fn path_exists(&self, path: &Path, kind: Option<PathKind>) -> bool;

    fn is_file(&self, path: &Path) -> bool {
        self.path_exists(path, Some(PathKind::File))
    }

    /// Canonicalize a path (resolve symlinks, make absolute).
    fn canonicalize(&self, path: &Path) -> RuntimeResult<PathBuf>;

    // ═══════════════════════════════════════════════════════════════════════
    // PROCESS EXECUTION
    // ═══════════════════════════════════════════════════════════════════════

    /// Execute a command with full output capture.
    fn exec_command(
        &self,
        program: &Path,
        args: &[&OsStr],
        env: &[(&str, &OsStr)],
    ) -> RuntimeResult<CommandOutput>;

    /// Execute a command with the terminal's stdin and stderr, returning its
    /// exit code.
    fn exec_inherit(
        &self,
        program: &Path,
        args: &[&OsStr],
        env: &[(&str, &OsStr)],
        stdout: ChildStdout,
    ) -> RuntimeResult<i32>;

    // ═══════════════════════════════════════════════════════════════════════
    // BINARY DISCOVERY
    // ═══════════════════════════════════════════════════════════════════════

    /// Get single environment variable.
    fn env_get(&self, name: &str) -> Option<String>;

    /// Find a binary by checking an environment variable first, then PATH.
    fn find_binary(&self, name: &str, env_var: &str) -> Option<PathBuf>;
}
