/*
 * native.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * std-backed ScriptRuntime.
 */

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::traits::{
    ChildStdout, CommandOutput, PathKind, RuntimeError, RuntimeResult, ScriptRuntime,
};

/// Runtime with full system access.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeRuntime;

impl NativeRuntime {
    pub fn new() -> Self {
        Self
    }
}

fn command(program: &Path, args: &[&OsStr], env: &[(&str, &OsStr)]) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args);
    for (key, value) in env {
        cmd.env(key, value);
    }
    cmd
}

fn spawn_error(program: &Path, e: std::io::Error) -> RuntimeError {
    RuntimeError::ProcessFailed {
        program: program.display().to_string(),
        message: e.to_string(),
    }
}

impl ScriptRuntime for NativeRuntime {
    fn file_read(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        Ok(fs::read(path)?)
    }

    fn file_write(&self, path: &Path, contents: &[u8]) -> RuntimeResult<()> {
        Ok(fs::write(path, contents)?)
    }

    fn file_remove(&self, path: &Path) -> RuntimeResult<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn dir_create(&self, path: &Path) -> RuntimeResult<()> {
        Ok(fs::create_dir_all(path)?)
    }

    fn path_exists(&self, path: &Path, kind: Option<PathKind>) -> bool {
        match kind {
            None => path.exists(),
            Some(PathKind::File) => path.is_file(),
            Some(PathKind::Directory) => path.is_dir(),
        }
    }

    fn canonicalize(&self, path: &Path) -> RuntimeResult<PathBuf> {
        Ok(fs::canonicalize(path)?)
    }

    fn exec_command(
        &self,
        program: &Path,
        args: &[&OsStr],
        env: &[(&str, &OsStr)],
    ) -> RuntimeResult<CommandOutput> {
        let output = command(program, args, env)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| spawn_error(program, e))?;

        Ok(CommandOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    fn exec_inherit(
        &self,
        program: &Path,
        args: &[&OsStr],
        env: &[(&str, &OsStr)],
        stdout: ChildStdout,
    ) -> RuntimeResult<i32> {
        let mut cmd = command(program, args, env);
        match stdout {
            ChildStdout::Inherit => cmd.stdout(Stdio::inherit()),
            ChildStdout::File(file) => cmd.stdout(Stdio::from(file)),
        };

        let status = cmd.status().map_err(|e| spawn_error(program, e))?;
        tracing::debug!(?status, "Interpreter exited");

        // Terminated by a signal: report a plain failure.
        Ok(status.code().unwrap_or(1))
    }

    fn env_get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.is_empty())
    }

    fn find_binary(&self, name: &str, env_var: &str) -> Option<PathBuf> {
        if let Some(path_str) = self.env_get(env_var) {
            let path = PathBuf::from(path_str);
            if path.is_file() {
                return Some(path);
            }
            tracing::warn!("{} does not point to a file: {}", env_var, path.display());
        }
        which::which(name).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_round_trip_and_remove() {
        let temp = tempfile::tempdir().unwrap();
        let runtime = NativeRuntime::new();
        let path = temp.path().join("nested").join("a.txt");

        runtime.dir_create(path.parent().unwrap()).unwrap();
        runtime.file_write(&path, b"hello").unwrap();
        assert_eq!(runtime.file_read_string(&path).unwrap(), "hello");
        assert!(runtime.is_file(&path));
        assert!(runtime.path_exists(temp.path(), Some(PathKind::Directory)));

        runtime.file_remove(&path).unwrap();
        runtime.file_remove(&path).unwrap();
        assert!(!runtime.path_exists(&path, None));
    }

    #[test]
    fn test_invalid_utf8_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("bin");
        std::fs::write(&path, [0xff, 0xfe]).unwrap();

        assert!(NativeRuntime::new().file_read_string(&path).is_err());
    }

    #[test]
    fn test_missing_program_is_process_failure() {
        let err = NativeRuntime::new()
            .exec_command(Path::new("/nonexistent/faultline-python"), &[], &[])
            .unwrap_err();
        assert!(matches!(err, RuntimeError::ProcessFailed { .. }));
    }
}
