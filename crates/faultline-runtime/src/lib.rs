/*
 * faultline-runtime
 * Copyright (c) 2025 Posit, PBC
 *
 * System side of faultline: files, processes and the Python harness.
 *
 * - ScriptRuntime: trait over the few system operations the harness needs
 * - NativeRuntime: std-backed implementation
 * - Instrumentation: mirror file, hook module and fault collection
 * - SyntaxChecker: py_compile pass ahead of a run
 */

mod harness;
mod native;
mod syntax_check;
mod traits;

pub use harness::{
    FAULT_FILE_ENV, FaultHandler, HEADER_LINES, HarnessInfo, Instrumentation, RunOutcome,
    mirror_header,
};
pub use native::NativeRuntime;
pub use syntax_check::SyntaxChecker;
pub use traits::{
    ChildStdout, CommandOutput, PathKind, RuntimeError, RuntimeResult, ScriptRuntime,
};

/// Interpreter names tried on `PATH`, in order.
pub const PYTHON_CANDIDATES: [&str; 2] = ["python3", "python"];

/// Locate a Python interpreter: `FAULTLINE_PYTHON` first, then `PATH`.
pub fn find_python<R: ScriptRuntime + ?Sized>(runtime: &R) -> RuntimeResult<std::path::PathBuf> {
    PYTHON_CANDIDATES
        .iter()
        .find_map(|name| runtime.find_binary(name, faultline_core::config::PYTHON_ENV))
        .ok_or_else(|| RuntimeError::BinaryNotFound("a Python interpreter".to_string()))
}
