/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Error types for faultline-core
 */

//! Error types for faultline-core

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FaultlineError {
    /// The syntax checker's output did not match any known dialect, or the
    /// location digits could not be extracted from it.
    #[error("Malformed syntax diagnostic: {reason}\n{raw}")]
    MalformedDiagnostic { reason: String, raw: String },

    #[error("No information on the last operation is available.")]
    NoPriorSession,

    #[error("The available information is corrupted: {0}")]
    CorruptSessionState(String),

    #[error("Search service unavailable: {0}")]
    SearchUnavailable(String),

    #[error("Invalid target script: {0}")]
    InvalidTarget(String),

    #[error("Invalid output file: {0}")]
    InvalidOutput(String),

    #[error("Could not decode fault payload: {0}")]
    MalformedFault(String),

    #[error("Configuration error in {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("Session state encoding error: {0}")]
    SessionEncoding(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FaultlineError {
    pub(crate) fn malformed(reason: impl Into<String>, raw: &str) -> Self {
        Self::MalformedDiagnostic {
            reason: reason.into(),
            raw: raw.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FaultlineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_keeps_raw_text() {
        let err = FaultlineError::malformed("no line digits", "Sorry: TabError: oops");
        let text = err.to_string();
        assert!(text.contains("no line digits"));
        assert!(text.contains("Sorry: TabError: oops"));
    }
}
