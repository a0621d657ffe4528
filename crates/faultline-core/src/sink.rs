/*
 * sink.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Output sinks
 */

//! Output sinks for finished reports.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{FaultlineError, Result};
use crate::report::Report;

/// Destination of rendered reports.
pub trait OutputSink {
    fn emit(&mut self, report: &Report) -> Result<()>;
}

/// Writes to standard output, optionally with ANSI colour.
#[derive(Debug, Clone, Copy)]
pub struct TerminalSink {
    color: bool,
}

impl TerminalSink {
    pub fn new(color: bool) -> Self {
        Self { color }
    }
}

impl OutputSink for TerminalSink {
    fn emit(&mut self, report: &Report) -> Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(report.to_text(self.color).as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}

/// Plain-text capture file.
///
/// The file is created when the sink is, so the script's own output can
/// be sent to it (see [`TextFileSink::share_handle`]) before any report
/// is appended.
#[derive(Debug)]
pub struct TextFileSink {
    file: File,
}

impl TextFileSink {
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        validate_output_path(&path)?;

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => already_exists(&path),
                _ => FaultlineError::Io(e),
            })?;

        tracing::info!("Writing output to {}", path.display());
        Ok(Self { file })
    }

    /// Another handle on the same open file, sharing its write position.
    pub fn share_handle(&self) -> Result<File> {
        Ok(self.file.try_clone()?)
    }
}

impl OutputSink for TextFileSink {
    fn emit(&mut self, report: &Report) -> Result<()> {
        self.file.write_all(report.to_text(false).as_bytes())?;
        self.file.flush()?;
        Ok(())
    }
}

/// Output files must be new `.txt` files.
pub fn validate_output_path(path: &Path) -> Result<()> {
    if path.is_dir() || path.extension().is_none_or(|ext| ext != "txt") {
        return Err(FaultlineError::InvalidOutput(format!(
            "{} must be the path of a file with a .txt suffix",
            path.display()
        )));
    }
    if path.exists() {
        return Err(already_exists(path));
    }
    Ok(())
}

fn already_exists(path: &Path) -> FaultlineError {
    FaultlineError::InvalidOutput(format!("{} already exists", path.display()))
}

/// Keeps reports in memory.
#[derive(Debug, Default)]
pub struct CaptureSink {
    reports: Vec<Report>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    /// Plain text of everything emitted so far.
    pub fn text(&self) -> String {
        self.reports.iter().map(|r| r.to_text(false)).collect()
    }
}

impl OutputSink for CaptureSink {
    fn emit(&mut self, report: &Report) -> Result<()> {
        self.reports.push(report.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{Block, Tone};

    fn report() -> Report {
        Report::titled(
            "Exception",
            Tone::Alert,
            vec![Block::field("Exception Type", "ValueError")],
        )
    }

    #[test]
    fn test_output_path_must_be_txt() {
        let temp = tempfile::tempdir().unwrap();

        let err = validate_output_path(&temp.path().join("out.log")).unwrap_err();
        assert!(matches!(err, FaultlineError::InvalidOutput(_)));

        let err = validate_output_path(&temp.path().join("out")).unwrap_err();
        assert!(matches!(err, FaultlineError::InvalidOutput(_)));

        assert!(validate_output_path(&temp.path().join("out.txt")).is_ok());
    }

    #[test]
    fn test_output_path_must_not_exist() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("out.txt");
        std::fs::write(&path, "keep me").unwrap();

        let err = TextFileSink::create(&path).unwrap_err();
        assert!(matches!(err, FaultlineError::InvalidOutput(_)));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep me");
    }

    #[test]
    fn test_directory_named_txt_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("dir.txt");
        std::fs::create_dir(&dir).unwrap();

        assert!(validate_output_path(&dir).is_err());
    }

    #[test]
    fn test_file_sink_appends_after_shared_output() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("out.txt");

        let mut sink = TextFileSink::create(&path).unwrap();
        let mut script_stdout = sink.share_handle().unwrap();
        script_stdout.write_all(b"hello from the script\n").unwrap();
        drop(script_stdout);

        sink.emit(&report()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("hello from the script\n╭─ Exception\n"));
        assert!(!text.contains('\u{1b}'));
    }

    #[test]
    fn test_capture_sink() {
        let mut sink = CaptureSink::new();
        sink.emit(&report()).unwrap();
        assert_eq!(sink.reports().len(), 1);
        assert_eq!(
            sink.text(),
            "╭─ Exception\n│ Exception Type ❱ ValueError\n╰─\n"
        );
    }
}
