/*
 * attribution.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Frame attribution
 */

//! Frame attribution: target script vs everything else.

use std::path::PathBuf;

use crate::frame::Frame;

/// Where a frame came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribution {
    /// The instrumented copy of the user's script.
    Target,
    /// Standard library, third-party packages, or harness internals.
    Foreign,
}

/// Classifies frames against the instrumented copy of the target script.
///
/// Only target frames get their line numbers corrected by the harness header
/// length and only target frames expose locals to the user.
///
/// Lines the harness kept above its header (a coding cookie, `__future__`
/// imports) are not shifted.
#[derive(Debug, Clone)]
pub struct FrameAttributor {
    instrumented_path: PathBuf,
    header_lines: usize,
    hoisted_lines: usize,
}

impl FrameAttributor {
    pub fn new(instrumented_path: impl Into<PathBuf>, header_lines: usize) -> Self {
        Self {
            instrumented_path: instrumented_path.into(),
            header_lines,
            hoisted_lines: 0,
        }
    }

    /// The first `lines` lines of the mirror sit above the header.
    pub fn with_hoisted_lines(mut self, lines: usize) -> Self {
        self.hoisted_lines = lines;
        self
    }

    pub fn attribute(&self, frame: &Frame) -> Attribution {
        if frame.is_from(&self.instrumented_path) {
            Attribution::Target
        } else {
            Attribution::Foreign
        }
    }

    pub fn is_target(&self, frame: &Frame) -> bool {
        self.attribute(frame) == Attribution::Target
    }

    /// Line number as the user should see it.
    pub fn display_line(&self, frame: &Frame) -> usize {
        match self.attribute(frame) {
            Attribution::Target if frame.line_number <= self.hoisted_lines => frame.line_number,
            Attribution::Target => frame.line_number.saturating_sub(self.header_lines),
            Attribution::Foreign => frame.line_number,
        }
    }

    /// Target frames, outermost first.
    pub fn target_frames<'a>(&'a self, frames: &'a [Frame]) -> impl Iterator<Item = &'a Frame> {
        frames.iter().filter(move |frame| self.is_target(frame))
    }

    /// The target frame closest to the point of failure.
    pub fn innermost_target<'a>(&self, frames: &'a [Frame]) -> Option<&'a Frame> {
        frames.iter().rev().find(|frame| self.is_target(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attributor() -> FrameAttributor {
        FrameAttributor::new("/state/mirror.py", 3)
    }

    #[test]
    fn test_attribute_by_path() {
        let attr = attributor();
        let target = Frame::new("/state/mirror.py", "main", 10, "main()");
        let foreign = Frame::new("/usr/lib/python3.12/json/__init__.py", "loads", 346, "x");

        assert_eq!(attr.attribute(&target), Attribution::Target);
        assert_eq!(attr.attribute(&foreign), Attribution::Foreign);
    }

    #[test]
    fn test_display_line_offsets_only_target_frames() {
        let attr = attributor();
        let target = Frame::new("/state/mirror.py", "main", 10, "main()");
        let foreign = Frame::new("/usr/lib/python3.12/json/decoder.py", "decode", 10, "x");

        assert_eq!(attr.display_line(&target), 7);
        assert_eq!(attr.display_line(&foreign), 10);
    }

    #[test]
    fn test_hoisted_lines_keep_their_numbers() {
        let attr = attributor().with_hoisted_lines(2);
        let hoisted = Frame::new("/state/mirror.py", "<module>", 2, "from __future__ import annotations");
        let body = Frame::new("/state/mirror.py", "<module>", 6, "raise ValueError('boom')");

        assert_eq!(attr.display_line(&hoisted), 2);
        assert_eq!(attr.display_line(&body), 3);
    }

    #[test]
    fn test_innermost_target_skips_foreign_tail() {
        let attr = attributor();
        let frames = vec![
            Frame::new("/state/mirror.py", "<module>", 20, "run()"),
            Frame::new("/state/mirror.py", "run", 8, "json.loads(s)"),
            Frame::new("/usr/lib/python3.12/json/__init__.py", "loads", 346, "return x"),
        ];

        let inner = attr.innermost_target(&frames).unwrap();
        assert_eq!(inner.function_name, "run");
        assert_eq!(attr.target_frames(&frames).count(), 2);
    }

    #[test]
    fn test_no_target_frames() {
        let attr = attributor();
        let frames = vec![Frame::new("/elsewhere.py", "f", 1, "x")];
        assert!(attr.innermost_target(&frames).is_none());
    }
}
