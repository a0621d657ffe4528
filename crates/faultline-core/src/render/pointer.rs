/*
 * render/pointer.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Caret pointers
 */

//! Caret pointers and gutter lines under source code.

use crate::frame::Frame;
use crate::report::{Block, Span, Tone};

/// Offset and width of a caret run, relative to the stripped source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caret {
    pub pad: usize,
    pub width: usize,
}

/// Caret over the implicated column span of a target frame.
///
/// Without column data the whole stripped line is marked. A span that
/// continues onto a later line runs to the end of this one.
pub fn span_caret(frame: &Frame) -> Caret {
    let length = frame.code().chars().count();
    match (frame.column_start, frame.column_end) {
        (Some(start), Some(end)) => {
            let pad = start.saturating_sub(frame.indent()).min(length);
            let width = if frame.spans_lines() {
                length.saturating_sub(pad)
            } else {
                end.saturating_sub(start)
            };
            Caret {
                pad,
                width: width.max(1),
            }
        }
        _ => full_caret(frame),
    }
}

/// Caret over the whole stripped line.
pub fn full_caret(frame: &Frame) -> Caret {
    Caret {
        pad: 0,
        width: frame.code().chars().count().max(1),
    }
}

pub fn caret_spans(caret: Caret) -> Vec<Span> {
    vec![
        Span::plain(" ".repeat(caret.pad)),
        Span::new(Tone::Pointer, "^".repeat(caret.width)),
    ]
}

/// `N │ code` followed by `  │ ^^^`.
pub fn gutter_lines(line_number: usize, code: &str, caret: Caret) -> [Block; 2] {
    let gutter = line_number.to_string();
    let blank = " ".repeat(gutter.chars().count());

    let code_line = Block::Line(vec![
        Span::new(Tone::Muted, format!("{} │ ", gutter)),
        Span::new(Tone::Value, code),
    ]);

    let mut pointer = vec![Span::new(Tone::Muted, format!("{} │ ", blank))];
    pointer.extend(caret_spans(caret));

    [code_line, Block::Line(pointer)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_caret_relative_to_stripped_line() {
        let frame = Frame::new("m.py", "f", 7, "    total = 1 / count").with_columns(12, 21);
        assert_eq!(span_caret(&frame), Caret { pad: 8, width: 9 });
    }

    #[test]
    fn test_span_caret_without_columns_is_full_width() {
        let frame = Frame::new("m.py", "f", 7, "    return x");
        assert_eq!(span_caret(&frame), Caret { pad: 0, width: 8 });
    }

    #[test]
    fn test_multi_line_span_runs_to_end_of_line() {
        let frame = Frame::new("m.py", "f", 7, "    call(a,")
            .with_columns(4, 6)
            .with_end_line(9);
        assert_eq!(span_caret(&frame), Caret { pad: 0, width: 7 });
    }

    #[test]
    fn test_empty_span_still_marks_one_column() {
        let frame = Frame::new("m.py", "f", 1, "x").with_columns(0, 0);
        assert_eq!(span_caret(&frame).width, 1);
    }

    #[test]
    fn test_full_caret_for_foreign_frames() {
        let frame = Frame::new("/usr/lib/json.py", "loads", 9, "  return d(s)").with_columns(9, 13);
        assert_eq!(full_caret(&frame), Caret { pad: 0, width: 11 });
    }
}
