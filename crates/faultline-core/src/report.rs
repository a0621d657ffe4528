/*
 * report.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Report block model and text layout.
 */

//! Report block model and text layout.
//!
//! Renderers never produce strings directly. They produce [`Block`]s made of
//! toned [`Span`]s, and the layout functions here turn those into text,
//! either plain or with ANSI colour. Keeping the two apart is what lets the
//! same report go to a terminal and to a `.txt` capture file.
//!
//! Panels are drawn with a left rule:
//!
//! ```text
//! ╭─ Trace[1] - main
//! │ File: /home/me/script.py
//! │
//! │ 4 │ total = 1 / count
//! │   │         ^^^^^^^^^
//! ╰─
//! ```

use ariadne::{Color, Fmt};

/// Semantic styling of a span. Mapped to colours only at layout time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    /// Field labels such as `Exception Type ❱`.
    Label,
    /// The value next to a label.
    Value,
    /// Line-number gutters and separators.
    Muted,
    /// Caret markers under source code.
    Pointer,
    /// Local variable names.
    Name,
    /// Warnings and degraded-path notices.
    Notice,
    /// Hyperlinks.
    Link,
    Success,
    /// Panel frames: the report envelope.
    Alert,
    /// Panel frames: per-frame trace panels.
    Frame,
    /// Panel frames: locals panels.
    Locals,
    /// Panel frames: search results.
    Search,
}

impl Tone {
    fn color(self) -> Option<Color> {
        match self {
            Tone::Plain | Tone::Value => None,
            Tone::Label | Tone::Locals => Some(Color::Yellow),
            Tone::Muted => Some(Color::Fixed(244)),
            Tone::Pointer | Tone::Alert => Some(Color::Red),
            Tone::Name => Some(Color::Fixed(125)),
            Tone::Notice => Some(Color::Yellow),
            Tone::Link => Some(Color::Fixed(33)),
            Tone::Success => Some(Color::Green),
            Tone::Frame => Some(Color::Fixed(172)),
            Tone::Search => Some(Color::Fixed(29)),
        }
    }

    fn paint(self, text: &str, color: bool) -> String {
        match (color, self.color()) {
            (true, Some(c)) => format!("{}", text.fg(c)),
            _ => text.to_string(),
        }
    }
}

/// A run of text with one tone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub tone: Tone,
}

impl Span {
    pub fn new(tone: Tone, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(Tone::Plain, text)
    }
}

/// One renderable unit of a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Line(Vec<Span>),
    /// Blank divider line.
    Blank,
    Panel {
        title: String,
        tone: Tone,
        body: Vec<Block>,
    },
}

impl Block {
    pub fn text(tone: Tone, text: impl Into<String>) -> Self {
        Block::Line(vec![Span::new(tone, text)])
    }

    /// `Label ❱ value` line.
    pub fn field(label: &str, value: impl Into<String>) -> Self {
        Block::Line(vec![
            Span::new(Tone::Label, format!("{} ❱", label)),
            Span::plain(" "),
            Span::new(Tone::Value, value),
        ])
    }

    pub fn panel(title: impl Into<String>, tone: Tone, body: Vec<Block>) -> Self {
        Block::Panel {
            title: title.into(),
            tone,
            body,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Block::Blank)
    }
}

/// The output of one section renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportSection {
    blocks: Vec<Block>,
}

impl ReportSection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(block: Block) -> Self {
        Self {
            blocks: vec![block],
        }
    }

    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(Block::is_blank)
    }

    /// A single non-panel line (e.g. `Exception Type ❱ ...`).
    ///
    /// Adjacent compact sections stack without a divider.
    pub fn is_compact(&self) -> bool {
        matches!(self.blocks.as_slice(), [Block::Line(_)])
    }
}

/// A titled report handed to an output sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Envelope title; `None` emits the body without a frame.
    pub title: Option<String>,
    pub tone: Tone,
    pub body: Vec<Block>,
}

impl Report {
    pub fn titled(title: impl Into<String>, tone: Tone, body: Vec<Block>) -> Self {
        Self {
            title: Some(title.into()),
            tone,
            body,
        }
    }

    pub fn bare(body: Vec<Block>) -> Self {
        Self {
            title: None,
            tone: Tone::Plain,
            body,
        }
    }

    /// Full text including the envelope.
    pub fn to_text(&self, color: bool) -> String {
        let mut lines = Vec::new();
        match &self.title {
            Some(title) => layout_panel(title, self.tone, &self.body, "", color, &mut lines),
            None => layout_blocks(&self.body, "", color, &mut lines),
        }
        join_lines(lines)
    }

    /// Body text only, without the envelope.
    pub fn body_text(&self, color: bool) -> String {
        let mut lines = Vec::new();
        layout_blocks(&self.body, "", color, &mut lines);
        join_lines(lines)
    }
}

fn join_lines(lines: Vec<String>) -> String {
    let mut text = lines.join("\n");
    if !text.is_empty() {
        text.push('\n');
    }
    text
}

fn layout_blocks(blocks: &[Block], prefix: &str, color: bool, out: &mut Vec<String>) {
    for block in blocks {
        match block {
            Block::Line(spans) => {
                let text: String = spans
                    .iter()
                    .map(|span| span.tone.paint(&span.text, color))
                    .collect();
                out.push(format!("{}{}", prefix, text).trim_end().to_string());
            }
            Block::Blank => out.push(prefix.trim_end().to_string()),
            Block::Panel { title, tone, body } => {
                layout_panel(title, *tone, body, prefix, color, out);
            }
        }
    }
}

fn layout_panel(
    title: &str,
    tone: Tone,
    body: &[Block],
    prefix: &str,
    color: bool,
    out: &mut Vec<String>,
) {
    out.push(format!(
        "{}{} {}",
        prefix,
        tone.paint("╭─", color),
        title
    ));
    let inner = format!("{}{} ", prefix, tone.paint("│", color));
    layout_blocks(body, &inner, color, out);
    out.push(format!("{}{}", prefix, tone.paint("╰─", color)));
}
