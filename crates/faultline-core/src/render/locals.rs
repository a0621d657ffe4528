/*
 * render/locals.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Locals renderer
 */

//! The `locals` renderer: one panel of bindings per target frame.

use super::RenderContext;
use super::trace::NO_LOCALS;
use crate::frame::Frame;
use crate::report::{Block, ReportSection, Span, Tone};

/// `name = value` lines in capture order.
pub(super) fn locals_lines(frame: &Frame) -> Vec<Block> {
    frame
        .locals
        .iter()
        .map(|(name, value)| {
            Block::Line(vec![
                Span::new(Tone::Name, name.clone()),
                Span::plain(" = "),
                Span::new(Tone::Value, value.clone()),
            ])
        })
        .collect()
}

pub(super) fn render_locals(ctx: &RenderContext<'_>) -> ReportSection {
    let mut section = ReportSection::new();
    for frame in ctx.attributor.target_frames(&ctx.fault.frames) {
        let body = if frame.locals.is_empty() {
            vec![Block::text(Tone::Notice, NO_LOCALS)]
        } else {
            locals_lines(frame)
        };
        section.push(Block::panel(
            format!("{} locals", frame.function_name),
            Tone::Locals,
            body,
        ));
    }
    section
}
