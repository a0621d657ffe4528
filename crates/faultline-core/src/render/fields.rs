/*
 * render/fields.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Single-field renderers
 */

//! Single-field renderers: type, message, file, scope, line and code.

use super::RenderContext;
use super::pointer::{caret_spans, span_caret};
use crate::report::{Block, ReportSection, Tone};

pub(super) fn render_type(ctx: &RenderContext<'_>) -> ReportSection {
    ReportSection::single(Block::field("Exception Type", ctx.fault.kind.clone()))
}

pub(super) fn render_message(ctx: &RenderContext<'_>) -> ReportSection {
    ReportSection::single(Block::field("Exception Message", ctx.fault.message.clone()))
}

pub(super) fn render_file(ctx: &RenderContext<'_>) -> ReportSection {
    ReportSection::single(Block::field(
        "File",
        ctx.session.target_path.display().to_string(),
    ))
}

pub(super) fn render_scope(ctx: &RenderContext<'_>) -> ReportSection {
    match ctx.innermost_target() {
        Some(frame) => ReportSection::single(Block::field("Scope", frame.function_name.clone())),
        None => ReportSection::empty(),
    }
}

pub(super) fn render_line(ctx: &RenderContext<'_>) -> ReportSection {
    match ctx.innermost_target() {
        Some(frame) => ReportSection::single(Block::field(
            "Line",
            ctx.attributor.display_line(frame).to_string(),
        )),
        None => ReportSection::empty(),
    }
}

pub(super) fn render_code(ctx: &RenderContext<'_>) -> ReportSection {
    let Some(frame) = ctx.innermost_target() else {
        return ReportSection::empty();
    };

    let mut section = ReportSection::new();
    section.push(Block::text(Tone::Value, frame.code()));
    section.push(Block::Line(caret_spans(span_caret(frame))));
    section
}
