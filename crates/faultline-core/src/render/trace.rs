/*
 * render/trace.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Stack trace renderers
 */

//! Stack trace renderers: `trace`, `inner` and their `+locals` variants.

use super::RenderContext;
use super::locals::locals_lines;
use super::pointer::{full_caret, gutter_lines, span_caret};
use crate::attribution::Attribution;
use crate::frame::Frame;
use crate::report::{Block, ReportSection, Span, Tone};

pub(crate) const NO_LOCALS: &str = "NO LOCALS WERE FOUND IN THIS TRACE";

#[derive(Debug, Clone, Copy)]
struct TraceOptions {
    target_only: bool,
    with_locals: bool,
}

pub(super) fn render_trace(ctx: &RenderContext<'_>) -> ReportSection {
    render_frames(
        ctx,
        TraceOptions {
            target_only: false,
            with_locals: false,
        },
    )
}

pub(super) fn render_trace_locals(ctx: &RenderContext<'_>) -> ReportSection {
    render_frames(
        ctx,
        TraceOptions {
            target_only: false,
            with_locals: true,
        },
    )
}

pub(super) fn render_inner(ctx: &RenderContext<'_>) -> ReportSection {
    render_frames(
        ctx,
        TraceOptions {
            target_only: true,
            with_locals: false,
        },
    )
}

pub(super) fn render_inner_locals(ctx: &RenderContext<'_>) -> ReportSection {
    render_frames(
        ctx,
        TraceOptions {
            target_only: true,
            with_locals: true,
        },
    )
}

fn render_frames(ctx: &RenderContext<'_>, options: TraceOptions) -> ReportSection {
    let mut section = ReportSection::new();
    section.push(Block::field("Exception Type", ctx.fault.kind.clone()));
    section.push(Block::field("Exception Message", ctx.fault.message.clone()));

    // Panels are numbered by position in the full stack, so `inner` keeps
    // the same numbers `trace` would show.
    for (index, frame) in ctx.fault.frames.iter().enumerate() {
        let attribution = ctx.attributor.attribute(frame);
        if options.target_only && attribution == Attribution::Foreign {
            continue;
        }
        section.push(Block::Blank);
        section.push(frame_panel(ctx, index + 1, frame, attribution, options));
    }

    section
}

fn frame_panel(
    ctx: &RenderContext<'_>,
    position: usize,
    frame: &Frame,
    attribution: Attribution,
    options: TraceOptions,
) -> Block {
    let (path, caret) = match attribution {
        Attribution::Target => (ctx.session.target_path.as_path(), span_caret(frame)),
        Attribution::Foreign => (frame.source_path.as_path(), full_caret(frame)),
    };

    let mut body = vec![
        Block::Line(vec![
            Span::new(Tone::Label, "File:"),
            Span::plain(" "),
            Span::new(Tone::Value, path.display().to_string()),
        ]),
        Block::Blank,
    ];
    body.extend(gutter_lines(
        ctx.attributor.display_line(frame),
        frame.code(),
        caret,
    ));

    if options.with_locals {
        body.push(Block::Blank);
        match attribution {
            Attribution::Target if !frame.locals.is_empty() => {
                body.push(Block::panel("locals", Tone::Locals, locals_lines(frame)));
            }
            _ => body.push(Block::text(Tone::Notice, NO_LOCALS)),
        }
    }

    Block::panel(
        format!("Trace[{}] - {}", position, frame.function_name),
        Tone::Frame,
        body,
    )
}
