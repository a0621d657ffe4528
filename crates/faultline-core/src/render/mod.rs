/*
 * render/mod.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Section renderers and their lookup table.
 */

//! Section renderers.
//!
//! One renderer per [`Mode`]. Each is a plain function from a
//! [`RenderContext`] to a [`ReportSection`]; missing data (no target frame,
//! no column information) degrades to an empty section or a full-width
//! pointer, never to an error.
//!
//! Modes are resolved to renderers through [`RENDERERS`], a static table,
//! so persisted recipes only ever carry identifiers.

mod fields;
mod locals;
pub mod pointer;
mod trace;

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::attribution::FrameAttributor;
use crate::frame::FaultContext;
use crate::recipe::Mode;
use crate::report::ReportSection;
use crate::session::SessionInfo;

/// Inputs shared by every renderer.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub fault: &'a FaultContext,
    pub attributor: &'a FrameAttributor,
    pub session: &'a SessionInfo,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        fault: &'a FaultContext,
        attributor: &'a FrameAttributor,
        session: &'a SessionInfo,
    ) -> Self {
        Self {
            fault,
            attributor,
            session,
        }
    }

    pub fn innermost_target(&self) -> Option<&'a crate::frame::Frame> {
        self.attributor.innermost_target(&self.fault.frames)
    }
}

pub type Renderer = fn(&RenderContext<'_>) -> ReportSection;

/// Body renderers keyed by mode. `search` is absent: it runs after the body.
pub static RENDERERS: Lazy<HashMap<Mode, Renderer>> = Lazy::new(|| {
    let mut table: HashMap<Mode, Renderer> = HashMap::new();
    table.insert(Mode::Type, fields::render_type);
    table.insert(Mode::Message, fields::render_message);
    table.insert(Mode::File, fields::render_file);
    table.insert(Mode::Scope, fields::render_scope);
    table.insert(Mode::Line, fields::render_line);
    table.insert(Mode::Code, fields::render_code);
    table.insert(Mode::Trace, trace::render_trace);
    table.insert(Mode::TraceLocals, trace::render_trace_locals);
    table.insert(Mode::Inner, trace::render_inner);
    table.insert(Mode::InnerLocals, trace::render_inner_locals);
    table.insert(Mode::Locals, locals::render_locals);
    table
});

pub fn renderer_for(mode: Mode) -> Option<Renderer> {
    RENDERERS.get(&mode).copied()
}

/// Render one body section. Modes without a body renderer yield an empty
/// section.
pub fn render_section(mode: Mode, ctx: &RenderContext<'_>) -> ReportSection {
    match renderer_for(mode) {
        Some(render) => render(ctx),
        None => ReportSection::empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_body_mode_has_a_renderer() {
        for mode in Mode::ALL {
            assert_eq!(
                renderer_for(mode).is_some(),
                mode != Mode::Search,
                "mode {}",
                mode
            );
        }
    }

    #[test]
    fn test_search_renders_nothing_in_body() {
        let fault = FaultContext::new("ValueError", "bad", Vec::new());
        let attributor = FrameAttributor::new("/m.py", 3);
        let session = SessionInfo::new("/a.py", Vec::new());
        let ctx = RenderContext::new(&fault, &attributor, &session);

        assert!(render_section(Mode::Search, &ctx).is_empty());
    }
}
