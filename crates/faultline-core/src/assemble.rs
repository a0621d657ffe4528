/*
 * assemble.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Report assembly and delivery.
 */

//! Report assembly.
//!
//! The assembler walks the recipe body, renders each mode through the
//! renderer table and joins the sections into one `Exception` report. The
//! `search` mode is handled separately: it runs after the body has been
//! delivered, whether or not the body had any content.

use crate::error::Result;
use crate::recipe::Recipe;
use crate::render::{RenderContext, render_section};
use crate::report::{Block, Report, ReportSection, Span, Tone};
use crate::search::SearchCollaborator;
use crate::sink::OutputSink;

pub const ENVELOPE_TITLE: &str = "Exception";
pub const SEARCH_TITLE: &str = "Search Result";
pub const OFFLINE_NOTICE: &str = "No internet connection!";

/// Turns a fault and a recipe into reports on a sink.
pub struct ReportAssembler<'a> {
    search: Option<&'a dyn SearchCollaborator>,
}

impl<'a> ReportAssembler<'a> {
    pub fn new(search: &'a dyn SearchCollaborator) -> Self {
        Self {
            search: Some(search),
        }
    }

    /// An assembler that never performs network I/O. A `search` mode then
    /// yields the offline notice.
    pub fn offline() -> Self {
        Self { search: None }
    }

    /// Join the body sections of `recipe` in order.
    ///
    /// Sections spanning more than one block are set off by a blank
    /// divider; single-line sections stack.
    pub fn body(&self, ctx: &RenderContext<'_>, recipe: &Recipe) -> Vec<Block> {
        let sections: Vec<ReportSection> = recipe
            .body()
            .map(|mode| render_section(mode, ctx))
            .filter(|section| !section.is_empty())
            .collect();

        let mut blocks = Vec::new();
        let mut previous_compact = true;
        for section in sections {
            let compact = section.is_compact();
            if !(compact && previous_compact) {
                blocks.push(Block::Blank);
            }
            blocks.extend(section.into_blocks());
            previous_compact = compact;
        }

        collapse_blanks(blocks)
    }

    /// The `Exception` report, or `None` when the body is empty.
    pub fn assemble(&self, ctx: &RenderContext<'_>, recipe: &Recipe) -> Option<Report> {
        let body = self.body(ctx, recipe);
        if body.is_empty() {
            return None;
        }
        Some(Report::titled(ENVELOPE_TITLE, Tone::Alert, body))
    }

    /// Related questions for the fault message, or the offline notice.
    pub fn search_report(&self, message: &str) -> Report {
        let outcome = match self.search {
            Some(search) => search.search(message),
            None => Err(crate::error::FaultlineError::SearchUnavailable(
                "search disabled".to_string(),
            )),
        };

        match outcome {
            Ok(hits) => {
                let mut body = Vec::new();
                for hit in hits {
                    body.push(Block::text(Tone::Value, hit.title));
                    body.push(Block::text(Tone::Link, hit.link));
                    body.push(Block::Blank);
                }
                body.pop();
                Report::titled(SEARCH_TITLE, Tone::Search, body)
            }
            Err(e) => {
                tracing::warn!("Search failed: {}", e);
                Report::bare(vec![Block::Line(vec![
                    Span::new(Tone::Alert, "Error:"),
                    Span::plain(" "),
                    Span::new(Tone::Notice, OFFLINE_NOTICE),
                ])])
            }
        }
    }

    /// Emit the body report (when non-empty), then the search report when
    /// the recipe asks for one.
    pub fn deliver(
        &self,
        ctx: &RenderContext<'_>,
        recipe: &Recipe,
        sink: &mut dyn OutputSink,
    ) -> Result<()> {
        match self.assemble(ctx, recipe) {
            Some(report) => sink.emit(&report)?,
            None => tracing::debug!("Report body is empty"),
        }

        if recipe.has_search() {
            sink.emit(&self.search_report(&ctx.fault.message))?;
        }
        Ok(())
    }
}

/// Drop leading and trailing blanks and merge runs of blanks.
fn collapse_blanks(blocks: Vec<Block>) -> Vec<Block> {
    let mut out: Vec<Block> = Vec::with_capacity(blocks.len());
    for block in blocks {
        if block.is_blank() && out.last().is_none_or(Block::is_blank) {
            continue;
        }
        out.push(block);
    }
    while out.last().is_some_and(Block::is_blank) {
        out.pop();
    }
    out
}
