/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Fault report pipeline for faultline
 */

//! Fault report pipeline for faultline
//!
//! This crate turns one uncaught fault in a Python script into a structured
//! report. It knows nothing about processes or interpreters; the harness in
//! `faultline-runtime` hands it a decoded [`FaultContext`].
//!
//! # Architecture
//!
//! - [`Recipe`] - Ordered, conflict-resolved list of report modes
//! - [`FrameAttributor`] - Separates frames of the user's script from everything else
//! - [`render`] - One renderer per mode, looked up through a static table
//! - [`ReportAssembler`] - Joins sections into a report and hands it to an [`OutputSink`]
//! - [`SessionStore`] - Persisted state for replaying the last run
//! - [`SyntaxNormalizer`] - Reads the syntax checker's diagnostic dialects
//!
//! # Example
//!
//! ```ignore
//! use faultline_core::{
//!     FaultContext, FrameAttributor, ModeFlags, Recipe, RenderContext, ReportAssembler,
//!     SessionInfo, TerminalSink,
//! };
//!
//! let recipe = Recipe::from_flags(&ModeFlags { trace: true, locals: true, ..Default::default() });
//! let fault = FaultContext::from_payload(&payload)?;
//! let attributor = FrameAttributor::new(&mirror_path, 3);
//! let session = SessionInfo::new(&script, args);
//!
//! let ctx = RenderContext::new(&fault, &attributor, &session);
//! ReportAssembler::offline().deliver(&ctx, &recipe, &mut TerminalSink::new(true))?;
//! ```

pub mod assemble;
pub mod attribution;
pub mod config;
pub mod error;
pub mod frame;
pub mod recipe;
pub mod render;
pub mod report;
pub mod search;
pub mod session;
pub mod sink;
pub mod syntax;

// Re-export commonly used types
pub use assemble::ReportAssembler;
pub use attribution::{Attribution, FrameAttributor};
pub use config::{ColorChoice, Config, SearchConfig};
pub use error::{FaultlineError, Result};
pub use frame::{FaultContext, Frame};
pub use recipe::{Mode, ModeFlags, Recipe};
pub use render::RenderContext;
pub use report::{Block, Report, ReportSection, Span, Tone};
pub use search::{SearchCollaborator, SearchHit, StackExchangeSearch};
pub use session::{
    FileSessionStore, MemorySessionStore, ReplayPlan, SessionInfo, SessionStore, plan_replay,
};
pub use sink::{CaptureSink, OutputSink, TerminalSink, TextFileSink, validate_output_path};
pub use syntax::{Pointer, SyntaxCheck, SyntaxDiagnostic, SyntaxNormalizer};
