/*
 * recipe.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Report recipes: which sections a report contains and in what order.
 */

//! Report recipes.
//!
//! A [`Recipe`] is the resolved, ordered list of report [`Mode`]s for one
//! invocation. It is built from the user's flags by [`Recipe::from_flags`],
//! persisted with the session, and read back unchanged on replay.
//!
//! # Resolution rules
//!
//! - `trace` becomes `trace+locals` when `locals` is also requested
//!   (likewise `inner` / `inner+locals`).
//! - Trace-family entries are exclusive of the per-field modes: when any is
//!   requested, the field modes are dropped.
//! - With nothing requested the body defaults to `inner+locals`.
//! - `search` always comes last.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One kind of report section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    #[serde(rename = "type")]
    Type,
    #[serde(rename = "message")]
    Message,
    #[serde(rename = "file")]
    File,
    #[serde(rename = "scope")]
    Scope,
    #[serde(rename = "line")]
    Line,
    #[serde(rename = "code")]
    Code,
    #[serde(rename = "trace")]
    Trace,
    #[serde(rename = "trace+locals")]
    TraceLocals,
    #[serde(rename = "inner")]
    Inner,
    #[serde(rename = "inner+locals")]
    InnerLocals,
    #[serde(rename = "locals")]
    Locals,
    #[serde(rename = "search")]
    Search,
}

impl Mode {
    pub const ALL: [Mode; 12] = [
        Mode::Type,
        Mode::Message,
        Mode::File,
        Mode::Scope,
        Mode::Line,
        Mode::Code,
        Mode::Trace,
        Mode::TraceLocals,
        Mode::Inner,
        Mode::InnerLocals,
        Mode::Locals,
        Mode::Search,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Type => "type",
            Mode::Message => "message",
            Mode::File => "file",
            Mode::Scope => "scope",
            Mode::Line => "line",
            Mode::Code => "code",
            Mode::Trace => "trace",
            Mode::TraceLocals => "trace+locals",
            Mode::Inner => "inner",
            Mode::InnerLocals => "inner+locals",
            Mode::Locals => "locals",
            Mode::Search => "search",
        }
    }

    fn is_trace_family(self) -> bool {
        matches!(self, Mode::Trace | Mode::TraceLocals)
    }

    fn is_inner_family(self) -> bool {
        matches!(self, Mode::Inner | Mode::InnerLocals)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| format!("unknown report mode '{}'", s))
    }
}

/// The user's requested modes, one flag each.
///
/// `locals` and `search` act as modifiers: `locals` upgrades the trace
/// family and `search` is appended after the body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeFlags {
    pub r#type: bool,
    pub message: bool,
    pub file: bool,
    pub scope: bool,
    pub line: bool,
    pub code: bool,
    pub trace: bool,
    pub inner: bool,
    pub locals: bool,
    pub search: bool,
}

impl ModeFlags {
    /// Requested modes in declared display order.
    pub fn requested(&self) -> Vec<Mode> {
        [
            (self.r#type, Mode::Type),
            (self.message, Mode::Message),
            (self.file, Mode::File),
            (self.scope, Mode::Scope),
            (self.line, Mode::Line),
            (self.code, Mode::Code),
            (self.trace, Mode::Trace),
            (self.inner, Mode::Inner),
            (self.locals, Mode::Locals),
            (self.search, Mode::Search),
        ]
        .into_iter()
        .filter_map(|(requested, mode)| requested.then_some(mode))
        .collect()
    }
}

/// Ordered, conflict-free list of report modes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Mode>", into = "Vec<Mode>")]
pub struct Recipe {
    modes: Vec<Mode>,
}

impl Recipe {
    /// Resolve user flags into a recipe. Never fails and never returns an
    /// empty recipe.
    pub fn from_flags(flags: &ModeFlags) -> Self {
        let requested = flags.requested();
        let wants_locals = requested.contains(&Mode::Locals);

        let mut prioritized: Vec<Mode> = Vec::new();
        let mut fields: Vec<Mode> = Vec::new();

        for mode in &requested {
            match mode {
                Mode::Trace => {
                    let resolved = if wants_locals {
                        Mode::TraceLocals
                    } else {
                        Mode::Trace
                    };
                    if !prioritized.contains(&resolved) {
                        prioritized.push(resolved);
                    }
                }
                Mode::Inner => {
                    let resolved = if wants_locals {
                        Mode::InnerLocals
                    } else {
                        Mode::Inner
                    };
                    if !prioritized.contains(&resolved) {
                        prioritized.push(resolved);
                    }
                }
                Mode::Search => {}
                other => fields.push(*other),
            }
        }

        let mut modes = if prioritized.is_empty() {
            fields
        } else {
            prioritized
        };

        if modes.is_empty() {
            modes.push(Mode::InnerLocals);
        }

        if flags.search {
            modes.push(Mode::Search);
        }

        tracing::debug!(recipe = ?modes, "Resolved report recipe");
        Self { modes }
    }

    /// Build a recipe from an explicit list, checking its invariants.
    pub fn from_modes(modes: Vec<Mode>) -> Result<Self, String> {
        if modes.is_empty() {
            return Err("recipe is empty".to_string());
        }

        for (index, mode) in modes.iter().enumerate() {
            if modes[..index].contains(mode) {
                return Err(format!("mode '{}' appears more than once", mode));
            }
        }

        if modes.iter().filter(|m| m.is_trace_family()).count() > 1 {
            return Err("both 'trace' and 'trace+locals' requested".to_string());
        }
        if modes.iter().filter(|m| m.is_inner_family()).count() > 1 {
            return Err("both 'inner' and 'inner+locals' requested".to_string());
        }

        if let Some(position) = modes.iter().position(|m| *m == Mode::Search) {
            if position != modes.len() - 1 {
                return Err("'search' must be the last mode".to_string());
            }
        }

        Ok(Self { modes })
    }

    pub fn modes(&self) -> &[Mode] {
        &self.modes
    }

    /// Modes that contribute to the report body, in order.
    pub fn body(&self) -> impl Iterator<Item = Mode> + '_ {
        self.modes.iter().copied().filter(|m| *m != Mode::Search)
    }

    pub fn has_search(&self) -> bool {
        self.modes.contains(&Mode::Search)
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }
}

impl Default for Recipe {
    fn default() -> Self {
        Self::from_flags(&ModeFlags::default())
    }
}

impl TryFrom<Vec<Mode>> for Recipe {
    type Error = String;

    fn try_from(modes: Vec<Mode>) -> Result<Self, Self::Error> {
        Self::from_modes(modes)
    }
}

impl From<Recipe> for Vec<Mode> {
    fn from(recipe: Recipe) -> Self {
        recipe.modes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags() -> ModeFlags {
        ModeFlags::default()
    }

    #[test]
    fn test_no_flags_defaults_to_inner_with_locals() {
        let recipe = Recipe::from_flags(&flags());
        assert_eq!(recipe.modes(), &[Mode::InnerLocals]);
    }

    #[test]
    fn test_trace_with_locals_collapses() {
        let recipe = Recipe::from_flags(&ModeFlags {
            trace: true,
            locals: true,
            ..flags()
        });
        assert_eq!(recipe.modes(), &[Mode::TraceLocals]);
    }

    #[test]
    fn test_inner_with_locals_collapses() {
        let recipe = Recipe::from_flags(&ModeFlags {
            inner: true,
            locals: true,
            ..flags()
        });
        assert_eq!(recipe.modes(), &[Mode::InnerLocals]);
    }

    #[test]
    fn test_trace_and_inner_coexist() {
        let recipe = Recipe::from_flags(&ModeFlags {
            trace: true,
            inner: true,
            ..flags()
        });
        assert_eq!(recipe.modes(), &[Mode::Trace, Mode::Inner]);
    }

    #[test]
    fn test_trace_family_overrides_field_modes() {
        let recipe = Recipe::from_flags(&ModeFlags {
            r#type: true,
            message: true,
            code: true,
            trace: true,
            ..flags()
        });
        assert_eq!(recipe.modes(), &[Mode::Trace]);
    }

    #[test]
    fn test_field_modes_keep_declared_order() {
        let recipe = Recipe::from_flags(&ModeFlags {
            code: true,
            r#type: true,
            line: true,
            locals: true,
            ..flags()
        });
        assert_eq!(
            recipe.modes(),
            &[Mode::Type, Mode::Line, Mode::Code, Mode::Locals]
        );
    }

    #[test]
    fn test_search_is_always_last() {
        let combos = [
            ModeFlags {
                search: true,
                ..flags()
            },
            ModeFlags {
                search: true,
                trace: true,
                locals: true,
                ..flags()
            },
            ModeFlags {
                search: true,
                r#type: true,
                file: true,
                ..flags()
            },
        ];

        for combo in combos {
            let recipe = Recipe::from_flags(&combo);
            assert_eq!(recipe.modes().last(), Some(&Mode::Search));
            assert!(recipe.body().all(|m| m != Mode::Search));
        }
    }

    #[test]
    fn test_search_alone_keeps_default_body() {
        let recipe = Recipe::from_flags(&ModeFlags {
            search: true,
            ..flags()
        });
        assert_eq!(recipe.modes(), &[Mode::InnerLocals, Mode::Search]);
    }

    #[test]
    fn test_every_flag_combination_satisfies_invariants() {
        for bits in 0u16..(1 << 10) {
            let bit = |n: u16| bits & (1 << n) != 0;
            let combo = ModeFlags {
                r#type: bit(0),
                message: bit(1),
                file: bit(2),
                scope: bit(3),
                line: bit(4),
                code: bit(5),
                trace: bit(6),
                inner: bit(7),
                locals: bit(8),
                search: bit(9),
            };
            let recipe = Recipe::from_flags(&combo);
            assert!(
                Recipe::from_modes(recipe.modes().to_vec()).is_ok(),
                "invalid recipe {:?} for {:?}",
                recipe,
                combo
            );
            if combo.trace && combo.locals {
                assert!(recipe.modes().contains(&Mode::TraceLocals));
                assert!(!recipe.modes().contains(&Mode::Trace));
                assert!(!recipe.modes().contains(&Mode::Locals));
            }
        }
    }

    #[test]
    fn test_from_modes_rejects_conflicts() {
        assert!(Recipe::from_modes(vec![]).is_err());
        assert!(Recipe::from_modes(vec![Mode::Trace, Mode::TraceLocals]).is_err());
        assert!(Recipe::from_modes(vec![Mode::Inner, Mode::InnerLocals]).is_err());
        assert!(Recipe::from_modes(vec![Mode::Search, Mode::Type]).is_err());
        assert!(Recipe::from_modes(vec![Mode::Type, Mode::Type]).is_err());
        assert!(Recipe::from_modes(vec![Mode::Type, Mode::Search]).is_ok());
    }

    #[test]
    fn test_serialized_as_identifiers() {
        let recipe = Recipe::from_flags(&ModeFlags {
            trace: true,
            locals: true,
            search: true,
            ..flags()
        });
        let json = serde_json::to_string(&recipe).unwrap();
        assert_eq!(json, r#"["trace+locals","search"]"#);

        let back: Recipe = serde_json::from_str(&json).unwrap();
        assert_eq!(back, recipe);
    }

    #[test]
    fn test_invalid_serialized_recipe_is_rejected() {
        let result: Result<Recipe, _> = serde_json::from_str(r#"["search","type"]"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("inner+locals".parse::<Mode>(), Ok(Mode::InnerLocals));
        assert!("everything".parse::<Mode>().is_err());
    }
}
