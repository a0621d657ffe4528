/*
 * session.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Replay state store
 */

//! Persisted state of the last invocation, used by replay.
//!
//! Two values are stored, each as a whole JSON document:
//!
//! - `session.json`: the target script and its arguments
//! - `recipe.json`: the resolved recipe, as an array of mode identifiers
//!
//! Writes go to a temporary sibling first and are renamed into place, so a
//! reader never sees a half-written file.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FaultlineError, Result};
use crate::recipe::Recipe;

const SESSION_FILE: &str = "session.json";
const RECIPE_FILE: &str = "recipe.json";

/// What was run last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Absolute path of the user's script.
    pub target_path: PathBuf,
    #[serde(default)]
    pub target_args: Vec<String>,
}

impl SessionInfo {
    pub fn new(target_path: impl Into<PathBuf>, target_args: Vec<String>) -> Self {
        Self {
            target_path: target_path.into(),
            target_args,
        }
    }
}

/// Storage for the replay state.
pub trait SessionStore {
    fn write(&self, info: &SessionInfo) -> Result<()>;

    fn read(&self) -> Result<Option<SessionInfo>>;

    fn write_recipe(&self, recipe: &Recipe) -> Result<()>;

    fn read_recipe(&self) -> Result<Option<Recipe>>;
}

/// JSON files in a state directory.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn save<T: Serialize>(&self, file: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file);
        let temp = self.dir.join(format!("{}.tmp", file));

        let contents = serde_json::to_string_pretty(value)?;
        fs::write(&temp, contents)?;
        fs::rename(&temp, &path)?;

        tracing::info!("Saved {}", path.display());
        Ok(())
    }

    fn load<T: for<'de> Deserialize<'de>>(&self, file: &str) -> Result<Option<T>> {
        let path = self.dir.join(file);
        if !path.exists() {
            tracing::debug!("No state file at {}", path.display());
            return Ok(None);
        }

        let contents = fs::read_to_string(&path)?;
        if contents.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&contents).map(Some).map_err(|e| {
            FaultlineError::CorruptSessionState(format!("{}: {}", path.display(), e))
        })
    }
}

impl SessionStore for FileSessionStore {
    fn write(&self, info: &SessionInfo) -> Result<()> {
        self.save(SESSION_FILE, info)
    }

    fn read(&self) -> Result<Option<SessionInfo>> {
        self.load(SESSION_FILE)
    }

    fn write_recipe(&self, recipe: &Recipe) -> Result<()> {
        self.save(RECIPE_FILE, recipe)
    }

    fn read_recipe(&self) -> Result<Option<Recipe>> {
        self.load(RECIPE_FILE)
    }
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: RefCell<Option<SessionInfo>>,
    recipe: RefCell<Option<Recipe>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn write(&self, info: &SessionInfo) -> Result<()> {
        *self.session.borrow_mut() = Some(info.clone());
        Ok(())
    }

    fn read(&self) -> Result<Option<SessionInfo>> {
        Ok(self.session.borrow().clone())
    }

    fn write_recipe(&self, recipe: &Recipe) -> Result<()> {
        *self.recipe.borrow_mut() = Some(recipe.clone());
        Ok(())
    }

    fn read_recipe(&self) -> Result<Option<Recipe>> {
        Ok(self.recipe.borrow().clone())
    }
}

/// Everything needed to re-run the last invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayPlan {
    pub session: SessionInfo,
    pub recipe: Recipe,
}

/// Resolve the stored state into a replay plan.
///
/// `exists` decides whether the stored target is still on disk; callers
/// pass their runtime's check.
pub fn plan_replay(store: &dyn SessionStore, exists: impl Fn(&Path) -> bool) -> Result<ReplayPlan> {
    let session = store.read()?.ok_or(FaultlineError::NoPriorSession)?;
    if session.target_path.as_os_str().is_empty() {
        return Err(FaultlineError::NoPriorSession);
    }
    let recipe = store.read_recipe()?.ok_or(FaultlineError::NoPriorSession)?;

    if !exists(&session.target_path) {
        return Err(FaultlineError::CorruptSessionState(format!(
            "{} no longer exists",
            session.target_path.display()
        )));
    }

    tracing::debug!(
        target = %session.target_path.display(),
        modes = recipe.len(),
        "Replaying last session"
    );
    Ok(ReplayPlan { session, recipe })
}
