/*
 * tests/replay.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Replay state tests
 */

//! Replay state round trips through the file-backed store.

use faultline_core::{
    FaultlineError, FileSessionStore, Mode, ModeFlags, Recipe, SessionInfo, SessionStore,
    plan_replay,
};

#[test]
fn test_replay_round_trip() {
    let temp = tempfile::tempdir().unwrap();
    let script = temp.path().join("job.py");
    std::fs::write(&script, "print('hi')\n").unwrap();

    let store = FileSessionStore::new(temp.path().join("state"));
    let info = SessionInfo::new(&script, vec!["--limit".to_string(), "10".to_string()]);
    let recipe = Recipe::from_flags(&ModeFlags {
        trace: true,
        locals: true,
        search: true,
        ..Default::default()
    });

    store.write(&info).unwrap();
    store.write_recipe(&recipe).unwrap();

    let plan = plan_replay(&store, |path| path.exists()).unwrap();
    assert_eq!(plan.session, info);
    assert_eq!(plan.recipe, recipe);
    assert_eq!(plan.recipe.modes(), &[Mode::TraceLocals, Mode::Search]);
}

#[test]
fn test_recipe_file_is_identifier_array() {
    let temp = tempfile::tempdir().unwrap();
    let store = FileSessionStore::new(temp.path());
    store
        .write_recipe(&Recipe::from_modes(vec![Mode::Type, Mode::InnerLocals]).unwrap())
        .unwrap();

    let text = std::fs::read_to_string(temp.path().join("recipe.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value, serde_json::json!(["type", "inner+locals"]));
}

#[test]
fn test_replay_without_state() {
    let temp = tempfile::tempdir().unwrap();
    let store = FileSessionStore::new(temp.path());

    let err = plan_replay(&store, |path| path.exists()).unwrap_err();
    assert!(matches!(err, FaultlineError::NoPriorSession));
    assert_eq!(
        err.to_string(),
        "No information on the last operation is available."
    );
}

#[test]
fn test_replay_with_deleted_target() {
    let temp = tempfile::tempdir().unwrap();
    let script = temp.path().join("gone.py");
    std::fs::write(&script, "raise SystemExit(1)\n").unwrap();

    let store = FileSessionStore::new(temp.path().join("state"));
    store.write(&SessionInfo::new(&script, Vec::new())).unwrap();
    store.write_recipe(&Recipe::default()).unwrap();
    std::fs::remove_file(&script).unwrap();

    let err = plan_replay(&store, |path| path.exists()).unwrap_err();
    assert!(matches!(err, FaultlineError::CorruptSessionState(_)));
}

#[test]
fn test_replay_with_unreadable_session() {
    let temp = tempfile::tempdir().unwrap();
    std::fs::write(temp.path().join("session.json"), "{\"target_path\": 3}").unwrap();

    let store = FileSessionStore::new(temp.path());
    let err = plan_replay(&store, |_| true).unwrap_err();
    assert!(matches!(err, FaultlineError::CorruptSessionState(_)));
}
