//! History behaviour through the public reducer
//!
//! This tests:
//! - Recording and coalescing of changes
//! - Undo/redo sequences
//! - Redo invalidation

use plugdoc_core::{
    create_initial_state, get_document, reducer, Action, BaseState, CommitType, DocumentMap,
    DocumentState, HistoryEntry, Plugins, State, StateUpdate,
};
use serde_json::json;

fn store_with_stateful_document() -> (BaseState, State) {
    let base = BaseState {
        default_plugin: "default".to_string(),
        plugins: Plugins::new(),
        documents: DocumentMap::new().with_document("0", DocumentState::new("stateful")),
    };
    let state = create_initial_state(base.clone());
    (base, state)
}

fn set_counter(counter: i64) -> StateUpdate {
    StateUpdate::compute(move |_| json!({ "counter": counter }))
}

fn debounced(counter: i64) -> Action {
    Action::change("0", set_counter(counter))
}

fn force_commit(counter: i64) -> Action {
    Action::change_with("0", set_counter(counter), CommitType::ForceCommit)
}

#[test]
fn test_history_contains_initial_state() {
    let (base, state) = store_with_stateful_document();
    let state = reducer(&state, &debounced(1)).unwrap();

    assert_eq!(state.history.initial_state(), &base);
}

#[test]
fn test_history_remembers_actions() {
    let (_, state) = store_with_stateful_document();
    let state = reducer(&state, &debounced(1)).unwrap();

    assert_eq!(state.history.actions().len(), 1);
    assert_eq!(state.history.actions()[0].len(), 1);
    assert_eq!(
        state.history.actions()[0].entries()[0],
        HistoryEntry::Change {
            id: "0".to_string(),
            before: None,
            after: json!({ "counter": 1 }),
            commit: CommitType::Debounced,
        }
    );
}

#[test]
fn test_single_force_commit_is_one_batch() {
    let (_, state) = store_with_stateful_document();
    let state = reducer(&state, &force_commit(1)).unwrap();

    assert_eq!(state.history.actions().len(), 1);
    assert_eq!(state.history.actions()[0].len(), 1);
    assert_eq!(state.history.pending(), 0);
}

#[test]
fn test_history_remembers_undos_for_redo() {
    let (_, state) = store_with_stateful_document();
    let state = reducer(&state, &debounced(1)).unwrap();

    let state = reducer(&state, &Action::Undo).unwrap();
    assert_eq!(state.history.redo_stack().len(), 1);
    assert_eq!(state.history.actions().len(), 0);

    let state = reducer(&state, &Action::Redo).unwrap();
    assert_eq!(state.history.redo_stack().len(), 0);
    assert_eq!(state.history.actions().len(), 1);
}

#[test]
fn test_history_purges_redos_after_change() {
    let (_, state) = store_with_stateful_document();
    let state = reducer(&state, &force_commit(1)).unwrap();
    let state = reducer(&state, &Action::Undo).unwrap();
    assert_eq!(state.history.redo_stack().len(), 1);
    assert_eq!(state.history.actions().len(), 0);

    let state = reducer(&state, &force_commit(2)).unwrap();
    assert_eq!(state.history.redo_stack().len(), 0);
    assert_eq!(state.history.actions().len(), 1);
}

#[test]
fn test_history_combines_debounced_changes() {
    let (_, state) = store_with_stateful_document();

    let state = reducer(&state, &debounced(1)).unwrap();
    assert_eq!(state.history.actions().len(), 1);

    let state = reducer(&state, &debounced(2)).unwrap();
    assert_eq!(state.history.actions().len(), 1);

    let state = reducer(&state, &force_commit(4)).unwrap();
    assert_eq!(state.history.actions().len(), 2);

    let state = reducer(&state, &debounced(2)).unwrap();
    assert_eq!(state.history.actions().len(), 3);
}

#[test]
fn test_undo_change_action() {
    let (_, state) = store_with_stateful_document();
    let state = reducer(&state, &force_commit(1)).unwrap();
    let state = reducer(&state, &force_commit(2)).unwrap();
    let state = reducer(&state, &Action::Undo).unwrap();

    assert_eq!(
        get_document(&state, "0"),
        Some(&DocumentState::with_state("stateful", json!({ "counter": 1 })))
    );
}

#[test]
fn test_redo_change_action() {
    let (_, state) = store_with_stateful_document();
    let state = reducer(&state, &force_commit(1)).unwrap();
    let state = reducer(&state, &force_commit(2)).unwrap();
    let state = reducer(&state, &Action::Undo).unwrap();
    let state = reducer(&state, &Action::Redo).unwrap();

    assert_eq!(
        get_document(&state, "0"),
        Some(&DocumentState::with_state("stateful", json!({ "counter": 2 })))
    );
}

#[test]
fn test_undo_redo_works_with_debounced_changes() {
    let (_, state) = store_with_stateful_document();
    let state = reducer(&state, &debounced(1)).unwrap();
    let state = reducer(&state, &debounced(2)).unwrap();

    let state = reducer(&state, &Action::Undo).unwrap();
    assert_eq!(get_document(&state, "0"), Some(&DocumentState::new("stateful")));

    let state = reducer(&state, &Action::Redo).unwrap();
    assert_eq!(
        get_document(&state, "0"),
        Some(&DocumentState::with_state("stateful", json!({ "counter": 2 })))
    );
}

#[test]
fn test_force_commit_after_debounced_run_undoes_separately() {
    let (_, state) = store_with_stateful_document();
    let state = reducer(&state, &debounced(1)).unwrap();
    let state = reducer(&state, &debounced(2)).unwrap();
    let state = reducer(&state, &force_commit(4)).unwrap();

    let state = reducer(&state, &Action::Undo).unwrap();
    assert_eq!(
        get_document(&state, "0"),
        Some(&DocumentState::with_state("stateful", json!({ "counter": 2 })))
    );

    let state = reducer(&state, &Action::Undo).unwrap();
    assert_eq!(get_document(&state, "0"), Some(&DocumentState::new("stateful")));
}

#[test]
fn test_debounced_changes_on_different_documents_do_not_merge() {
    let (_, state) = store_with_stateful_document();
    let state = reducer(&state, &Action::insert("1", "stateful", None)).unwrap();
    let state = reducer(&state, &debounced(1)).unwrap();
    let state = reducer(&state, &Action::change("1", set_counter(5))).unwrap();
    let state = reducer(&state, &debounced(2)).unwrap();

    // insert, change(0), change(1), change(0)
    assert_eq!(state.history.actions().len(), 4);
    assert_eq!(state.history.pending(), 1);
}

#[test]
fn test_undo_closes_debounce_window() {
    let (_, state) = store_with_stateful_document();
    let state = reducer(&state, &force_commit(1)).unwrap();
    let state = reducer(&state, &debounced(2)).unwrap();
    let state = reducer(&state, &Action::Undo).unwrap();
    assert_eq!(state.history.pending(), 0);

    let state = reducer(&state, &debounced(3)).unwrap();
    assert_eq!(state.history.actions().len(), 2);
    assert!(state.history.redo_stack().is_empty());
}

#[test]
fn test_multiple_updates_with_undo_redo() {
    let (_, mut state) = store_with_stateful_document();
    for i in 1..=5 {
        state = reducer(&state, &force_commit(i)).unwrap();
    }
    assert_eq!(state.history.actions().len(), 5);

    for _ in 0..5 {
        state = reducer(&state, &Action::Undo).unwrap();
    }
    assert_eq!(state.history.actions().len(), 0);
    assert_eq!(state.history.redo_stack().len(), 5);
    assert_eq!(get_document(&state, "0"), Some(&DocumentState::new("stateful")));

    for _ in 0..5 {
        state = reducer(&state, &Action::Redo).unwrap();
    }
    assert_eq!(state.history.actions().len(), 5);
    assert_eq!(
        get_document(&state, "0"),
        Some(&DocumentState::with_state("stateful", json!({ "counter": 5 })))
    );

    // Undo 3, apply new (clears redo)
    for _ in 0..3 {
        state = reducer(&state, &Action::Undo).unwrap();
    }
    assert_eq!(state.history.redo_stack().len(), 3);

    state = reducer(&state, &force_commit(42)).unwrap();
    assert_eq!(state.history.redo_stack().len(), 0);
    assert_eq!(state.history.actions().len(), 3);
}

#[test]
fn test_failed_action_leaves_history_untouched() {
    let (_, state) = store_with_stateful_document();
    let state = reducer(&state, &force_commit(1)).unwrap();
    let state = reducer(&state, &Action::Undo).unwrap();

    assert!(reducer(&state, &Action::delete("missing")).is_err());
    assert_eq!(state.history.redo_stack().len(), 1);
}

#[test]
fn test_default_store_undoes_every_step() {
    let (base, mut state) = store_with_stateful_document();
    for i in 0..150 {
        state = reducer(
            &state,
            &Action::change_with(
                "0",
                StateUpdate::patch(json!({ "v": i })).unwrap(),
                CommitType::ForceCommit,
            ),
        )
        .unwrap();
    }
    assert_eq!(state.history.actions().len(), 150);

    for _ in 0..150 {
        state = reducer(&state, &Action::Undo).unwrap();
    }
    assert_eq!(state.documents, base.documents);
    assert!(!state.history.can_undo());
    assert_eq!(state.history.redo_stack().len(), 150);
}
