//! # Reducer
//!
//! The single entry point for state transitions.
//!
//! `reducer` borrows the current [`State`] and returns a new one; the input is
//! never touched, so any snapshot a caller holds stays valid. On error the
//! caller simply keeps the state it passed in.
//!
//! The returned state shares every part the action did not write with its
//! input, so a keystroke costs one document record plus pointer copies.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::document::{merge_state, validate_state, DocumentMap, DocumentState};
use crate::history::{Batch, History, HistoryEntry};
use crate::{Action, StoreConfig, StoreError, StoreResult};

/// Plugin registry, opaque to the store
pub type Plugins = BTreeMap<String, Value>;

/// What a store is created from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseState {
    pub default_plugin: String,
    pub plugins: Plugins,
    pub documents: DocumentMap,
}

/// Root store value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    pub documents: DocumentMap,
    pub default_plugin: String,
    pub plugins: Arc<Plugins>,
    /// Captured documents, newest first
    pub clipboard: Vec<DocumentState>,
    pub editable: bool,
    pub history: History,
    pub config: StoreConfig,
}

/// Create a store with the default config
pub fn create_initial_state(base: BaseState) -> State {
    create_initial_state_with_config(base, StoreConfig::default())
}

pub fn create_initial_state_with_config(base: BaseState, config: StoreConfig) -> State {
    let base = Arc::new(base);
    State {
        documents: base.documents.clone(),
        default_plugin: base.default_plugin.clone(),
        plugins: Arc::new(base.plugins.clone()),
        clipboard: Vec::new(),
        editable: true,
        history: History::new(base),
        config,
    }
}

/// Apply `action` to `state`, producing the next state
#[instrument(skip_all, fields(action = action.kind()))]
pub fn reducer(state: &State, action: &Action) -> StoreResult<State> {
    let mut next = state.clone();

    match action {
        Action::Undo => undo(&mut next)?,
        Action::Redo => redo(&mut next)?,
        Action::Persist => {
            next.history.mark_persisted(&next.documents);
            debug!(documents = next.documents.len(), "Persisted baseline");
        }
        Action::CopyToClipboard { id } => copy_to_clipboard(&mut next, id)?,
        Action::Batch(actions) => {
            if actions.is_empty() {
                return Err(StoreError::invalid("batch must contain at least one action"));
            }
            let mut entries = Vec::with_capacity(actions.len());
            for inner in actions {
                if matches!(inner, Action::Batch(_)) || !inner.is_undoable() {
                    return Err(StoreError::invalid(format!(
                        "{} cannot be part of a batch",
                        inner.kind()
                    )));
                }
                entries.push(apply_edit(&mut next.documents, inner)?);
            }
            // Non-empty: checked above
            if let Some(batch) = Batch::from_entries(entries) {
                next.history.record_batch(batch, next.config.history_limit);
            }
        }
        edit => {
            let entry = apply_edit(&mut next.documents, edit)?;
            next.history.record(entry, next.config.history_limit);
        }
    }

    Ok(next)
}

/// Apply one undoable edit to the documents, returning its history entry
fn apply_edit(docs: &mut DocumentMap, action: &Action) -> StoreResult<HistoryEntry> {
    match action {
        Action::Insert { id, plugin, state } => {
            validate_state(state.as_ref())?;
            let document = DocumentState {
                plugin: plugin.clone(),
                state: state.clone(),
            };
            docs.insert(id, document.clone())?;
            Ok(HistoryEntry::Insert {
                id: id.clone(),
                document,
            })
        }

        Action::Delete { id } => {
            let document = docs.remove(id)?;
            Ok(HistoryEntry::Delete {
                id: id.clone(),
                document,
            })
        }

        Action::Change { id, state, commit } => {
            let before = docs
                .get(id)
                .ok_or_else(|| StoreError::NotFound(id.clone()))?
                .state
                .clone();
            let update = state.resolve(before.as_ref());
            let after = merge_state(before.as_ref(), update)?;
            docs.set_state(id, Some(after.clone()))?;
            Ok(HistoryEntry::Change {
                id: id.clone(),
                before,
                after,
                commit: *commit,
            })
        }

        Action::Replace { id, plugin, state } => {
            validate_state(state.as_ref())?;
            let after = DocumentState {
                plugin: plugin.clone(),
                state: state.clone(),
            };
            let before = docs.replace(id, after.clone())?;
            Ok(HistoryEntry::Replace {
                id: id.clone(),
                before,
                after,
            })
        }

        other => Err(StoreError::invalid(format!("{} is not undoable", other.kind()))),
    }
}

fn undo(state: &mut State) -> StoreResult<()> {
    let Some(batch) = state.history.pop_undo() else {
        debug!("Nothing to undo");
        return Ok(());
    };
    batch.revert(&mut state.documents)?;
    debug!(entries = batch.len(), "Undid batch");
    state.history.push_redo(batch);
    Ok(())
}

fn redo(state: &mut State) -> StoreResult<()> {
    let Some(batch) = state.history.pop_redo() else {
        debug!("Nothing to redo");
        return Ok(());
    };
    batch.apply(&mut state.documents)?;
    debug!(entries = batch.len(), "Redid batch");
    state.history.push_redone(batch);
    Ok(())
}

fn copy_to_clipboard(state: &mut State, id: &str) -> StoreResult<()> {
    let document = state
        .documents
        .get(id)
        .cloned()
        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
    state.clipboard.insert(0, document);
    state.clipboard.truncate(state.config.clipboard_size);
    debug!(id, entries = state.clipboard.len(), "Copied document to clipboard");
    Ok(())
}
