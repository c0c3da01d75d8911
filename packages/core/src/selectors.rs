//! Read-only accessors over a [`State`]

use serde_json::Value;

use crate::document::DocumentState;
use crate::{Plugins, State, StoreError, StoreResult};

pub fn get_document<'a>(state: &'a State, id: &str) -> Option<&'a DocumentState> {
    state.documents.get(id)
}

/// Like [`get_document`], but an unknown id is an error
pub fn require_document<'a>(state: &'a State, id: &str) -> StoreResult<&'a DocumentState> {
    get_document(state, id).ok_or_else(|| StoreError::NotFound(id.to_string()))
}

/// Whether the documents differ from the last persisted baseline
pub fn has_pending_changes(state: &State) -> bool {
    &state.documents != state.history.persisted()
}

pub fn get_clipboard(state: &State) -> &[DocumentState] {
    &state.clipboard
}

pub fn get_plugins(state: &State) -> &Plugins {
    &state.plugins
}

pub fn get_plugin<'a>(state: &'a State, name: &str) -> Option<&'a Value> {
    state.plugins.get(name)
}

pub fn get_default_plugin(state: &State) -> &str {
    &state.default_plugin
}

pub fn is_editable(state: &State) -> bool {
    state.editable
}

pub fn can_undo(state: &State) -> bool {
    state.history.can_undo()
}

pub fn can_redo(state: &State) -> bool {
    state.history.can_redo()
}
