//! # Store Actions
//!
//! Everything the reducer can do is expressed as an [`Action`].
//!
//! ## Action Semantics
//!
//! ### Undoable
//! - `Insert`, `Delete`, `Change`, `Replace` and `Batch` edit the document map
//!   and are recorded in history
//! - Each records concrete before/after data at reduce time, so undo and redo
//!   never call back into plugin code
//!
//! ### Change
//! - Shallow-merges an object into the document's state
//! - Debounced changes to the same document coalesce into one undo step until
//!   a force commit (or any other edit) closes the run
//!
//! ### Control
//! - `Undo`, `Redo` are no-ops on empty stacks
//! - `Persist` moves the persisted baseline, history is untouched
//! - `CopyToClipboard` captures a document without touching history

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use crate::{StoreError, StoreResult};

/// How a Change participates in history batching
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommitType {
    /// May merge into the open batch for the same document
    #[default]
    Debounced,
    /// Always recorded as its own sealed batch
    ForceCommit,
}

/// Caller-supplied function computing a partial state from the current one
pub type Updater = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// The payload of a Change
#[derive(Clone)]
pub enum StateUpdate {
    /// Fields to merge, as plain data
    Patch(Map<String, Value>),
    /// Fields to merge, computed from the current state
    ///
    /// Runs exactly once, when the action is reduced.
    Compute(Updater),
}

impl StateUpdate {
    /// Build a patch from a JSON object
    pub fn patch(value: Value) -> StoreResult<Self> {
        match value {
            Value::Object(fields) => Ok(StateUpdate::Patch(fields)),
            _ => Err(StoreError::invalid("state patch must be an object")),
        }
    }

    pub fn compute<F>(updater: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        StateUpdate::Compute(Arc::new(updater))
    }

    /// Resolve against the current state (an empty object when absent)
    pub(crate) fn resolve(&self, current: Option<&Value>) -> Value {
        match self {
            StateUpdate::Patch(fields) => Value::Object(fields.clone()),
            StateUpdate::Compute(updater) => {
                let empty = Value::Object(Map::new());
                updater(current.unwrap_or(&empty))
            }
        }
    }
}

impl fmt::Debug for StateUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateUpdate::Patch(fields) => f.debug_tuple("Patch").field(fields).finish(),
            StateUpdate::Compute(_) => f.write_str("Compute(..)"),
        }
    }
}

impl From<Map<String, Value>> for StateUpdate {
    fn from(fields: Map<String, Value>) -> Self {
        StateUpdate::Patch(fields)
    }
}

/// Store actions
#[derive(Debug, Clone)]
pub enum Action {
    /// Add a new document
    ///
    /// `state`, when given, must be a JSON object; anything else is rejected
    /// as `InvalidAction` so later Changes can merge into it.
    Insert {
        id: String,
        plugin: String,
        state: Option<Value>,
    },

    /// Remove a document
    Delete { id: String },

    /// Merge new fields into a document's state
    Change {
        id: String,
        state: StateUpdate,
        commit: CommitType,
    },

    /// Swap a document for a different plugin record (same `state` rule as Insert)
    Replace {
        id: String,
        plugin: String,
        state: Option<Value>,
    },

    /// Several undoable actions recorded as one undo step
    Batch(Vec<Action>),

    Undo,

    Redo,

    /// Mark the current documents as the persisted baseline
    Persist,

    /// Capture a document onto the clipboard
    CopyToClipboard { id: String },
}

impl Action {
    pub fn insert(id: impl Into<String>, plugin: impl Into<String>, state: Option<Value>) -> Self {
        Action::Insert {
            id: id.into(),
            plugin: plugin.into(),
            state,
        }
    }

    pub fn delete(id: impl Into<String>) -> Self {
        Action::Delete { id: id.into() }
    }

    /// Debounced change
    pub fn change(id: impl Into<String>, state: impl Into<StateUpdate>) -> Self {
        Self::change_with(id, state, CommitType::Debounced)
    }

    pub fn change_with(id: impl Into<String>, state: impl Into<StateUpdate>, commit: CommitType) -> Self {
        Action::Change {
            id: id.into(),
            state: state.into(),
            commit,
        }
    }

    pub fn replace(id: impl Into<String>, plugin: impl Into<String>, state: Option<Value>) -> Self {
        Action::Replace {
            id: id.into(),
            plugin: plugin.into(),
            state,
        }
    }

    pub fn batch(actions: impl IntoIterator<Item = Action>) -> Self {
        Action::Batch(actions.into_iter().collect())
    }

    pub fn copy_to_clipboard(id: impl Into<String>) -> Self {
        Action::CopyToClipboard { id: id.into() }
    }

    /// Whether this action is recorded in history
    pub fn is_undoable(&self) -> bool {
        matches!(
            self,
            Action::Insert { .. }
                | Action::Delete { .. }
                | Action::Change { .. }
                | Action::Replace { .. }
                | Action::Batch(_)
        )
    }

    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Insert { .. } => "insert",
            Action::Delete { .. } => "delete",
            Action::Change { .. } => "change",
            Action::Replace { .. } => "replace",
            Action::Batch(_) => "batch",
            Action::Undo => "undo",
            Action::Redo => "redo",
            Action::Persist => "persist",
            Action::CopyToClipboard { .. } => "copyToClipboard",
        }
    }
}
