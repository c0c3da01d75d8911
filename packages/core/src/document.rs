//! # Document Map
//!
//! Keyed collection of plugin documents.
//!
//! Every document is a `{ plugin, state? }` record. The store never looks
//! inside `state` beyond shallow-merging top-level fields on Change; the
//! shape of the value belongs to the plugin named by `plugin`.
//!
//! A record without `state` is freshly inserted and has not been touched by
//! its plugin yet.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::trace;

use crate::{StoreError, StoreResult};

/// A single plugin document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentState {
    /// Name of the plugin that owns this document
    pub plugin: String,

    /// Plugin-specific state (absent until first written)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Value>,
}

impl DocumentState {
    /// Create a fresh, uninitialized document
    pub fn new(plugin: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            state: None,
        }
    }

    /// Create a document with initial state
    pub fn with_state(plugin: impl Into<String>, state: Value) -> Self {
        Self {
            plugin: plugin.into(),
            state: Some(state),
        }
    }
}

/// Documents keyed by id
///
/// Ordered so that two maps holding the same documents compare and serialize
/// identically regardless of insertion order. Cloning is O(1): the map and each
/// record are shared, and an edit copies only the map spine and the record it
/// touches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentMap(Arc<BTreeMap<String, Arc<DocumentState>>>);

impl DocumentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, for assembling a `BaseState`
    ///
    /// Unlike the reducer's Insert this overwrites an existing id.
    pub fn with_document(mut self, id: impl Into<String>, document: DocumentState) -> Self {
        Arc::make_mut(&mut self.0).insert(id.into(), Arc::new(document));
        self
    }

    pub fn get(&self, id: &str) -> Option<&DocumentState> {
        self.0.get(id).map(Arc::as_ref)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Whether both maps are the same allocation
    pub(crate) fn shares_storage_with(&self, other: &DocumentMap) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Whether `id` is the same shared record in both maps
    pub(crate) fn shares_document_with(&self, other: &DocumentMap, id: &str) -> bool {
        match (self.0.get(id), other.0.get(id)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Add a new document, rejecting ids that are already taken
    pub(crate) fn insert(&mut self, id: &str, document: DocumentState) -> StoreResult<()> {
        if self.0.contains_key(id) {
            return Err(StoreError::DuplicateId(id.to_string()));
        }
        trace!(id, plugin = %document.plugin, "Inserting document");
        Arc::make_mut(&mut self.0).insert(id.to_string(), Arc::new(document));
        Ok(())
    }

    /// Remove a document and hand back the removed record
    pub(crate) fn remove(&mut self, id: &str) -> StoreResult<DocumentState> {
        if !self.0.contains_key(id) {
            return Err(StoreError::NotFound(id.to_string()));
        }
        trace!(id, "Removing document");
        Arc::make_mut(&mut self.0)
            .remove(id)
            .map(unshare)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Swap an existing record for a new one, returning the previous record
    pub(crate) fn replace(&mut self, id: &str, document: DocumentState) -> StoreResult<DocumentState> {
        let slot = self.slot_mut(id)?;
        trace!(id, plugin = %document.plugin, "Replacing document");
        Ok(unshare(std::mem::replace(slot, Arc::new(document))))
    }

    /// Overwrite the state of an existing document (`None` clears it)
    pub(crate) fn set_state(&mut self, id: &str, state: Option<Value>) -> StoreResult<()> {
        let slot = self.slot_mut(id)?;
        trace!(id, initialized = state.is_some(), "Writing document state");
        *slot = Arc::new(DocumentState {
            plugin: slot.plugin.clone(),
            state,
        });
        Ok(())
    }

    fn slot_mut(&mut self, id: &str) -> StoreResult<&mut Arc<DocumentState>> {
        if !self.0.contains_key(id) {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Arc::make_mut(&mut self.0)
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}

impl PartialEq for DocumentMap {
    fn eq(&self, other: &Self) -> bool {
        self.shares_storage_with(other) || self.0 == other.0
    }
}

impl<K: Into<String>> FromIterator<(K, DocumentState)> for DocumentMap {
    fn from_iter<I: IntoIterator<Item = (K, DocumentState)>>(iter: I) -> Self {
        Self(Arc::new(
            iter.into_iter()
                .map(|(id, doc)| (id.into(), Arc::new(doc)))
                .collect(),
        ))
    }
}

fn unshare(document: Arc<DocumentState>) -> DocumentState {
    Arc::try_unwrap(document).unwrap_or_else(|shared| (*shared).clone())
}

/// Documents stored through Insert/Replace must be mergeable by later Changes
pub(crate) fn validate_state(state: Option<&Value>) -> StoreResult<()> {
    match state {
        None | Some(Value::Object(_)) => Ok(()),
        Some(_) => Err(StoreError::invalid("document state must be an object")),
    }
}

/// Shallow-merge `update` on top of `current`.
///
/// A missing state counts as an empty object. Both sides must be JSON objects;
/// fields of `update` replace same-named fields of `current`, everything else is
/// kept.
pub(crate) fn merge_state(current: Option<&Value>, update: Value) -> StoreResult<Value> {
    let mut merged = match current {
        None => Map::new(),
        Some(Value::Object(fields)) => fields.clone(),
        Some(_) => {
            return Err(StoreError::invalid(
                "cannot merge a change into non-object document state",
            ))
        }
    };

    match update {
        Value::Object(fields) => {
            merged.extend(fields);
            Ok(Value::Object(merged))
        }
        _ => Err(StoreError::invalid("state update must produce an object")),
    }
}
