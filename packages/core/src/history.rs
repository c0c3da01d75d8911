//! # History Ledger
//!
//! Tracks committed edits and enables undo/redo.
//!
//! ## Design
//!
//! - Each edit is recorded as a [`HistoryEntry`] holding both the forward write
//!   and the data needed to revert it, captured when the edit is applied
//! - Entries are grouped into [`Batch`]es; a batch is one undo step
//! - Undo reverts a batch (entries in reverse order) and moves it to the redo
//!   stack
//! - Redo reapplies the batch's forward writes and moves it back
//! - New edits clear the redo stack
//! - Debounced changes to the same document merge into the open tail batch
//!   while `pending > 0`
//!
//! ## Coalescing
//!
//! ```text
//! change(0, debounced)    actions: [[c0]]          pending: 1
//! change(0, debounced)    actions: [[c0']]         pending: 2   (merged)
//! change(0, forceCommit)  actions: [[c0'], [c1]]   pending: 0   (sealed)
//! change(0, debounced)    actions: [.., [c2]]      pending: 1
//! ```
//!
//! A merged change keeps the `before` of the first change in the run, so
//! undoing it returns to the state before the run started.
//!
//! ## Sharing
//!
//! The initial snapshot, both stacks and every batch sit behind `Arc`, so a
//! cloned `History` shares them with its source until one side is written.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::document::{DocumentMap, DocumentState};
use crate::{BaseState, CommitType, StoreResult};

/// A recorded, reversible edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HistoryEntry {
    /// A document was added
    Insert { id: String, document: DocumentState },

    /// A document was removed; `document` is the removed record
    Delete { id: String, document: DocumentState },

    /// A document's state went from `before` to `after`
    Change {
        id: String,
        before: Option<Value>,
        after: Value,
        commit: CommitType,
    },

    /// A document record was swapped
    Replace {
        id: String,
        before: DocumentState,
        after: DocumentState,
    },
}

impl HistoryEntry {
    /// Id of the document this entry touches
    pub fn id(&self) -> &str {
        match self {
            HistoryEntry::Insert { id, .. }
            | HistoryEntry::Delete { id, .. }
            | HistoryEntry::Change { id, .. }
            | HistoryEntry::Replace { id, .. } => id,
        }
    }

    /// Structural edits always seal their batch
    pub fn commit(&self) -> CommitType {
        match self {
            HistoryEntry::Change { commit, .. } => *commit,
            _ => CommitType::ForceCommit,
        }
    }

    /// Apply the forward write
    pub(crate) fn apply(&self, docs: &mut DocumentMap) -> StoreResult<()> {
        match self {
            HistoryEntry::Insert { id, document } => docs.insert(id, document.clone()),
            HistoryEntry::Delete { id, .. } => docs.remove(id).map(|_| ()),
            HistoryEntry::Change { id, after, .. } => docs.set_state(id, Some(after.clone())),
            HistoryEntry::Replace { id, after, .. } => docs.replace(id, after.clone()).map(|_| ()),
        }
    }

    /// Apply the inverse write
    pub(crate) fn revert(&self, docs: &mut DocumentMap) -> StoreResult<()> {
        match self {
            HistoryEntry::Insert { id, .. } => docs.remove(id).map(|_| ()),
            HistoryEntry::Delete { id, document } => docs.insert(id, document.clone()),
            HistoryEntry::Change { id, before, .. } => docs.set_state(id, before.clone()),
            HistoryEntry::Replace { id, before, .. } => docs.replace(id, before.clone()).map(|_| ()),
        }
    }

    /// Fold a later debounced change into this one.
    ///
    /// Returns `false` (leaving `self` untouched) unless both entries are
    /// debounced changes of the same document.
    fn coalesce(&mut self, next: &HistoryEntry) -> bool {
        match (self, next) {
            (
                HistoryEntry::Change {
                    id,
                    after,
                    commit: CommitType::Debounced,
                    ..
                },
                HistoryEntry::Change {
                    id: next_id,
                    after: next_after,
                    commit: CommitType::Debounced,
                    ..
                },
            ) if id == next_id => {
                *after = next_after.clone();
                true
            }
            _ => false,
        }
    }
}

/// A group of entries undone/redone together (never empty)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<HistoryEntry>", into = "Vec<HistoryEntry>")]
pub struct Batch {
    /// The entries in this batch (in application order)
    entries: Arc<Vec<HistoryEntry>>,
}

impl Batch {
    /// Create a single-entry batch
    pub fn single(entry: HistoryEntry) -> Self {
        Self {
            entries: Arc::new(vec![entry]),
        }
    }

    /// Create a batch from several entries; `None` if there are none
    pub fn from_entries(entries: Vec<HistoryEntry>) -> Option<Self> {
        if entries.is_empty() {
            None
        } else {
            Some(Self {
                entries: Arc::new(entries),
            })
        }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reapply forward writes in order
    pub(crate) fn apply(&self, docs: &mut DocumentMap) -> StoreResult<()> {
        for entry in self.entries.iter() {
            entry.apply(docs)?;
        }
        Ok(())
    }

    /// Revert in reverse order
    pub(crate) fn revert(&self, docs: &mut DocumentMap) -> StoreResult<()> {
        for entry in self.entries.iter().rev() {
            entry.revert(docs)?;
        }
        Ok(())
    }

    fn last_mut(&mut self) -> Option<&mut HistoryEntry> {
        Arc::make_mut(&mut self.entries).last_mut()
    }
}

impl TryFrom<Vec<HistoryEntry>> for Batch {
    type Error = String;

    fn try_from(entries: Vec<HistoryEntry>) -> Result<Self, Self::Error> {
        Batch::from_entries(entries).ok_or_else(|| "history batch must not be empty".to_string())
    }
}

impl From<Batch> for Vec<HistoryEntry> {
    fn from(batch: Batch) -> Self {
        Arc::try_unwrap(batch.entries).unwrap_or_else(|shared| (*shared).clone())
    }
}

/// Undo/redo ledger plus the persisted baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct History {
    /// Snapshot of the store at creation
    initial_state: Arc<BaseState>,

    /// Committed batches (most recent last)
    actions: Arc<Vec<Batch>>,

    /// Undone batches (most recent last)
    redo_stack: Arc<Vec<Batch>>,

    /// Debounced changes folded into the open tail batch (0 = sealed)
    pending: usize,

    /// Documents as of the last Persist
    persisted: DocumentMap,
}

impl History {
    pub(crate) fn new(initial_state: Arc<BaseState>) -> Self {
        let persisted = initial_state.documents.clone();
        Self {
            initial_state,
            actions: Arc::default(),
            redo_stack: Arc::default(),
            pending: 0,
            persisted,
        }
    }

    pub fn initial_state(&self) -> &BaseState {
        &self.initial_state
    }

    pub fn actions(&self) -> &[Batch] {
        self.actions.as_slice()
    }

    pub fn redo_stack(&self) -> &[Batch] {
        self.redo_stack.as_slice()
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn persisted(&self) -> &DocumentMap {
        &self.persisted
    }

    pub fn can_undo(&self) -> bool {
        !self.actions.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Record one edit, merging it into the open batch when possible
    pub(crate) fn record(&mut self, entry: HistoryEntry, limit: usize) {
        self.clear_redo();

        let debounced = entry.commit() == CommitType::Debounced;
        if debounced && self.pending > 0 && self.tail_accepts(&entry) {
            if let Some(tail) = Arc::make_mut(&mut self.actions)
                .last_mut()
                .and_then(Batch::last_mut)
            {
                if tail.coalesce(&entry) {
                    self.pending += 1;
                    debug!(id = entry.id(), pending = self.pending, "Merged debounced change");
                    return;
                }
            }
        }

        self.pending = if debounced { 1 } else { 0 };
        debug!(id = entry.id(), commit = ?entry.commit(), "Recorded new batch");
        Arc::make_mut(&mut self.actions).push(Batch::single(entry));
        self.enforce_limit(limit);
    }

    /// Record a pre-built group as one sealed batch
    pub(crate) fn record_batch(&mut self, batch: Batch, limit: usize) {
        self.clear_redo();
        self.pending = 0;
        debug!(entries = batch.len(), "Recorded grouped batch");
        Arc::make_mut(&mut self.actions).push(batch);
        self.enforce_limit(limit);
    }

    /// Take the most recent batch for undo; closes any open run
    pub(crate) fn pop_undo(&mut self) -> Option<Batch> {
        self.pending = 0;
        if self.actions.is_empty() {
            return None;
        }
        Arc::make_mut(&mut self.actions).pop()
    }

    pub(crate) fn push_redo(&mut self, batch: Batch) {
        Arc::make_mut(&mut self.redo_stack).push(batch);
    }

    /// Take the most recently undone batch for redo
    pub(crate) fn pop_redo(&mut self) -> Option<Batch> {
        self.pending = 0;
        if self.redo_stack.is_empty() {
            return None;
        }
        Arc::make_mut(&mut self.redo_stack).pop()
    }

    /// Put a redone batch back on the undo side without touching the redo stack
    pub(crate) fn push_redone(&mut self, batch: Batch) {
        Arc::make_mut(&mut self.actions).push(batch);
    }

    pub(crate) fn mark_persisted(&mut self, documents: &DocumentMap) {
        self.persisted = documents.clone();
    }

    fn clear_redo(&mut self) {
        if !self.redo_stack.is_empty() {
            self.redo_stack = Arc::default();
        }
    }

    /// Whether the tail batch ends in a change `entry` could fold into
    fn tail_accepts(&self, entry: &HistoryEntry) -> bool {
        match (self.actions.last().and_then(|b| b.entries().last()), entry) {
            (
                Some(HistoryEntry::Change {
                    id,
                    commit: CommitType::Debounced,
                    ..
                }),
                HistoryEntry::Change { id: next_id, .. },
            ) => id == next_id,
            _ => false,
        }
    }

    /// Drop the oldest batches past `limit` (0 = unlimited)
    fn enforce_limit(&mut self, limit: usize) {
        if limit > 0 && self.actions.len() > limit {
            let excess = self.actions.len() - limit;
            warn!(dropped = excess, limit, "History limit reached, dropping oldest batches");
            Arc::make_mut(&mut self.actions).drain(..excess);
        }
    }
}
