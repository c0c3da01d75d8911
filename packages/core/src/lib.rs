//! # Plugdoc Core
//!
//! State store for plugin-based documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ caller: UI, plugins, timers                 │
//! │  - decides commit kind (debounce timing)    │
//! │  - writes persisted state to storage        │
//! └─────────────────────────────────────────────┘
//!                     ↓ Action
//! ┌─────────────────────────────────────────────┐
//! │ reducer: (&State, &Action) → State          │
//! │  - Document Map edits                       │
//! │  - History Ledger record / merge / undo     │
//! └─────────────────────────────────────────────┘
//!                     ↓ State
//! ┌─────────────────────────────────────────────┐
//! │ selectors: read-only views                  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Immutable snapshots**: every reduction yields a new `State` that shares
//!    whatever the action did not write
//! 2. **History is data**: entries store before/after values, never closures
//! 3. **Fail fast**: invalid actions are errors, empty undo/redo are no-ops
//! 4. **Timing is external**: the store only sees a pre-decided commit kind
//!
//! ## Usage
//!
//! ```rust
//! use plugdoc_core::{
//!     create_initial_state, get_document, has_pending_changes, reducer, Action, BaseState,
//!     CommitType, DocumentMap, DocumentState, Plugins, StateUpdate,
//! };
//! use serde_json::json;
//!
//! let state = create_initial_state(BaseState {
//!     default_plugin: "text".to_string(),
//!     plugins: Plugins::new(),
//!     documents: DocumentMap::new().with_document("0", DocumentState::new("counter")),
//! });
//!
//! let state = reducer(
//!     &state,
//!     &Action::change_with(
//!         "0",
//!         StateUpdate::compute(|_| json!({ "count": 1 })),
//!         CommitType::ForceCommit,
//!     ),
//! )?;
//! assert!(has_pending_changes(&state));
//!
//! let state = reducer(&state, &Action::Undo)?;
//! assert_eq!(get_document(&state, "0"), Some(&DocumentState::new("counter")));
//! # Ok::<(), plugdoc_core::StoreError>(())
//! ```

mod action;
mod config;
mod document;
mod errors;
mod history;
mod reducer;
mod result;
mod selectors;

pub use action::{Action, CommitType, StateUpdate, Updater};
pub use config::{StoreConfig, DEFAULT_CONFIG_NAME};
pub use document::{DocumentMap, DocumentState};
pub use errors::{ConfigError, StoreError};
pub use history::{Batch, History, HistoryEntry};
pub use reducer::{create_initial_state, create_initial_state_with_config, reducer, BaseState, Plugins, State};
pub use result::StoreResult;
pub use selectors::{
    can_redo, can_undo, get_clipboard, get_default_plugin, get_document, get_plugin, get_plugins,
    has_pending_changes, is_editable, require_document,
};
