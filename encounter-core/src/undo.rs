//! Snapshot-based undo/redo for the roster.
//!
//! Every checkpoint is a full [`RosterState`] clone. Both stacks keep the
//! most recent entry at the front and drop the oldest past `max_depth`.
//! Pushing a new checkpoint clears the redo stack.

use crate::config::MAX_UNDO_DEPTH;
use crate::roster::{RosterState, RosterStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

/// Identity and label of a checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoMeta {
    pub id: Uuid,
    /// Human-readable action name, e.g. "Add adversary".
    pub label: String,
    pub timestamp: DateTime<Utc>,
}

impl UndoMeta {
    fn new(label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            timestamp: Utc::now(),
        }
    }
}

/// A checkpoint: the roster as it was just before the labelled action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoEntry {
    pub meta: UndoMeta,
    pub snapshot: RosterState,
}

/// Past and future checkpoint stacks.
#[derive(Debug, Clone)]
pub struct UndoEngine {
    past: VecDeque<UndoEntry>,
    future: VecDeque<UndoEntry>,
    max_depth: usize,
}

impl UndoEngine {
    pub fn new(max_depth: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: VecDeque::new(),
            max_depth,
        }
    }

    fn push_capped(stack: &mut VecDeque<UndoEntry>, entry: UndoEntry, max_depth: usize) {
        stack.push_front(entry);
        stack.truncate(max_depth);
    }

    /// Checkpoint the current roster under `label`. Clears the redo stack.
    pub fn push_undo(&mut self, label: impl Into<String>, roster: &RosterStore) {
        let entry = UndoEntry {
            meta: UndoMeta::new(label),
            snapshot: roster.snapshot(),
        };
        tracing::trace!(label = %entry.meta.label, depth = self.past.len() + 1, "undo checkpoint");
        Self::push_capped(&mut self.past, entry, self.max_depth);
        self.future.clear();
    }

    /// Discard the most recent checkpoint without restoring it.
    ///
    /// Used when an action pushed a checkpoint and then turned out to be a
    /// no-op.
    pub fn pop_undo(&mut self) -> Option<UndoMeta> {
        let entry = self.past.pop_front()?;
        tracing::trace!(label = %entry.meta.label, "dropped undo checkpoint");
        Some(entry.meta)
    }

    /// Restore the most recent checkpoint. The current state moves to the
    /// redo stack under the same label.
    pub fn undo(&mut self, roster: &mut RosterStore) -> Option<UndoMeta> {
        let entry = self.past.pop_front()?;
        let redo = UndoEntry {
            meta: UndoMeta::new(entry.meta.label.clone()),
            snapshot: roster.snapshot(),
        };
        Self::push_capped(&mut self.future, redo, self.max_depth);
        roster.restore(entry.snapshot);

        tracing::debug!(label = %entry.meta.label, "undo");
        Some(entry.meta)
    }

    /// Re-apply the most recently undone action.
    pub fn redo(&mut self, roster: &mut RosterStore) -> Option<UndoMeta> {
        let entry = self.future.pop_front()?;
        let undo = UndoEntry {
            meta: UndoMeta::new(entry.meta.label.clone()),
            snapshot: roster.snapshot(),
        };
        Self::push_capped(&mut self.past, undo, self.max_depth);
        roster.restore(entry.snapshot);

        tracing::debug!(label = %entry.meta.label, "redo");
        Some(entry.meta)
    }

    /// Forget both stacks.
    pub fn clear_history(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    /// Label of the action `undo` would revert.
    pub fn undo_label(&self) -> Option<&str> {
        self.past.front().map(|e| e.meta.label.as_str())
    }

    /// Label of the action `redo` would re-apply.
    pub fn redo_label(&self) -> Option<&str> {
        self.future.front().map(|e| e.meta.label.as_str())
    }

    /// Past checkpoints, most recent first.
    pub fn past(&self) -> impl Iterator<Item = &UndoMeta> {
        self.past.iter().map(|e| &e.meta)
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl Default for UndoEngine {
    fn default() -> Self {
        Self::new(MAX_UNDO_DEPTH)
    }
}
