use std::collections::HashMap;

use crate::model::{TaskId, TaskPatch};

/// Staging area for un-pushed field edits, keyed by task id. Keystroke
/// level changes land here and only reach the registry and the network on
/// a flush. An entry's presence is its dirty flag.
#[derive(Debug, Default)]
pub struct EditBuffer {
    pending: HashMap<TaskId, TaskPatch>,
}

impl EditBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a pending change. Later writes to the same field win.
    pub fn stage(&mut self, id: TaskId, patch: TaskPatch) {
        if patch.is_empty() {
            return;
        }
        self.pending.entry(id).or_default().merge(patch);
    }

    /// Takes the pending patch for one task, clearing its dirty flag.
    pub fn drain(&mut self, id: &TaskId) -> Option<TaskPatch> {
        self.pending.remove(id)
    }

    /// Takes every pending patch for a bulk flush.
    pub fn drain_all(&mut self) -> Vec<(TaskId, TaskPatch)> {
        self.pending.drain().collect()
    }

    /// Drops a task's pending edits without applying them, used when the
    /// task itself is deleted.
    pub fn discard(&mut self, id: &TaskId) {
        self.pending.remove(id);
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn has_pending(&self, id: &TaskId) -> bool {
        self.pending.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
