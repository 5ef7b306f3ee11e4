//! Undo/redo snapshot store.
//!
//! Every mutating path snapshots the whole document file *before*
//! touching bytes; a failed edit therefore leaves the on-disk file at
//! the pre-snapshot state. Snapshots are opaque byte images — the store
//! never inspects them.
//!
//! Both stacks are bounded; pushing past the bound discards the oldest
//! entry. Any new snapshot (i.e. any new mutation) clears the redo
//! stack. Callers serialise per-document access with the engine's
//! document lock; the internal mutex only protects the map itself.

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use crate::error::Result;

#[derive(Debug, Default)]
struct DocHistory {
    undo: VecDeque<Vec<u8>>,
    redo: VecDeque<Vec<u8>>,
}

fn push_bounded(stack: &mut VecDeque<Vec<u8>>, snapshot: Vec<u8>, bound: usize) {
    stack.push_back(snapshot);
    while stack.len() > bound {
        stack.pop_front();
    }
}

/// Bounded per-document undo/redo snapshot stacks.
#[derive(Debug)]
pub struct HistoryStore {
    max_depth: usize,
    stacks: Mutex<HashMap<String, DocHistory>>,
}

impl HistoryStore {
    /// Create a store keeping at most `max_depth` snapshots per stack.
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            stacks: Mutex::new(HashMap::new()),
        }
    }

    /// Snapshot the document file before a mutation. Missing files are
    /// ignored so first-time writes need no special casing.
    pub fn snapshot_before(&self, doc_id: &str, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }
        let bytes = fs::read(path)?;
        let mut stacks = self.stacks.lock().expect("history lock poisoned");
        let entry = stacks.entry(doc_id.to_string()).or_default();
        push_bounded(&mut entry.undo, bytes, self.max_depth);
        entry.redo.clear();
        Ok(())
    }

    /// Restore the previous snapshot. Returns `false` when there is
    /// nothing to undo.
    pub fn undo(&self, doc_id: &str, path: &Path) -> Result<bool> {
        let mut stacks = self.stacks.lock().expect("history lock poisoned");
        let Some(entry) = stacks.get_mut(doc_id) else {
            return Ok(false);
        };
        let Some(snapshot) = entry.undo.pop_back() else {
            return Ok(false);
        };
        let current = fs::read(path)?;
        push_bounded(&mut entry.redo, current, self.max_depth);
        fs::write(path, snapshot)?;
        Ok(true)
    }

    /// Re-apply the last undone mutation. Returns `false` when there is
    /// nothing to redo.
    pub fn redo(&self, doc_id: &str, path: &Path) -> Result<bool> {
        let mut stacks = self.stacks.lock().expect("history lock poisoned");
        let Some(entry) = stacks.get_mut(doc_id) else {
            return Ok(false);
        };
        let Some(snapshot) = entry.redo.pop_back() else {
            return Ok(false);
        };
        let current = fs::read(path)?;
        push_bounded(&mut entry.undo, current, self.max_depth);
        fs::write(path, snapshot)?;
        Ok(true)
    }

    /// Current `(undo, redo)` stack depths for a document.
    pub fn depths(&self, doc_id: &str) -> (usize, usize) {
        let stacks = self.stacks.lock().expect("history lock poisoned");
        stacks
            .get(doc_id)
            .map(|e| (e.undo.len(), e.redo.len()))
            .unwrap_or((0, 0))
    }
}
