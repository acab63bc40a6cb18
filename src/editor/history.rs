//! Linear undo/redo over full buffer snapshots.
//!
//! `snapshots[0]` is the buffer as it was opened and is never discarded.
//! The current buffer is always `snapshots[cursor]`. Committing while the
//! cursor sits before the end drops every later snapshot.

use crate::audio::{PcmBuffer, SharedBuffer};

#[derive(Debug, Clone)]
pub struct EditHistory {
    snapshots: Vec<SharedBuffer>,
    cursor: usize,
}

impl EditHistory {
    pub fn new(original: impl Into<SharedBuffer>) -> Self {
        Self {
            snapshots: vec![original.into()],
            cursor: 0,
        }
    }

    pub fn current(&self) -> &SharedBuffer {
        &self.snapshots[self.cursor]
    }

    pub fn original(&self) -> &SharedBuffer {
        &self.snapshots[0]
    }

    pub fn commit(&mut self, buffer: impl Into<SharedBuffer>) -> &SharedBuffer {
        let discarded = self.snapshots.len() - (self.cursor + 1);
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push(buffer.into());
        self.cursor = self.snapshots.len() - 1;

        tracing::debug!(
            cursor = self.cursor,
            discarded,
            len = self.current().len(),
            "History commit"
        );
        self.current()
    }

    /// Step back one snapshot. `None` (and no change) at the original.
    pub fn undo(&mut self) -> Option<&SharedBuffer> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        tracing::debug!(cursor = self.cursor, "Undo");
        Some(self.current())
    }

    /// Step forward one snapshot. `None` (and no change) at the newest.
    pub fn redo(&mut self) -> Option<&SharedBuffer> {
        if self.cursor + 1 >= self.snapshots.len() {
            return None;
        }
        self.cursor += 1;
        tracing::debug!(cursor = self.cursor, "Redo");
        Some(self.current())
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Always false: the original snapshot is never dropped.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether the current snapshot differs from the original by identity.
    pub fn is_modified(&self) -> bool {
        !std::sync::Arc::ptr_eq(self.current(), self.original())
    }

    /// Commit a copy of the original as a new, undoable snapshot.
    pub fn revert_to_original(&mut self) -> &SharedBuffer {
        let original = self.original().clone();
        self.commit(original)
    }
}

impl From<PcmBuffer> for EditHistory {
    fn from(buffer: PcmBuffer) -> Self {
        Self::new(buffer)
    }
}
