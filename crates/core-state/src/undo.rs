use core_text::Buffer;
use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;
use tracing::trace;

use crate::Selection;

/// Maximum number of snapshots retained in undo history.
pub const UNDO_HISTORY_MAX: usize = 200;

/// A full-state snapshot for undo/redo (coarse clone; buffers here are small).
#[derive(Clone)]
pub struct EditSnapshot {
    pub buffer: Buffer,
    pub selection: Selection,
    pub caret: usize,
    /// Content hash of the buffer at snapshot capture.
    pub hash: u64,
}

/// Undo grouping state. While a group is open every edit folds into the
/// snapshot taken when the outermost group began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupState {
    Inactive,
    Active { depth: u32, edits: u32 },
}

pub struct UndoEngine {
    undo_stack: Vec<EditSnapshot>,
    redo_stack: Vec<EditSnapshot>,
    group: GroupState,
}

impl Default for UndoEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoEngine {
    pub fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            group: GroupState::Inactive,
        }
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }
    pub fn group(&self) -> GroupState {
        self.group
    }
    pub fn push_snapshot(&mut self, buffer: &Buffer, selection: Selection, caret: usize) {
        let current_hash = buffer_hash(buffer);
        if let Some(last) = self.undo_stack.last()
            && last.hash == current_hash
        {
            trace!(target: "state.undo", undo_depth = self.undo_stack.len(), redo_depth = self.redo_stack.len(), hash = current_hash, "snapshot_dedupe_skip");
            self.redo_stack.clear();
            return;
        }
        self.undo_stack.push(EditSnapshot {
            buffer: buffer.clone(),
            selection,
            caret,
            hash: current_hash,
        });
        trace!(target: "state.undo", undo_depth = self.undo_stack.len(), redo_depth = self.redo_stack.len(), bytes = buffer.len_bytes(), hash = current_hash, "push_snapshot");
        if self.undo_stack.len() > UNDO_HISTORY_MAX {
            let _ = self.undo_stack.remove(0);
            trace!(target: "state.undo", "undo_stack_trimmed");
        }
        self.redo_stack.clear();
    }

    /// Open a group; only the outermost `begin_group` records a snapshot.
    pub fn begin_group(&mut self, buffer: &Buffer, selection: Selection, caret: usize) {
        self.group = match self.group {
            GroupState::Inactive => {
                self.push_snapshot(buffer, selection, caret);
                GroupState::Active { depth: 1, edits: 0 }
            }
            GroupState::Active { depth, edits } => GroupState::Active {
                depth: depth + 1,
                edits,
            },
        };
        trace!(target: "state.undo", group = ?self.group, "begin_group");
    }

    pub fn end_group(&mut self) {
        self.group = match self.group {
            GroupState::Inactive => GroupState::Inactive,
            GroupState::Active { depth: 1, edits } => {
                trace!(target: "state.undo", edits, "group_closed");
                GroupState::Inactive
            }
            GroupState::Active { depth, edits } => GroupState::Active {
                depth: depth - 1,
                edits,
            },
        };
    }

    /// Record the pre-edit state unless a group already covers it.
    pub fn before_edit(&mut self, buffer: &Buffer, selection: Selection, caret: usize) {
        match &mut self.group {
            GroupState::Active { edits, .. } => *edits += 1,
            GroupState::Inactive => self.push_snapshot(buffer, selection, caret),
        }
    }

    pub fn undo(&mut self, buffer: &mut Buffer, selection: &mut Selection, caret: &mut usize) -> bool {
        let Some(last) = self.undo_stack.pop() else {
            return false;
        };
        trace!(target: "state.undo", undo_depth = self.undo_stack.len(), redo_depth = self.redo_stack.len(), "undo_pop");
        self.redo_stack.push(EditSnapshot {
            buffer: buffer.clone(),
            selection: *selection,
            caret: *caret,
            hash: buffer_hash(buffer),
        });
        *buffer = last.buffer;
        *selection = last.selection;
        *caret = last.caret;
        true
    }

    pub fn redo(&mut self, buffer: &mut Buffer, selection: &mut Selection, caret: &mut usize) -> bool {
        let Some(next) = self.redo_stack.pop() else {
            return false;
        };
        trace!(target: "state.undo", redo_depth = self.redo_stack.len(), undo_depth = self.undo_stack.len(), "redo_pop");
        self.undo_stack.push(EditSnapshot {
            buffer: buffer.clone(),
            selection: *selection,
            caret: *caret,
            hash: buffer_hash(buffer),
        });
        *buffer = next.buffer;
        *selection = next.selection;
        *caret = next.caret;
        true
    }
}

fn buffer_hash(buf: &Buffer) -> u64 {
    let mut h = DefaultHasher::new();
    for i in 0..buf.line_count() {
        if let Some(l) = buf.line(i) {
            h.write(l.as_bytes());
        }
    }
    h.finish()
}
