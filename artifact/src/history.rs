//! Bounded undo/redo over [`SlidesState`].
//!
//! Both stacks are most-recent-first and capped at [`SNAPSHOT_CAPACITY`];
//! eviction silently drops the oldest snapshot. A fresh push always clears
//! the redo stack: an edit and a redo branch are mutually exclusive
//! histories.

use crate::error::{DeckError, Result};
use crate::types::{Deck, SlidesState};

/// Maximum number of snapshots kept on each of the past/future stacks.
pub const SNAPSHOT_CAPACITY: usize = 20;

/// Record `prior` (the deck before an edit) on the undo stack and clear
/// the redo stack.
pub fn push_snapshot(mut state: SlidesState, prior: Deck) -> SlidesState {
    state.past.insert(0, prior);
    state.past.truncate(SNAPSHOT_CAPACITY);
    state.future.clear();
    state
}

/// Restore the most recent snapshot; the current deck moves onto the redo
/// stack.
pub fn undo_state(mut state: SlidesState) -> Result<SlidesState> {
    if state.past.is_empty() {
        return Err(DeckError::NothingToUndo);
    }
    let restored = state.past.remove(0);
    let current = std::mem::replace(&mut state.deck, restored);
    state.future.insert(0, current);
    state.future.truncate(SNAPSHOT_CAPACITY);
    Ok(state)
}

/// Re-apply the most recently undone deck; the current deck moves back
/// onto the undo stack.
pub fn redo_state(mut state: SlidesState) -> Result<SlidesState> {
    if state.future.is_empty() {
        return Err(DeckError::NothingToRedo);
    }
    let restored = state.future.remove(0);
    let current = std::mem::replace(&mut state.deck, restored);
    state.past.insert(0, current);
    state.past.truncate(SNAPSHOT_CAPACITY);
    Ok(state)
}
