//! Pointer-drag lifecycle: start, hover, drop, cancel.
//!
//! The controller only tracks what is being dragged and what it is over. The
//! actual rearrangement is [`Board::apply_move`], so everything here stays
//! usable without a terminal.

use crate::kanban_board::{compute_new_board_state, Board, DropTarget, MoveEvent};
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragEvent {
    Start { task_id: String },
    Over { target: Option<DropTarget> },
    Drop,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveDrag {
    pub task_id: String,
    pub origin_column: String,
    pub over: Option<DropTarget>,
}

#[derive(Debug, Default)]
pub struct DragController {
    active: Option<ActiveDrag>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&ActiveDrag> {
        self.active.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    /// Picks up a card. Returns false if the board has no such task.
    pub fn start(&mut self, board: &Board, task_id: &str) -> bool {
        let Some(column) = board.column_of(task_id) else {
            return false;
        };
        trace!(task = task_id, column = %column.id, "drag start");
        self.active = Some(ActiveDrag {
            task_id: task_id.to_string(),
            origin_column: column.id.clone(),
            over: None,
        });
        true
    }

    pub fn over(&mut self, target: Option<DropTarget>) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        // Hovering the card being dragged says nothing about where it should go.
        if let Some(DropTarget::Task { id, .. }) = &target {
            if *id == active.task_id {
                return;
            }
        }
        active.over = target;
    }

    /// Releases the card. `None` when nothing was dragged or it was not over a target.
    pub fn drop(&mut self) -> Option<MoveEvent> {
        let active = self.active.take()?;
        let target = active.over?;
        Some(MoveEvent {
            task_id: active.task_id,
            from_column: active.origin_column,
            target,
        })
    }

    pub fn cancel(&mut self) {
        if let Some(active) = self.active.take() {
            trace!(task = %active.task_id, "drag cancelled");
        }
    }

    pub fn handle(&mut self, board: &Board, event: DragEvent) -> Option<MoveEvent> {
        match event {
            DragEvent::Start { task_id } => {
                self.start(board, &task_id);
                None
            }
            DragEvent::Over { target } => {
                self.over(target);
                None
            }
            DragEvent::Drop => self.drop(),
            DragEvent::Cancel => {
                self.cancel();
                None
            }
        }
    }

    /// The board as it would look if the card were released now.
    pub fn preview(&self, board: &Board) -> Board {
        match &self.active {
            Some(ActiveDrag {
                task_id,
                origin_column,
                over: Some(target),
            }) => compute_new_board_state(
                board,
                &MoveEvent::new(task_id.as_str(), origin_column.as_str(), target.clone()),
            ),
            _ => board.clone(),
        }
    }
}

/// Converts a keyboard slot (position among the column's cards other than
/// `dragged`) into a drop target. Slots past the end, or in an empty column,
/// target the column itself.
pub fn slot_target(board: &Board, column: &str, slot: usize, dragged: &str) -> Option<DropTarget> {
    let column = board.column(column)?;
    let others: Vec<&String> = column.task_ids.iter().filter(|t| *t != dragged).collect();
    Some(match others.get(slot) {
        Some(id) => DropTarget::before(id.as_str()),
        None => DropTarget::column(column.id.as_str()),
    })
}

/// Number of slots in a column while `dragged` is lifted out of it.
pub fn slot_count(board: &Board, column: &str, dragged: &str) -> usize {
    board
        .column(column)
        .map(|c| c.task_ids.iter().filter(|t| *t != dragged).count() + 1)
        .unwrap_or(0)
}
