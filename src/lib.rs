//! Ward task board: the Kanban slice of a hospital administration dashboard.
//!
//! [`kanban_board`] holds the board model and the drop-move rules,
//! [`drag`] turns pointer lifecycles into moves, [`reconciler`] persists the
//! outcome through a [`store::TaskStore`], and [`settings_cache`] caches
//! organization settings for the length of a session.

pub mod cli;
pub mod commands;
pub mod config;
pub mod drag;
pub mod error;
pub mod kanban_board;
pub mod logging;
pub mod reconciler;
pub mod settings_cache;
pub mod store;
pub mod task;
pub mod ui;

pub use error::{BoardError, Result};
pub use kanban_board::{
    compute_new_board_state, Board, Column, ColumnSpec, DropSide, DropTarget, MoveEvent,
    MoveOutcome,
};
pub use task::{Priority, RawTask, Task};
