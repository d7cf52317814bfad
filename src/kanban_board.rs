//! Board state: ordered columns of task ids, and the drop-move model.
//!
//! Every task id sits in exactly one column list. Construction rejects input
//! that would break that, and [`Board::apply_move`] preserves it: a move
//! either produces a new valid arrangement or leaves the board untouched.

use crate::error::{BoardError, Result};
use crate::task::Task;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Column definition as configured for an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub id: String,
    pub title: String,
}

impl ColumnSpec {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// The stock three-stage workflow.
pub fn default_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new("todo", "To Do"),
        ColumnSpec::new("in_progress", "In Progress"),
        ColumnSpec::new("done", "Done"),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub id: String,
    pub title: String,
    /// Manual arrangement, top to bottom.
    pub task_ids: Vec<String>,
}

/// Which side of the hovered card the dragged card lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropSide {
    Before,
    After,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// Over another card.
    Task { id: String, side: DropSide },
    /// Over the empty area of a column; the card goes to the end.
    Column { id: String },
}

impl DropTarget {
    pub fn before(id: impl Into<String>) -> Self {
        Self::Task {
            id: id.into(),
            side: DropSide::Before,
        }
    }

    pub fn after(id: impl Into<String>) -> Self {
        Self::Task {
            id: id.into(),
            side: DropSide::After,
        }
    }

    pub fn column(id: impl Into<String>) -> Self {
        Self::Column { id: id.into() }
    }
}

/// A completed drag: which card, where it came from, where it was released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveEvent {
    pub task_id: String,
    pub from_column: String,
    pub target: DropTarget,
}

impl MoveEvent {
    pub fn new(
        task_id: impl Into<String>,
        from_column: impl Into<String>,
        target: DropTarget,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            from_column: from_column.into(),
            target,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    UnknownTask,
    /// The event's source column no longer holds the task.
    StaleSource,
    UnknownColumn,
    UnknownTarget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Unchanged,
    Ignored(IgnoreReason),
    Reordered {
        column: String,
        from: usize,
        to: usize,
    },
    Moved {
        task: String,
        from_column: String,
        to_column: String,
        index: usize,
    },
}

impl MoveOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, MoveOutcome::Reordered { .. } | MoveOutcome::Moved { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Board {
    columns: Vec<Column>,
    tasks: HashMap<String, Task>,
}

impl Board {
    /// An empty board with the given columns.
    pub fn new(specs: &[ColumnSpec]) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut columns = Vec::with_capacity(specs.len());
        for spec in specs {
            if !seen.insert(spec.id.as_str()) {
                return Err(BoardError::duplicate_id("column", &spec.id));
            }
            columns.push(Column {
                id: spec.id.clone(),
                title: spec.title.clone(),
                task_ids: Vec::new(),
            });
        }
        Ok(Self {
            columns,
            tasks: HashMap::new(),
        })
    }

    /// Builds a board from a flat task list. Within a column, cards keep the
    /// order in which they appear in `tasks`.
    pub fn from_tasks(specs: &[ColumnSpec], tasks: impl IntoIterator<Item = Task>) -> Result<Self> {
        let mut board = Self::new(specs)?;
        for task in tasks {
            board.add_task(task)?;
        }
        Ok(board)
    }

    /// Appends a task to the end of its column.
    pub fn add_task(&mut self, task: Task) -> Result<()> {
        if self.tasks.contains_key(&task.id) {
            return Err(BoardError::duplicate_id("task", &task.id));
        }
        let column = self
            .columns
            .iter_mut()
            .find(|c| c.id == task.column)
            .ok_or_else(|| BoardError::UnknownColumn {
                task: task.id.clone(),
                column: task.column.clone(),
            })?;
        column.task_ids.push(task.id.clone());
        self.tasks.insert(task.id.clone(), task);
        Ok(())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Column currently holding the task.
    pub fn column_of(&self, task_id: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.task_ids.iter().any(|t| t == task_id))
    }

    pub fn tasks_in_column(&self, column: &str) -> Vec<&Task> {
        self.column(column)
            .map(|c| c.task_ids.iter().filter_map(|id| self.tasks.get(id)).collect())
            .unwrap_or_default()
    }

    /// Flat list in board order: columns left to right, cards top to bottom.
    pub fn to_records(&self) -> Vec<Task> {
        self.columns
            .iter()
            .flat_map(|c| c.task_ids.iter())
            .filter_map(|id| self.tasks.get(id).cloned())
            .collect()
    }

    /// Next free numeric id, formatted as `T<n>`.
    pub fn next_task_id(&self) -> Result<String> {
        let max = self
            .tasks
            .keys()
            .filter_map(|id| id.trim_start_matches('T').parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        let next = max.checked_add(1).ok_or_else(|| {
            BoardError::invalid_value("id", format!("no numeric id left after T{max}"))
        })?;
        Ok(format!("T{next}"))
    }

    /// Every task in exactly one column, and each column's task field agrees.
    pub fn check_invariant(&self) -> bool {
        let mut seen = HashSet::new();
        for column in &self.columns {
            for id in &column.task_ids {
                if !seen.insert(id.as_str()) {
                    return false;
                }
                match self.tasks.get(id) {
                    Some(task) if task.column == column.id => {}
                    _ => return false,
                }
            }
        }
        seen.len() == self.tasks.len()
    }

    fn column_index(&self, id: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.id == id)
    }

    fn column_index_of(&self, task_id: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.task_ids.iter().any(|t| t == task_id))
    }

    /// Applies a drop. Invalid targets are ignored and never reported as errors.
    pub fn apply_move(&mut self, event: &MoveEvent) -> MoveOutcome {
        let outcome = self.try_move(event);
        match &outcome {
            MoveOutcome::Ignored(reason) => {
                debug!(task = %event.task_id, ?reason, target = ?event.target, "drop ignored")
            }
            MoveOutcome::Unchanged => debug!(task = %event.task_id, "drop left board unchanged"),
            changed => debug!(?changed, "drop applied"),
        }
        outcome
    }

    fn try_move(&mut self, event: &MoveEvent) -> MoveOutcome {
        let Some(source) = self.column_index_of(&event.task_id) else {
            return MoveOutcome::Ignored(IgnoreReason::UnknownTask);
        };
        if self.columns[source].id != event.from_column {
            return MoveOutcome::Ignored(IgnoreReason::StaleSource);
        }

        let (dest, anchor) = match &event.target {
            DropTarget::Column { id } => match self.column_index(id) {
                Some(i) => (i, None),
                None => return MoveOutcome::Ignored(IgnoreReason::UnknownColumn),
            },
            DropTarget::Task { id, .. } if *id == event.task_id => return MoveOutcome::Unchanged,
            DropTarget::Task { id, side } => match self.column_index_of(id) {
                Some(i) => (i, Some((id.as_str(), *side))),
                None => return MoveOutcome::Ignored(IgnoreReason::UnknownTarget),
            },
        };

        let moving = event.task_id.clone();
        let Some(from) = self.columns[source].task_ids.iter().position(|t| *t == moving) else {
            return MoveOutcome::Ignored(IgnoreReason::UnknownTask);
        };

        let mut list: Vec<String> = self.columns[dest]
            .task_ids
            .iter()
            .filter(|t| **t != moving)
            .cloned()
            .collect();
        let to = match anchor {
            None => list.len(),
            Some((anchor_id, side)) => {
                let Some(i) = list.iter().position(|t| t == anchor_id) else {
                    return MoveOutcome::Ignored(IgnoreReason::UnknownTarget);
                };
                match side {
                    DropSide::Before => i,
                    DropSide::After => i + 1,
                }
            }
        };

        if source == dest {
            if to == from {
                return MoveOutcome::Unchanged;
            }
            list.insert(to, moving);
            self.columns[dest].task_ids = list;
            return MoveOutcome::Reordered {
                column: self.columns[dest].id.clone(),
                from,
                to,
            };
        }

        self.columns[source].task_ids.remove(from);
        list.insert(to, moving.clone());
        self.columns[dest].task_ids = list;
        let to_column = self.columns[dest].id.clone();
        if let Some(task) = self.tasks.get_mut(&moving) {
            task.column = to_column.clone();
        }

        MoveOutcome::Moved {
            task: moving,
            from_column: self.columns[source].id.clone(),
            to_column,
            index: to,
        }
    }
}

/// Pure form of [`Board::apply_move`]: returns the board after the drop.
pub fn compute_new_board_state(board: &Board, event: &MoveEvent) -> Board {
    let mut next = board.clone();
    next.apply_move(event);
    next
}
