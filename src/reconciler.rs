use crate::error::Result;
use crate::kanban_board::{Board, ColumnSpec, MoveEvent, MoveOutcome};
use crate::store::TaskStore;
use tracing::info;

/// Applies drops to the board and writes changed arrangements to the store.
#[derive(Debug)]
pub struct Reconciler<S> {
    store: S,
}

impl<S: TaskStore> Reconciler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn load_board(&self, columns: &[ColumnSpec]) -> Result<Board> {
        Board::from_tasks(columns, self.store.load()?)
    }

    /// The board is updated even if saving fails; the error is returned so the
    /// caller can tell the user the change is not yet durable.
    pub fn drop(&mut self, board: &mut Board, event: &MoveEvent) -> Result<MoveOutcome> {
        let outcome = board.apply_move(event);
        if outcome.changed() {
            if let MoveOutcome::Moved {
                task,
                from_column,
                to_column,
                ..
            } = &outcome
            {
                info!(%task, from = %from_column, to = %to_column, "task moved");
            }
            self.store.save(&board.to_records())?;
        }
        Ok(outcome)
    }

    /// Persists the board as it stands, e.g. after adding a task.
    pub fn save(&mut self, board: &Board) -> Result<()> {
        self.store.save(&board.to_records())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kanban_board::{default_columns, DropTarget};
    use crate::store::MemoryTaskStore;
    use crate::task::Task;

    fn setup() -> (Reconciler<MemoryTaskStore>, Board) {
        let store = MemoryTaskStore::new(vec![
            Task::new("T1", "Check fire permits", "todo"),
            Task::new("T2", "Service ambulance", "todo"),
        ]);
        let reconciler = Reconciler::new(store);
        let board = reconciler.load_board(&default_columns()).unwrap();
        (reconciler, board)
    }

    #[test]
    fn test_moved_task_is_persisted() {
        let (mut reconciler, mut board) = setup();
        let outcome = reconciler
            .drop(&mut board, &MoveEvent::new("T1", "todo", DropTarget::column("done")))
            .unwrap();
        assert!(outcome.changed());
        let saved = &reconciler.store().tasks;
        assert_eq!(reconciler.store().saves, 1);
        let t1 = saved.iter().find(|t| t.id == "T1").unwrap();
        assert_eq!(t1.column, "done");
    }

    #[test]
    fn test_noop_and_ignored_drops_do_not_save() {
        let (mut reconciler, mut board) = setup();
        reconciler
            .drop(&mut board, &MoveEvent::new("T1", "todo", DropTarget::before("T2")))
            .unwrap();
        reconciler
            .drop(&mut board, &MoveEvent::new("T1", "todo", DropTarget::column("archive")))
            .unwrap();
        assert_eq!(reconciler.store().saves, 0);
    }

    #[test]
    fn test_reorder_survives_reload() {
        let (mut reconciler, mut board) = setup();
        reconciler
            .drop(&mut board, &MoveEvent::new("T2", "todo", DropTarget::before("T1")))
            .unwrap();
        let reloaded = reconciler.load_board(&default_columns()).unwrap();
        assert_eq!(reloaded.column("todo").unwrap().task_ids, ["T2", "T1"]);
    }
}
