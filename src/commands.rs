//! Subcommand implementations and the session they share with the TUI.

use crate::cli::Commands;
use crate::config::Config;
use crate::error::{BoardError, Result};
use crate::kanban_board::{Board, DropTarget, MoveEvent, MoveOutcome};
use crate::reconciler::Reconciler;
use crate::settings_cache::{FileSettingsSource, OrganizationSettings, SettingsCache};
use crate::store::JsonTaskStore;
use crate::task::{Priority, Task, DATE_FORMAT};
use chrono::{Local, NaiveDate};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Everything one run of the program works against. Owns its settings cache,
/// so cached settings live exactly as long as the session.
pub struct Session {
    pub config: Config,
    pub settings: SettingsCache<FileSettingsSource>,
    pub reconciler: Reconciler<JsonTaskStore>,
}

impl Session {
    pub fn open(config: Config) -> Self {
        let source = FileSettingsSource::new(&config.settings_file).with_fallback(true);
        let settings = SettingsCache::new(source, config.settings_ttl());
        let reconciler = Reconciler::new(JsonTaskStore::new(&config.data_file));
        Self {
            config,
            settings,
            reconciler,
        }
    }

    pub fn organization(&self) -> Result<Arc<OrganizationSettings>> {
        self.settings.get(&self.config.organization)
    }

    pub fn load_board(&self) -> Result<Board> {
        let settings = self.organization()?;
        self.reconciler.load_board(&settings.columns)
    }
}

/// Runs one subcommand. `config` is what [`Config::load`] returned for
/// `config_path`, defaults included when the file does not exist yet.
pub fn execute(command: Commands, config_path: &Path, config: Config) -> Result<()> {
    let mut session = Session::open(config);
    match command {
        Commands::Init => init(config_path, &session.config)?,
        Commands::Add {
            title,
            column,
            priority,
            category,
            due,
            assignee,
            description,
        } => {
            let mut board = session.load_board()?;
            let column = match column {
                Some(c) => c,
                None => board
                    .columns()
                    .first()
                    .map(|c| c.id.clone())
                    .ok_or_else(|| BoardError::invalid_value("column", "board has no columns"))?,
            };
            let title = title.trim();
            if title.is_empty() {
                return Err(BoardError::missing_field("title"));
            }
            let mut task = Task::new(board.next_task_id()?, title, column)
                .with_priority(priority)
                .with_category(category);
            task.due_date = due;
            if let Some(assignee) = assignee.filter(|a| !a.trim().is_empty()) {
                task = task.with_assignee(assignee.trim());
            }
            if let Some(description) = description.filter(|d| !d.trim().is_empty()) {
                task = task.with_description(description.trim());
            }
            let id = task.id.clone();
            board.add_task(task)?;
            session.reconciler.save(&board)?;
            println!("Added {id}");
        }
        Commands::Show => {
            let settings = session.organization()?;
            let board = session.load_board()?;
            print!("{}", render_board(&settings.board_title, &board));
        }
        Commands::List => {
            let board = session.load_board()?;
            for task in board.to_records() {
                println!(
                    "{}\t{}\t{}\t{}",
                    task.id, task.column, task.priority, task.title
                );
            }
        }
        Commands::Move {
            task,
            to_column,
            before,
            after,
        } => {
            let mut board = session.load_board()?;
            let from_column = board
                .column_of(&task)
                .map(|c| c.id.clone())
                .ok_or_else(|| BoardError::TaskNotFound { id: task.clone() })?;
            let target = match (before, after) {
                (Some(id), _) => DropTarget::before(id),
                (None, Some(id)) => DropTarget::after(id),
                (None, None) => match &to_column {
                    Some(column) => DropTarget::column(column.as_str()),
                    None => {
                        return Err(BoardError::missing_field("--to-column, --before or --after"))
                    }
                },
            };
            // --before/--after only refine a position inside --to-column.
            if let (Some(column), DropTarget::Task { id: anchor, .. }) = (&to_column, &target) {
                let anchor_column = board.column_of(anchor).map(|c| c.id.as_str());
                if anchor_column != Some(column.as_str()) {
                    return Err(BoardError::invalid_value(
                        "--to-column",
                        format!("task '{anchor}' is not in column '{column}'"),
                    ));
                }
            }
            let outcome = session
                .reconciler
                .drop(&mut board, &MoveEvent::new(task, from_column, target))?;
            println!("{}", describe(&outcome));
        }
        Commands::Stats => {
            let board = session.load_board()?;
            let today = Local::now().date_naive();
            print!("{}", BoardStats::collect(&board, today));
        }
        Commands::Tui => crate::ui::run(&mut session)?,
    }
    Ok(())
}

fn init(config_path: &Path, config: &Config) -> Result<()> {
    if config_path.exists() {
        println!("Board already initialized at {}", config_path.display());
        return Ok(());
    }
    if let Some(dir) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Config::default().save(config_path)?;

    if !config.settings_file.exists() {
        let mut orgs = HashMap::new();
        orgs.insert(config.organization.clone(), OrganizationSettings::default());
        fs::write(&config.settings_file, serde_json::to_string_pretty(&orgs)?)?;
    }
    if !config.data_file.exists() {
        fs::write(&config.data_file, "[]")?;
    }
    info!(path = %config_path.display(), "initialized board");
    println!("Board initialized at {}", config_path.display());
    Ok(())
}

pub fn describe(outcome: &MoveOutcome) -> String {
    match outcome {
        MoveOutcome::Unchanged => "Already there; nothing to do".to_string(),
        MoveOutcome::Ignored(reason) => format!("Nothing moved ({reason:?})"),
        MoveOutcome::Reordered { column, from, to } => {
            format!("Reordered in {column}: position {} -> {}", from + 1, to + 1)
        }
        MoveOutcome::Moved {
            task,
            from_column,
            to_column,
            index,
        } => format!("Moved {task} from {from_column} to {to_column} at position {}", index + 1),
    }
}

pub fn render_board(title: &str, board: &Board) -> String {
    let mut out = format!("{title}\n");
    for column in board.columns() {
        out.push_str(&format!("\n{} ({}):\n", column.title, column.task_ids.len()));
        for task in board.tasks_in_column(&column.id) {
            out.push_str(&format!("- [{}] {}", task.id, task.title));
            let mut meta = vec![task.priority.to_string()];
            if !task.category.is_empty() {
                meta.push(task.category.clone());
            }
            if let Some(due) = task.due_date {
                meta.push(format!("due {}", due.format(DATE_FORMAT)));
            }
            if let Some(assignee) = &task.assignee {
                meta.push(assignee.clone());
            }
            out.push_str(&format!(" ({})\n", meta.join(", ")));
        }
    }
    out
}

#[derive(Debug, PartialEq)]
pub struct BoardStats {
    pub per_column: Vec<(String, usize)>,
    pub per_priority: BTreeMap<Priority, usize>,
    pub overdue: usize,
}

impl BoardStats {
    /// Overdue counts only tasks outside the last column, which is taken to be "done".
    pub fn collect(board: &Board, today: NaiveDate) -> Self {
        let per_column = board
            .columns()
            .iter()
            .map(|c| (c.title.clone(), c.task_ids.len()))
            .collect();
        let mut per_priority = BTreeMap::new();
        for task in board.to_records() {
            *per_priority.entry(task.priority).or_insert(0) += 1;
        }
        let last = board.columns().last().map(|c| c.id.as_str());
        let overdue = board
            .to_records()
            .iter()
            .filter(|t| Some(t.column.as_str()) != last && t.is_overdue(today))
            .count();
        Self {
            per_column,
            per_priority,
            overdue,
        }
    }
}

impl std::fmt::Display for BoardStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (column, count) in &self.per_column {
            writeln!(f, "{column}: {count}")?;
        }
        for priority in Priority::ALL {
            let count = self.per_priority.get(&priority).copied().unwrap_or(0);
            writeln!(f, "{priority}: {count}")?;
        }
        writeln!(f, "overdue: {}", self.overdue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kanban_board::default_columns;

    fn board() -> Board {
        let d = |day| NaiveDate::from_ymd_opt(2026, 10, day).unwrap();
        Board::from_tasks(
            &default_columns(),
            vec![
                Task::new("T1", "Fleet inspection", "todo")
                    .with_priority(Priority::High)
                    .with_due_date(d(1)),
                Task::new("T2", "Update staff records", "in_progress")
                    .with_category("people")
                    .with_assignee("M. Rossi"),
                Task::new("T3", "File permit", "done").with_due_date(d(2)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_stats() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let stats = BoardStats::collect(&board(), today);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.per_priority.get(&Priority::High), Some(&1));
        assert_eq!(stats.per_priority.get(&Priority::Medium), Some(&2));
        let text = stats.to_string();
        assert!(text.contains("To Do: 1"));
        assert!(text.contains("low: 0"));
    }

    #[test]
    fn test_render_board() {
        let text = render_board("Admin", &board());
        assert!(text.starts_with("Admin\n"));
        assert!(text.contains("In Progress (1):"));
        assert!(text.contains("- [T2] Update staff records (medium, people, M. Rossi)"));
        assert!(text.contains("due 2026-10-01"));
    }

    #[test]
    fn test_describe() {
        let text = describe(&MoveOutcome::Moved {
            task: "T1".into(),
            from_column: "todo".into(),
            to_column: "done".into(),
            index: 0,
        });
        assert_eq!(text, "Moved T1 from todo to done at position 1");
    }
}
