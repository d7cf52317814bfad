use std::fs;
use tempfile::TempDir;
use wardboard::cli::Commands;
use wardboard::commands::{execute, Session};
use wardboard::config::{Config, DEFAULT_CONFIG_FILE};
use wardboard::task::Priority;

fn add(title: &str, column: Option<&str>) -> Commands {
    Commands::Add {
        title: title.to_string(),
        column: column.map(str::to_string),
        priority: Priority::High,
        category: "vehicles".to_string(),
        due: None,
        assignee: Some("J. Adeyemi".to_string()),
        description: Some("  Ask the fleet office first ".to_string()),
    }
}

fn run(dir: &TempDir, command: Commands) -> wardboard::Result<()> {
    let path = dir.path().join(DEFAULT_CONFIG_FILE);
    let config = Config::load(&path)?;
    execute(command, &path, config)
}

fn session(dir: &TempDir) -> Session {
    Session::open(Config::load(&dir.path().join(DEFAULT_CONFIG_FILE)).unwrap())
}

#[test]
fn init_writes_files_once() {
    let dir = TempDir::new().unwrap();
    run(&dir, Commands::Init).unwrap();
    assert!(dir.path().join(DEFAULT_CONFIG_FILE).exists());
    assert!(dir.path().join("settings.json").exists());
    assert_eq!(fs::read_to_string(dir.path().join("tasks.json")).unwrap(), "[]");

    fs::write(dir.path().join("tasks.json"), "[]\n").unwrap();
    run(&dir, Commands::Init).unwrap();
    assert_eq!(fs::read_to_string(dir.path().join("tasks.json")).unwrap(), "[]\n");
}

#[test]
fn add_then_move_persists() {
    let dir = TempDir::new().unwrap();
    run(&dir, Commands::Init).unwrap();
    run(&dir, add("Renew ambulance permit", None)).unwrap();
    run(&dir, add("Register new company", Some("in_progress"))).unwrap();
    run(&dir, add("Import staff list", None)).unwrap();

    let board = session(&dir).load_board().unwrap();
    assert_eq!(board.column("todo").unwrap().task_ids, ["T1", "T3"]);
    let t1 = board.task("T1").unwrap();
    assert_eq!(t1.priority, Priority::High);
    assert_eq!(t1.description.as_deref(), Some("Ask the fleet office first"));

    run(
        &dir,
        Commands::Move {
            task: "T3".into(),
            to_column: None,
            before: Some("T2".into()),
            after: None,
        },
    )
    .unwrap();

    let board = session(&dir).load_board().unwrap();
    assert_eq!(board.column("todo").unwrap().task_ids, ["T1"]);
    assert_eq!(board.column("in_progress").unwrap().task_ids, ["T3", "T2"]);
    assert_eq!(board.task("T3").unwrap().column, "in_progress");
}

#[test]
fn move_anchor_must_sit_in_the_named_column() {
    let dir = TempDir::new().unwrap();
    run(&dir, Commands::Init).unwrap();
    run(&dir, add("Renew ambulance permit", None)).unwrap();
    run(&dir, add("Register new company", None)).unwrap();
    run(&dir, add("Archive old permits", Some("done"))).unwrap();

    let mismatched = Commands::Move {
        task: "T1".into(),
        to_column: Some("done".into()),
        before: None,
        after: Some("T2".into()),
    };
    assert!(run(&dir, mismatched).is_err());
    let board = session(&dir).load_board().unwrap();
    assert_eq!(board.column("todo").unwrap().task_ids, ["T1", "T2"]);
    assert_eq!(board.task("T1").unwrap().column, "todo");

    let matching = Commands::Move {
        task: "T1".into(),
        to_column: Some("done".into()),
        before: Some("T3".into()),
        after: None,
    };
    run(&dir, matching).unwrap();
    let board = session(&dir).load_board().unwrap();
    assert_eq!(board.column("done").unwrap().task_ids, ["T1", "T3"]);
    assert_eq!(board.task("T1").unwrap().column, "done");
}

#[test]
fn add_to_unknown_column_fails() {
    let dir = TempDir::new().unwrap();
    run(&dir, Commands::Init).unwrap();
    assert!(run(&dir, add("Lost task", Some("archive"))).is_err());
    assert!(session(&dir).load_board().unwrap().is_empty());
}

#[test]
fn move_unknown_task_is_an_error_but_bad_target_is_not() {
    let dir = TempDir::new().unwrap();
    run(&dir, Commands::Init).unwrap();
    run(&dir, add("Check permits", None)).unwrap();

    let missing = Commands::Move {
        task: "T9".into(),
        to_column: Some("done".into()),
        before: None,
        after: None,
    };
    assert!(run(&dir, missing).is_err());

    let nowhere = Commands::Move {
        task: "T1".into(),
        to_column: Some("archive".into()),
        before: None,
        after: None,
    };
    run(&dir, nowhere).unwrap();
    assert_eq!(
        session(&dir).load_board().unwrap().task("T1").unwrap().column,
        "todo"
    );
}

#[test]
fn settings_columns_drive_the_board() {
    let dir = TempDir::new().unwrap();
    run(&dir, Commands::Init).unwrap();
    fs::write(
        dir.path().join("settings.json"),
        r#"{"default": {"name": "St. Anne", "board_title": "Admin", "columns": [
            {"id": "intake", "title": "Intake"}, {"id": "closed", "title": "Closed"}]}}"#,
    )
    .unwrap();
    run(&dir, add("Review vendor", None)).unwrap();

    let session = session(&dir);
    assert_eq!(session.organization().unwrap().board_title, "Admin");
    let board = session.load_board().unwrap();
    assert_eq!(board.column("intake").unwrap().task_ids, ["T1"]);
}
