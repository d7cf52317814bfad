use crate::commands::{describe, Session};
use crate::drag::{slot_count, slot_target, DragController};
use crate::error::{BoardError, Result};
use crate::kanban_board::{Board, DropTarget};
use crate::task::{Priority, Task, DATE_FORMAT};
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame, Terminal,
};
use std::io;
use tracing::warn;

/// Rows per card: title line and details line.
const CARD_HEIGHT: u16 = 2;

const HELP: &str = "←→↑↓ select  space pick up  enter drop  esc cancel  r reload settings  q quit";

/// Where a column landed on screen during the last draw, for mouse hit-testing.
#[derive(Debug, Clone)]
struct RenderedColumn {
    id: String,
    area: Rect,
    task_ids: Vec<String>,
}

pub struct App<'a> {
    session: &'a mut Session,
    board: Board,
    title: String,
    drag: DragController,
    column: usize,
    row: usize,
    drop_column: usize,
    slot: usize,
    status: String,
    rendered: Vec<RenderedColumn>,
    should_quit: bool,
}

impl<'a> App<'a> {
    pub fn new(session: &'a mut Session) -> Result<Self> {
        let settings = session.organization()?;
        let board = session.load_board()?;
        Ok(Self {
            title: settings.board_title.clone(),
            session,
            board,
            drag: DragController::new(),
            column: 0,
            row: 0,
            drop_column: 0,
            slot: 0,
            status: HELP.to_string(),
            rendered: Vec::new(),
            should_quit: false,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    fn selected_task(&self) -> Option<String> {
        self.board
            .columns()
            .get(self.column)?
            .task_ids
            .get(self.row)
            .cloned()
    }

    fn column_len(&self, index: usize) -> usize {
        self.board
            .columns()
            .get(index)
            .map(|c| c.task_ids.len())
            .unwrap_or(0)
    }

    fn clamp_row(&mut self) {
        let len = self.column_len(self.column);
        self.row = self.row.min(len.saturating_sub(1));
    }

    /// Moves the cursor onto a task wherever it now sits.
    fn focus(&mut self, task_id: &str) {
        for (c, column) in self.board.columns().iter().enumerate() {
            if let Some(r) = column.task_ids.iter().position(|t| t == task_id) {
                self.column = c;
                self.row = r;
                return;
            }
        }
    }

    pub fn on_key(&mut self, code: KeyCode) {
        if self.drag.is_dragging() {
            match code {
                KeyCode::Left => self.shift_drop_column(-1),
                KeyCode::Right => self.shift_drop_column(1),
                KeyCode::Up => {
                    if self.slot > 0 {
                        self.slot -= 1;
                        self.hover_slot();
                    }
                }
                KeyCode::Down => {
                    if self.slot + 1 < self.current_slot_count() {
                        self.slot += 1;
                        self.hover_slot();
                    }
                }
                KeyCode::Enter => self.finish_drag(),
                KeyCode::Esc => {
                    self.drag.cancel();
                    self.status = "Move cancelled".to_string();
                }
                _ => {}
            }
            return;
        }

        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Left => {
                if self.column > 0 {
                    self.column -= 1;
                    self.clamp_row();
                }
            }
            KeyCode::Right => {
                if self.column + 1 < self.board.columns().len() {
                    self.column += 1;
                    self.clamp_row();
                }
            }
            KeyCode::Up => {
                if self.row > 0 {
                    self.row -= 1;
                }
            }
            KeyCode::Down => {
                if self.row + 1 < self.column_len(self.column) {
                    self.row += 1;
                }
            }
            KeyCode::Char(' ') => self.pick_up(),
            KeyCode::Char('r') => self.reload(),
            _ => {}
        }
    }

    pub fn on_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(DropTarget::Task { id, .. }) = self.hit_test(mouse.column, mouse.row) {
                    self.focus(&id);
                    if self.drag.start(&self.board, &id) {
                        self.status = format!("Moving {id}: release over a card or column");
                    }
                }
            }
            MouseEventKind::Drag(MouseButton::Left) if self.drag.is_dragging() => {
                let target = self.hit_test(mouse.column, mouse.row);
                self.drag.over(target);
            }
            MouseEventKind::Up(MouseButton::Left) if self.drag.is_dragging() => self.finish_drag(),
            _ => {}
        }
    }

    fn pick_up(&mut self) {
        let Some(id) = self.selected_task() else {
            return;
        };
        if self.drag.start(&self.board, &id) {
            self.drop_column = self.column;
            self.slot = self.row;
            self.hover_slot();
            self.status = format!("Moving {id}: arrows choose a place, enter drops, esc cancels");
        }
    }

    fn current_slot_count(&self) -> usize {
        match (self.drag.active(), self.board.columns().get(self.drop_column)) {
            (Some(active), Some(column)) => slot_count(&self.board, &column.id, &active.task_id),
            _ => 0,
        }
    }

    fn shift_drop_column(&mut self, delta: isize) {
        let last = self.board.columns().len().saturating_sub(1) as isize;
        self.drop_column = (self.drop_column as isize + delta).clamp(0, last) as usize;
        self.slot = self.slot.min(self.current_slot_count().saturating_sub(1));
        self.hover_slot();
    }

    fn hover_slot(&mut self) {
        let target = match (self.drag.active(), self.board.columns().get(self.drop_column)) {
            (Some(active), Some(column)) => {
                slot_target(&self.board, &column.id, self.slot, &active.task_id)
            }
            _ => None,
        };
        self.drag.over(target);
    }

    fn finish_drag(&mut self) {
        let Some(event) = self.drag.drop() else {
            self.status = "Nothing moved".to_string();
            return;
        };
        match self.session.reconciler.drop(&mut self.board, &event) {
            Ok(outcome) => self.status = describe(&outcome),
            Err(err) => {
                warn!(%err, task = %event.task_id, "could not save board");
                self.status = format!("Moved, but saving failed: {err}");
            }
        }
        self.focus(&event.task_id);
    }

    /// Drops cached settings and reloads both settings and tasks.
    fn reload(&mut self) {
        let org = self.session.config.organization.clone();
        self.session.settings.invalidate(&org);
        let reloaded = self
            .session
            .organization()
            .and_then(|settings| Ok((settings, self.session.load_board()?)));
        match reloaded {
            Ok((settings, board)) => {
                self.title = settings.board_title.clone();
                self.board = board;
                self.column = self.column.min(self.board.columns().len().saturating_sub(1));
                self.clamp_row();
                self.status = "Settings reloaded".to_string();
            }
            Err(err) => {
                warn!(%err, "reload failed");
                self.status = format!("Reload failed: {err}");
            }
        }
    }

    fn hit_test(&self, x: u16, y: u16) -> Option<DropTarget> {
        let column = self.rendered.iter().find(|c| {
            x >= c.area.x && x < c.area.right() && y >= c.area.y && y < c.area.bottom()
        })?;
        let offset = y - column.area.y;
        let index = (offset / CARD_HEIGHT) as usize;
        Some(match column.task_ids.get(index) {
            Some(id) if offset % CARD_HEIGHT == 0 => DropTarget::before(id.as_str()),
            Some(id) => DropTarget::after(id.as_str()),
            None => DropTarget::column(column.id.as_str()),
        })
    }
}

fn priority_style(priority: Priority) -> Style {
    match priority {
        Priority::High => Style::default().fg(Color::Red),
        Priority::Medium => Style::default().fg(Color::Yellow),
        Priority::Low => Style::default().fg(Color::Green),
    }
}

fn card(task: &Task, style: Style) -> ListItem<'_> {
    let mut details = vec![Span::styled(
        format!("  {}", task.priority),
        priority_style(task.priority),
    )];
    if !task.category.is_empty() {
        details.push(Span::raw(format!(" | {}", task.category)));
    }
    if let Some(due) = task.due_date {
        details.push(Span::raw(format!(" | due {}", due.format(DATE_FORMAT))));
    }
    if let Some(assignee) = &task.assignee {
        details.push(Span::raw(format!(" | {assignee}")));
    }
    ListItem::new(Text::from(vec![
        Line::from(vec![
            Span::raw(format!("[#{}] ", task.id)),
            Span::styled(task.title.as_str(), Style::default().fg(Color::White)),
        ]),
        Line::from(details),
    ]))
    .style(style)
}

pub fn draw(f: &mut Frame, app: &mut App) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0), Constraint::Length(1)])
        .split(f.area());

    f.render_widget(
        Paragraph::new(Span::styled(
            app.title.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        outer[0],
    );

    // While dragging, show where the card would land.
    let shown = app.drag.preview(&app.board);
    let dragged = app.drag.active().map(|a| a.task_id.clone());
    let count = shown.columns().len().max(1) as u32;
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(shown.columns().iter().map(|_| Constraint::Ratio(1, count)))
        .split(outer[1]);

    app.rendered.clear();
    for (i, column) in shown.columns().iter().enumerate() {
        let items: Vec<ListItem> = shown
            .tasks_in_column(&column.id)
            .into_iter()
            .enumerate()
            .map(|(row, task)| {
                let style = if dragged.as_deref() == Some(task.id.as_str()) {
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                } else if dragged.is_none() && app.column == i && app.row == row {
                    Style::default().add_modifier(Modifier::REVERSED)
                } else {
                    Style::default()
                };
                card(task, style)
            })
            .collect();

        let highlighted = match dragged {
            Some(_) => app.drop_column == i,
            None => app.column == i,
        };
        let block = Block::default()
            .title(format!("{} ({})", column.title, column.task_ids.len()))
            .borders(Borders::ALL)
            .border_style(if highlighted {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default()
            });
        app.rendered.push(RenderedColumn {
            id: column.id.clone(),
            area: block.inner(chunks[i]),
            task_ids: column.task_ids.clone(),
        });
        f.render_widget(List::new(items).block(block), chunks[i]);
    }

    f.render_widget(
        Paragraph::new(Line::from(app.status.as_str())).style(Style::default().fg(Color::DarkGray)),
        outer[2],
    );
}

pub fn run(session: &mut Session) -> Result<()> {
    let mut app = App::new(session)?;

    enable_raw_mode()?;
    with_restored_terminal(
        setup_terminal,
        |mut terminal| run_app(&mut terminal, &mut app),
        restore_terminal,
    )
}

fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture, cursor::Show)
}

/// Runs `body` on whatever `setup` produced. `restore` runs afterwards even
/// when `setup` or `body` failed; the first error wins.
fn with_restored_terminal<T>(
    setup: impl FnOnce() -> io::Result<T>,
    body: impl FnOnce(T) -> Result<()>,
    restore: impl FnOnce() -> io::Result<()>,
) -> Result<()> {
    let result = setup().map_err(BoardError::from).and_then(body);
    let restored = restore();
    result?;
    restored?;
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|f| draw(f, app))?;
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => app.on_key(key.code),
            Event::Mouse(mouse) => app.on_mouse(mouse),
            _ => {}
        }
    }
    Ok(())
}
