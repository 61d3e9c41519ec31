use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::models::PopupMode;
use crate::remote::RemoteStore;
use crate::sync::{self, SyncFailure, SyncHandle};
use crate::tasks::TaskCollection;

// Poll timeout doubles as the tick for draining sync failures.
const TICK: Duration = Duration::from_millis(200);

pub struct App {
    pub collection: TaskCollection,
    failures: UnboundedReceiver<SyncFailure>,
    pub list_state: ListState,
    pub popup_mode: PopupMode,
    pub input_buffer: String,
    pub notice: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(collection: TaskCollection, failures: UnboundedReceiver<SyncFailure>) -> Self {
        let mut list_state = ListState::default();
        if !collection.is_empty() {
            list_state.select(Some(0));
        }
        App {
            collection,
            failures,
            list_state,
            popup_mode: PopupMode::None,
            input_buffer: String::new(),
            notice: None,
            should_quit: false,
        }
    }

    /// Rolls back local state for every mutation the worker gave up on and
    /// surfaces the notice in the footer.
    pub fn drain_sync_failures(&mut self) {
        while let Ok(failure) = self.failures.try_recv() {
            let notice = self.collection.revert(&failure);
            log::warn!("{}: {:#}", notice, failure.error);
            self.notice = Some(notice);
        }
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        if self.collection.is_empty() {
            self.list_state.select(None);
            return;
        }
        let last = self.collection.len() - 1;
        match self.list_state.selected() {
            Some(i) if i > last => self.list_state.select(Some(last)),
            None => self.list_state.select(Some(0)),
            _ => {}
        }
    }

    pub fn next_item(&mut self) {
        if self.collection.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => {
                if i >= self.collection.len() - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn previous_item(&mut self) {
        if self.collection.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => {
                if i == 0 {
                    self.collection.len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    fn selected_id(&self) -> Option<u64> {
        self.list_state
            .selected()
            .and_then(|i| self.collection.tasks().get(i))
            .map(|task| task.id)
    }

    pub fn toggle_selected(&mut self) {
        self.notice = None;
        if let Some(id) = self.selected_id() {
            self.collection.toggle(id);
        }
    }

    pub fn delete_selected(&mut self) {
        self.notice = None;
        if let Some(id) = self.selected_id() {
            self.collection.remove(id);
            self.clamp_selection();
        }
    }

    pub fn open_add_popup(&mut self) {
        self.notice = None;
        self.popup_mode = PopupMode::AddTask;
        self.input_buffer.clear();
    }

    pub fn open_help(&mut self) {
        self.popup_mode = PopupMode::Help;
    }

    pub fn close_popup(&mut self) {
        self.popup_mode = PopupMode::None;
        self.input_buffer.clear();
    }

    pub fn submit_new_task(&mut self) {
        if self.collection.add(&self.input_buffer).is_some() {
            self.clamp_selection();
        }
        self.close_popup();
    }
}

pub fn run_tui(rt: &Runtime, store: RemoteStore) -> Result<()> {
    // The listing happens exactly once per session; a failed fetch leaves
    // the collection empty and the session carries on.
    let listing = rt.block_on(store.list_tasks());
    let SyncHandle { commands, failures } = {
        let _guard = rt.enter();
        sync::spawn(store)
    };
    let mut collection = TaskCollection::new(commands);
    collection.apply_listing(listing);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(collection, failures);
    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        app.drain_sync_failures();
        terminal.draw(|f| ui(f, app))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match app.popup_mode {
                        PopupMode::AddTask => match key.code {
                            KeyCode::Esc => app.close_popup(),
                            KeyCode::Enter => app.submit_new_task(),
                            KeyCode::Backspace => {
                                app.input_buffer.pop();
                            }
                            KeyCode::Char(c) => app.input_buffer.push(c),
                            _ => {}
                        },
                        PopupMode::Help => match key.code {
                            KeyCode::Esc
                            | KeyCode::Char('h')
                            | KeyCode::Char('?')
                            | KeyCode::Char('q') => app.close_popup(),
                            _ => {}
                        },
                        PopupMode::None => match key.code {
                            KeyCode::Char('q') | KeyCode::Esc => {
                                app.should_quit = true;
                            }
                            KeyCode::Down | KeyCode::Char('j') => app.next_item(),
                            KeyCode::Up | KeyCode::Char('k') => app.previous_item(),
                            KeyCode::Char(' ') | KeyCode::Enter => app.toggle_selected(),
                            KeyCode::Char('d') | KeyCode::Delete => app.delete_selected(),
                            KeyCode::Char('a') => app.open_add_popup(),
                            KeyCode::Char('h') | KeyCode::Char('?') => app.open_help(),
                            _ => {}
                        },
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(f.area());

    let title = Paragraph::new(format!("Lista de Tareas v{}", env!("CARGO_PKG_VERSION")))
        .block(Block::default().borders(Borders::ALL))
        .style(Style::default().fg(Color::Cyan));
    f.render_widget(title, chunks[0]);

    render_tasks(f, app, chunks[1]);
    render_footer(f, app, chunks[2]);

    match app.popup_mode {
        PopupMode::AddTask => render_add_popup(f, app),
        PopupMode::Help => render_help_popup(f),
        PopupMode::None => {}
    }
}

fn render_tasks(f: &mut Frame, app: &mut App, area: Rect) {
    let items: Vec<ListItem> = app
        .collection
        .tasks()
        .iter()
        .map(|task| {
            let checkbox = if task.completed { "[x] " } else { "[ ] " };
            let style = if task.completed {
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::CROSSED_OUT)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(Line::from(vec![
                Span::styled(checkbox, Style::default().fg(Color::Cyan)),
                Span::styled(task.description.clone(), style),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Tareas ({})", app.collection.len())),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");

    f.render_stateful_widget(list, area, &mut app.list_state);
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let footer = match &app.notice {
        Some(notice) => Paragraph::new(notice.as_str())
            .block(Block::default().borders(Borders::ALL).title("Sync"))
            .style(Style::default().fg(Color::Yellow)),
        None => Paragraph::new("a: add | Space: toggle | d: delete | h: help | q: quit")
            .block(Block::default().borders(Borders::ALL))
            .style(Style::default().fg(Color::DarkGray)),
    };
    f.render_widget(footer, area);
}

fn render_add_popup(f: &mut Frame, app: &App) {
    let popup_area = centered_rect(60, 20, f.area());
    let block = Block::default()
        .title("New task")
        .borders(Borders::ALL)
        .style(Style::default().bg(Color::DarkGray));
    let content = Paragraph::new(format!(
        "Enter the task text:\n\n{}_\n\nPress ENTER to add\nPress ESC to cancel",
        app.input_buffer
    ))
    .block(block)
    .alignment(ratatui::layout::Alignment::Center)
    .style(Style::default().fg(Color::White));

    f.render_widget(content, popup_area);
}

fn render_help_popup(f: &mut Frame) {
    let popup_area = centered_rect(60, 50, f.area());
    let block = Block::default()
        .title("Help")
        .borders(Borders::ALL)
        .style(Style::default().bg(Color::DarkGray));
    let content = Paragraph::new(
        "This application lets you add, complete and delete tasks.\n\n\
         To add a task, press 'a', type the text and press ENTER.\n\
         To complete a task, select it and press SPACE.\n\
         To delete a task, select it and press 'd'.\n\n\
         Changes are pushed to the server in the background; if the\n\
         server rejects one, the list is rolled back and a notice is\n\
         shown in the footer.\n\n\
         Press ESC to close this help",
    )
    .block(block)
    .wrap(Wrap { trim: false })
    .style(Style::default().fg(Color::White));

    f.render_widget(content, popup_area);
}

// Helper function to create centered rectangles for popups
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
