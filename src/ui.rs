use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};
use std::io;

use crate::editor::TextField;
use crate::models::{Focus, RowAction, Todo, TodoMode};
use crate::storage::KeyValueStore;
use crate::todo_list::TodoList;

const ACCENT: Color = Color::Rgb(0x8B, 0x1C, 0x2B);
const PLACEHOLDER: &str = "To do...";
const HIGHLIGHT_SYMBOL: &str = ">> ";
// " ✗ ✎ ✓ │ "
const GUTTER_WIDTH: usize = 9;

pub struct App<S> {
    list: TodoList<S>,
    pub focus: Focus,
    /// Selected row, tracked by todo id.
    pub selected: Option<u64>,
    pub list_state: ListState,
    /// Field being typed into, with the id of the todo it edits.
    pub field: Option<(u64, TextField)>,
    pub should_quit: bool,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(list: TodoList<S>) -> Self {
        let selected = list.todos().first().map(|t| t.id);
        App {
            list,
            focus: Focus::Input,
            selected,
            list_state: ListState::default(),
            field: None,
            should_quit: false,
        }
    }

    #[cfg(test)]
    pub fn list(&self) -> &TodoList<S> {
        &self.list
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected.and_then(|id| self.list.position(id))
    }

    fn selected_todo(&self) -> Option<&Todo> {
        self.selected.and_then(|id| self.list.get(id))
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match self.focus {
            Focus::Input => self.handle_input_key(key),
            Focus::List => self.handle_list_key(key),
            Focus::Field => self.handle_field_key(key),
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                if let Some(id) = self.list.add() {
                    self.selected = Some(id);
                }
            }
            KeyCode::Backspace => {
                let mut draft = self.list.draft().unwrap_or_default().to_string();
                if draft.pop().is_some() {
                    self.list.set_draft(draft);
                }
            }
            KeyCode::Tab | KeyCode::Down | KeyCode::Esc => {
                self.focus = Focus::List;
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                let mut draft = self.list.draft().unwrap_or_default().to_string();
                draft.push(c);
                self.list.set_draft(draft);
            }
            _ => {}
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.next_item();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.previous_item();
            }
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Char('a') | KeyCode::Char('i') => {
                self.focus = Focus::Input;
            }
            KeyCode::Delete | KeyCode::Char('d') => {
                self.apply(RowAction::Delete);
            }
            KeyCode::Char('e') => {
                self.apply(RowAction::ToggleEdit);
            }
            KeyCode::Char('c') => {
                self.apply(RowAction::Confirm);
            }
            KeyCode::Enter => {
                let editable = self.selected_todo().filter(|t| t.mode == TodoMode::Edit).map(|t| t.id);
                if let Some(id) = editable {
                    self.open_field(id);
                }
            }
            _ => {}
        }
    }

    fn handle_field_key(&mut self, key: KeyEvent) {
        let Some((id, field)) = &mut self.field else {
            self.focus = Focus::List;
            return;
        };
        let id = *id;

        let changed = match key.code {
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.list.confirm_edit(id);
                self.close_field();
                return;
            }
            KeyCode::Esc => {
                self.close_field();
                return;
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                field.insert_char(c);
                true
            }
            KeyCode::Enter => {
                field.insert_newline();
                true
            }
            KeyCode::Backspace => field.delete_char(),
            KeyCode::Left => {
                field.move_cursor_left();
                false
            }
            KeyCode::Right => {
                field.move_cursor_right();
                false
            }
            KeyCode::Up => {
                field.move_cursor_up();
                false
            }
            KeyCode::Down => {
                field.move_cursor_down();
                false
            }
            KeyCode::Home => {
                field.move_to_start_of_line();
                false
            }
            KeyCode::End => {
                field.move_to_end_of_line();
                false
            }
            _ => false,
        };

        if changed {
            self.list.update_text(id, field.content());
        }
    }

    fn apply(&mut self, action: RowAction) {
        let Some(todo) = self.selected_todo() else {
            return;
        };
        if !action.enabled(todo.mode) {
            return;
        }
        let id = todo.id;

        match action {
            RowAction::Delete => {
                let index = self.selected_index().unwrap_or_default();
                self.list.delete(id);
                if matches!(self.field, Some((field_id, _)) if field_id == id) {
                    self.field = None;
                }
                let todos = self.list.todos();
                self.selected = todos.get(index.min(todos.len().saturating_sub(1))).map(|t| t.id);
            }
            RowAction::ToggleEdit => {
                self.list.toggle_mode(id);
                self.open_field(id);
            }
            RowAction::Confirm => {
                self.list.confirm_edit(id);
                if matches!(self.field, Some((field_id, _)) if field_id == id) {
                    self.field = None;
                }
            }
        }
    }

    fn open_field(&mut self, id: u64) {
        if let Some(todo) = self.list.get(id) {
            self.field = Some((id, TextField::new(todo.text_or_empty())));
            self.focus = Focus::Field;
        }
    }

    fn close_field(&mut self) {
        self.field = None;
        self.focus = Focus::List;
    }

    pub fn next_item(&mut self) {
        let todos = self.list.todos();
        if todos.is_empty() {
            return;
        }
        let i = match self.selected_index() {
            Some(i) if i + 1 < todos.len() => i + 1,
            _ => 0,
        };
        self.selected = Some(todos[i].id);
    }

    pub fn previous_item(&mut self) {
        let todos = self.list.todos();
        if todos.is_empty() {
            return;
        }
        let i = match self.selected_index() {
            Some(0) | None => todos.len() - 1,
            Some(i) => i - 1,
        };
        self.selected = Some(todos[i].id);
    }
}

pub fn run_tui<S: KeyValueStore>(list: TodoList<S>) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(list);
    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        log::error!("terminal loop failed: {err}");
        println!("{err:?}");
    }

    Ok(())
}

fn run_app<B: Backend, S: KeyValueStore>(terminal: &mut Terminal<B>, app: &mut App<S>) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                app.handle_key(key);
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

pub fn ui<S: KeyValueStore>(f: &mut Frame, app: &mut App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    let title = Paragraph::new("Plannify")
        .alignment(Alignment::Center)
        .style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD));
    f.render_widget(title, chunks[0]);

    render_input(f, app, chunks[1]);
    render_todos(f, app, chunks[2]);

    let footer = Paragraph::new(key_hints(app.focus)).style(Style::default().fg(Color::DarkGray));
    f.render_widget(footer, chunks[3]);
}

fn key_hints(focus: Focus) -> &'static str {
    match focus {
        Focus::Input => "Enter: add • Tab: list • Ctrl+C: quit",
        Focus::List => "↑/↓: select • e: edit • c: confirm • d: delete • Enter: focus field • a: new • q: quit",
        Focus::Field => "Ctrl+S: confirm • Esc: back to list",
    }
}

fn render_input<S: KeyValueStore>(f: &mut Frame, app: &App<S>, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(7)])
        .split(area);

    let focused = app.focus == Focus::Input;
    // Room left of the cursor block inside the borders.
    let visible = (chunks[0].width as usize).saturating_sub(if focused { 3 } else { 2 });
    let mut spans = match app.list.draft() {
        Some(draft) if !draft.is_empty() => {
            vec![Span::styled(visible_tail(draft, visible).to_string(), Style::default().fg(ACCENT))]
        }
        _ if focused => Vec::new(),
        _ => vec![Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray))],
    };
    if focused {
        spans.push(Span::styled(" ", Style::default().bg(Color::Cyan)));
    }

    let border = if focused { ACCENT } else { Color::DarkGray };
    let input = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title("New todo"),
    );
    f.render_widget(input, chunks[0]);

    let button = Paragraph::new("[+]")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(ACCENT)))
        .style(Style::default().fg(Color::White).bg(ACCENT).add_modifier(Modifier::BOLD));
    f.render_widget(button, chunks[1]);
}

/// Last `width` chars of `text`, so the end being typed stays on screen.
fn visible_tail(text: &str, width: usize) -> &str {
    let skip = text.chars().count().saturating_sub(width);
    text.char_indices().nth(skip).map_or("", |(i, _)| &text[i..])
}

fn render_todos<S: KeyValueStore>(f: &mut Frame, app: &mut App<S>, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if app.focus == Focus::Input { Color::DarkGray } else { ACCENT }))
        .title(format!("Todos ({})", app.list.todos().len()));

    if app.list.todos().is_empty() {
        let empty = Paragraph::new("Nothing to do yet. Type above and press Enter.")
            .block(block)
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(empty, area);
        return;
    }

    let row_width = area.width.saturating_sub(2 + HIGHLIGHT_SYMBOL.len() as u16) as usize;
    let editing = match (&app.field, app.focus) {
        (Some((id, field)), Focus::Field) => Some((*id, field)),
        _ => None,
    };

    let items: Vec<ListItem> = app
        .list
        .todos()
        .iter()
        .map(|todo| {
            let field = editing.filter(|(id, _)| *id == todo.id).map(|(_, field)| field);
            todo_item(todo, field, row_width)
        })
        .collect();

    let todos_list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::BOLD))
        .highlight_symbol(HIGHLIGHT_SYMBOL);

    let selected = app.selected_index();
    app.list_state.select(selected);
    f.render_stateful_widget(todos_list, area, &mut app.list_state);
}

fn todo_item(todo: &Todo, field: Option<&TextField>, width: usize) -> ListItem<'static> {
    let mut body: Vec<Vec<Span<'static>>> = match (todo.mode, field) {
        (TodoMode::Edit, Some(field)) => field_lines(field),
        (TodoMode::Edit, None) if todo.text_or_empty().is_empty() => {
            vec![vec![Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray))]]
        }
        (TodoMode::Edit, None) => text_lines(todo.text_or_empty(), Style::default().fg(Color::Yellow)),
        (TodoMode::Display, _) => text_lines(todo.text_or_empty(), Style::default().fg(Color::White)),
    };

    let date = format!(" {} ", todo.created_date());
    let pad = width.saturating_sub(GUTTER_WIDTH + date.chars().count());
    body.push(vec![
        Span::raw(" ".repeat(pad)),
        Span::styled(date, Style::default().fg(Color::White).bg(ACCENT)),
    ]);

    let lines: Vec<Line<'static>> = body
        .into_iter()
        .enumerate()
        .map(|(i, spans)| {
            let mut line = if i == 0 { action_gutter(todo.mode) } else { blank_gutter() };
            line.extend(spans);
            Line::from(line)
        })
        .collect();

    ListItem::new(lines)
}

fn action_gutter(mode: TodoMode) -> Vec<Span<'static>> {
    let mut spans = vec![Span::raw(" ")];
    for action in RowAction::ALL {
        // Delete stays usable but is dimmed while editing.
        let style = if action.enabled(mode) && !(action == RowAction::Delete && mode == TodoMode::Edit) {
            Style::default().fg(Color::White).bg(ACCENT).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM)
        };
        spans.push(Span::styled(action.glyph(), style));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::styled("│ ", Style::default().fg(ACCENT)));
    spans
}

fn blank_gutter() -> Vec<Span<'static>> {
    vec![Span::raw("       "), Span::styled("│ ", Style::default().fg(ACCENT))]
}

fn text_lines(text: &str, style: Style) -> Vec<Vec<Span<'static>>> {
    text.split('\n')
        .map(|line| vec![Span::styled(line.to_string(), style)])
        .collect()
}

fn field_lines(field: &TextField) -> Vec<Vec<Span<'static>>> {
    let text_style = Style::default().fg(Color::Yellow).add_modifier(Modifier::UNDERLINED);
    let cursor_style = Style::default().bg(Color::Cyan).fg(Color::Black);

    field
        .lines
        .iter()
        .enumerate()
        .map(|(row, line)| {
            if row != field.cursor_row {
                return vec![Span::styled(line.clone(), text_style)];
            }

            let chars: Vec<char> = line.chars().collect();
            let col = field.cursor_col.min(chars.len());
            let mut spans = Vec::new();
            if col > 0 {
                spans.push(Span::styled(chars[..col].iter().collect::<String>(), text_style));
            }
            let cursor_char = chars.get(col).map_or_else(|| " ".to_string(), |c| c.to_string());
            spans.push(Span::styled(cursor_char, cursor_style));
            if col + 1 < chars.len() {
                spans.push(Span::styled(chars[col + 1..].iter().collect::<String>(), text_style));
            }
            spans
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{SqliteStore, TodoStorage};
    use ratatui::backend::TestBackend;

    fn app() -> App<SqliteStore> {
        App::new(TodoList::load(TodoStorage::new(SqliteStore::in_memory().unwrap())))
    }

    fn press(app: &mut App<SqliteStore>, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn ctrl(app: &mut App<SqliteStore>, c: char) {
        app.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL));
    }

    fn type_text(app: &mut App<SqliteStore>, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn add(app: &mut App<SqliteStore>, text: &str) {
        type_text(app, text);
        press(app, KeyCode::Enter);
    }

    /// Render into an in-memory buffer and return plain text.
    fn render_to_string(app: &mut App<SqliteStore>, w: u16, h: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(w, h)).unwrap();
        terminal.draw(|f| ui(f, app)).unwrap();

        let buf = terminal.backend().buffer().clone();
        buf.content
            .chunks(buf.area.width as usize)
            .map(|row| {
                let s: String = row.iter().map(|cell| cell.symbol()).collect();
                s.trim_end().to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn mode_of(app: &App<SqliteStore>, id: u64) -> TodoMode {
        app.list().get(id).unwrap().mode
    }

    #[test]
    fn typing_and_enter_adds_a_todo() {
        let mut app = app();
        add(&mut app, "Buy milk");
        assert_eq!(app.list().todos().len(), 1);
        assert_eq!(app.list().todos()[0].text.as_deref(), Some("Buy milk"));
        assert_eq!(app.list().draft(), None);
        assert_eq!(app.selected, Some(1));
        assert_eq!(app.focus, Focus::Input);
    }

    #[test]
    fn blank_draft_is_not_added() {
        let mut app = app();
        add(&mut app, "   ");
        assert!(app.list().todos().is_empty());
        assert_eq!(app.list().draft(), Some("   "));
    }

    #[test]
    fn backspace_trims_draft() {
        let mut app = app();
        type_text(&mut app, "ab");
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.list().draft(), Some("a"));
    }

    #[test]
    fn edit_then_confirm_flow() {
        let mut app = app();
        add(&mut app, "Buy milk");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('e'));
        assert_eq!(mode_of(&app, 1), TodoMode::Edit);
        assert_eq!(app.focus, Focus::Field);

        for _ in 0..4 {
            press(&mut app, KeyCode::Left);
        }
        type_text(&mut app, "oat ");
        assert_eq!(app.list().get(1).unwrap().text.as_deref(), Some("Buy oat milk"));
        assert_eq!(mode_of(&app, 1), TodoMode::Edit);

        ctrl(&mut app, 's');
        assert_eq!(mode_of(&app, 1), TodoMode::Display);
        assert_eq!(app.focus, Focus::List);
        assert!(app.field.is_none());
    }

    #[test]
    fn disabled_actions_do_nothing() {
        let mut app = app();
        add(&mut app, "a");
        press(&mut app, KeyCode::Tab);

        press(&mut app, KeyCode::Char('c'));
        assert_eq!(mode_of(&app, 1), TodoMode::Display);

        press(&mut app, KeyCode::Char('e'));
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.focus, Focus::List);
        press(&mut app, KeyCode::Char('e'));
        assert_eq!(mode_of(&app, 1), TodoMode::Edit);
        assert_eq!(app.focus, Focus::List);

        press(&mut app, KeyCode::Char('c'));
        assert_eq!(mode_of(&app, 1), TodoMode::Display);
    }

    #[test]
    fn enter_refocuses_field_of_edit_row() {
        let mut app = app();
        add(&mut app, "a");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('e'));
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.focus, Focus::Field);
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.list().get(1).unwrap().text.as_deref(), Some(""));
    }

    #[test]
    fn delete_selects_neighbour_by_id() {
        let mut app = app();
        for text in ["a", "b", "c"] {
            add(&mut app, text);
        }
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Up);
        assert_eq!(app.selected, Some(2));

        press(&mut app, KeyCode::Char('d'));
        let ids: Vec<u64> = app.list().todos().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(app.selected, Some(3));

        press(&mut app, KeyCode::Delete);
        press(&mut app, KeyCode::Delete);
        assert!(app.list().todos().is_empty());
        assert_eq!(app.selected, None);
    }

    #[test]
    fn selection_wraps() {
        let mut app = app();
        add(&mut app, "a");
        add(&mut app, "b");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.selected, Some(1));
        press(&mut app, KeyCode::Up);
        assert_eq!(app.selected, Some(2));
    }

    #[test]
    fn quit_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit);
        ctrl(&mut app, 'c');
        assert!(app.should_quit);
    }

    #[test]
    fn renders_rows_with_glyphs_and_date() {
        let mut app = app();
        add(&mut app, "Buy milk");
        let date = app.list().get(1).unwrap().created_date();

        let out = render_to_string(&mut app, 60, 16);
        assert!(out.contains("Plannify"));
        assert!(out.contains("Todos (1)"));
        assert!(out.contains("✗ ✎ ✓ │ Buy milk"));
        assert!(out.contains(&date));
    }

    #[test]
    fn long_draft_keeps_its_end_visible() {
        let mut app = app();
        type_text(&mut app, "abcdefghijklmnopqrstuvwxyz0123");

        // 30 wide: 23-column input box, 21 inside the borders, 20 left of the cursor.
        let out = render_to_string(&mut app, 30, 12);
        let input_row = out.lines().nth(2).unwrap();
        assert!(input_row.contains("klmnopqrstuvwxyz0123"));
        assert!(!input_row.contains("abcdefghij"));
    }

    #[test]
    fn tail_counts_chars_not_bytes() {
        assert_eq!(visible_tail("çöğüş", 2), "üş");
        assert_eq!(visible_tail("short", 10), "short");
        assert_eq!(visible_tail("abc", 0), "");
    }

    #[test]
    fn renders_placeholder_and_empty_hint() {
        let mut app = app();
        press(&mut app, KeyCode::Tab);
        let out = render_to_string(&mut app, 60, 12);
        assert!(out.contains(PLACEHOLDER));
        assert!(out.contains("Nothing to do yet"));
    }

    #[test]
    fn renders_edit_field_lines() {
        let mut app = app();
        add(&mut app, "first");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('e'));
        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "second");

        let out = render_to_string(&mut app, 60, 16);
        assert!(out.contains("│ first"));
        assert!(out.contains("│ second"));
        assert!(out.contains("Ctrl+S: confirm"));
    }
}
