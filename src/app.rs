use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::style::{Color, Modifier, Style};
use tui_textarea::{CursorMove, TextArea};

use crate::{
    models::{ErrorLocation, Focus, InputMode, LogEntry, LogLevel},
    runner::ProcessRunner,
    session::{EditorSurface, ScriptSession},
    store::FsStore,
};

const MAX_LOGS: usize = 100;

/// Editor buffer, output pane and activity log as seen by the session.
pub struct Workspace {
    pub editor: TextArea<'static>,
    pub output: String,
    pub logs: Vec<LogEntry>,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            editor: new_editor(vec![String::new()]),
            output: String::new(),
            logs: Vec::new(),
        }
    }

    fn timestamp() -> String {
        chrono::Local::now().format("%H:%M:%S").to_string()
    }

    pub fn add_log(&mut self, level: LogLevel, message: String) {
        self.logs.push(LogEntry {
            timestamp: Self::timestamp(),
            level,
            message,
        });
        if self.logs.len() > MAX_LOGS {
            self.logs.remove(0);
        }
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

fn new_editor(lines: Vec<String>) -> TextArea<'static> {
    let mut editor = TextArea::new(lines);
    editor.set_cursor_line_style(Style::default().add_modifier(Modifier::UNDERLINED));
    editor.set_line_number_style(Style::default().fg(Color::DarkGray));
    editor
}

fn to_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

impl EditorSurface for Workspace {
    fn text(&self) -> String {
        self.editor.lines().join("\n")
    }

    fn set_text(&mut self, text: &str) {
        let lines = text
            .replace("\r\n", "\n")
            .split('\n')
            .map(str::to_string)
            .collect();
        self.editor = new_editor(lines);
    }

    fn set_output(&mut self, text: &str) {
        self.output = text.to_string();
    }

    /// Row clamps to the last line, column to the end of that row.
    fn move_cursor(&mut self, location: ErrorLocation) {
        let lines = self.editor.lines();
        let row = location.line.min(lines.len().saturating_sub(1));
        let column = location
            .column
            .min(lines.get(row).map_or(0, |l| l.chars().count()));
        self.editor
            .move_cursor(CursorMove::Jump(to_u16(row), to_u16(column)));
    }

    fn log(&mut self, level: LogLevel, message: String) {
        self.add_log(level, message);
    }
}

pub type Session = ScriptSession<FsStore, ProcessRunner, Workspace>;

pub struct App {
    pub session: Session,
    pub focus: Focus,
    pub input_mode: InputMode,
    pub input_buffer: String,
    pub show_help: bool,
}

impl App {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            focus: Focus::Editor,
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            show_help: false,
        }
    }

    /// Handles one key press. Returns true when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        if self.input_mode == InputMode::NewScriptName {
            self.handle_name_input(key.code);
            return false;
        }

        if self.show_help {
            self.show_help = false;
            return false;
        }

        match key.code {
            KeyCode::Char('q') if ctrl => return true,
            KeyCode::Char('r') if ctrl => self.session.run_requested(),
            KeyCode::Char('n') if ctrl => self.start_new_script(),
            KeyCode::Tab | KeyCode::BackTab => self.toggle_focus(),
            _ => match self.focus {
                Focus::Scripts => return self.handle_scripts_key(key.code),
                Focus::Editor => self.handle_editor_key(key),
            },
        }
        false
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Editor => Focus::Scripts,
            Focus::Scripts => Focus::Editor,
        };
    }

    fn start_new_script(&mut self) {
        self.input_buffer.clear();
        self.input_mode = InputMode::NewScriptName;
    }

    fn handle_name_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Enter => {
                let name = std::mem::take(&mut self.input_buffer);
                self.input_mode = InputMode::Normal;
                self.session.create_new(&name);
                if self.session.active().is_some() {
                    self.focus = Focus::Editor;
                }
            }
            KeyCode::Esc => {
                self.input_buffer.clear();
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Backspace => {
                self.input_buffer.pop();
            }
            KeyCode::Char(c) => {
                self.input_buffer.push(c);
            }
            _ => {}
        }
    }

    fn handle_scripts_key(&mut self, key: KeyCode) -> bool {
        let count = self.session.scripts().len();
        let selected = self.session.selected_index();

        match key {
            KeyCode::Char('q') => return true,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Char('n') => self.start_new_script(),
            KeyCode::Char('r') => self.session.run_requested(),
            KeyCode::Up if count > 0 => {
                let index = match selected {
                    Some(i) => i.saturating_sub(1),
                    None => count - 1,
                };
                self.session.select(Some(index));
            }
            KeyCode::Down if count > 0 => {
                let index = match selected {
                    Some(i) => (i + 1).min(count - 1),
                    None => 0,
                };
                self.session.select(Some(index));
            }
            KeyCode::Enter => {
                if selected.is_none() && count > 0 {
                    self.session.select(Some(0));
                }
                self.focus = Focus::Editor;
            }
            KeyCode::Esc => self.session.select(None),
            _ => {}
        }
        false
    }

    fn handle_editor_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Esc {
            self.focus = Focus::Scripts;
            return;
        }
        if self.session.surface_mut().editor.input(key) {
            self.session.edit(Instant::now());
        }
    }
}
