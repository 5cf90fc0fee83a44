use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Padding, Paragraph, Wrap},
};

use crate::{
    app::App,
    models::{Focus, InputMode, LogLevel, RecordState},
};

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(6)])
        .split(f.area());

    render_header(f, app, chunks[0]);
    render_body(f, app, chunks[1]);
    render_footer(f, app, chunks[2]);

    if app.input_mode == InputMode::NewScriptName {
        render_name_prompt(f, app);
    } else if app.show_help {
        render_help_popup(f);
    }
}

fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Cyan)
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(
        "Octave Scratchpad",
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )];

    match app.session.active() {
        Some(id) => {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(id.file_name(), Style::default().fg(Color::White)));
        }
        None => spans.push(Span::styled(
            "  no script selected",
            Style::default().fg(Color::DarkGray),
        )),
    }
    if app.session.run_pending() {
        spans.push(Span::styled("  ● pending", Style::default().fg(Color::Yellow)));
    }

    f.render_widget(
        Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        ),
        area,
    );
}

fn render_body(f: &mut Frame, app: &mut App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(25), Constraint::Percentage(75)])
        .split(area);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(columns[1]);

    render_scripts(f, app, columns[0]);
    render_editor(f, app, rows[0]);
    render_output(f, app, rows[1]);
}

fn render_scripts(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .session
        .scripts()
        .iter()
        .map(|record| {
            let (marker, style) = match record.state {
                RecordState::Active => (
                    "▶",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ),
                RecordState::New => ("+", Style::default().fg(Color::Green)),
                RecordState::Listed => (" ", Style::default().fg(Color::Gray)),
            };
            ListItem::new(format!("{} {}", marker, record.id)).style(style)
        })
        .collect();

    let mut state = ListState::default().with_selected(app.session.selected_index());

    f.render_stateful_widget(
        List::new(items)
            .block(
                Block::default()
                    .title("Scripts")
                    .borders(Borders::ALL)
                    .border_style(border_style(app.focus == Focus::Scripts)),
            )
            .highlight_style(Style::default().bg(Color::DarkGray)),
        area,
        &mut state,
    );
}

fn render_editor(f: &mut Frame, app: &mut App, area: Rect) {
    let focused = app.focus == Focus::Editor;
    let title = match app.session.active() {
        Some(id) => format!("Editor - {}", id.file_name()),
        None => "Editor".to_string(),
    };

    let editor = &mut app.session.surface_mut().editor;
    editor.set_block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border_style(focused)),
    );
    editor.set_cursor_style(if focused {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    });

    f.render_widget(&*editor, area);
}

fn render_output(f: &mut Frame, app: &App, area: Rect) {
    f.render_widget(
        Paragraph::new(app.session.surface().output.as_str())
            .block(
                Block::default()
                    .title("Output")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan))
                    .padding(Padding::horizontal(1)),
            )
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(3)])
        .split(area);

    let keybinds = match app.focus {
        Focus::Editor => "Ctrl+R: Run | Ctrl+N: New Script | Esc/Tab: Scripts | Ctrl+Q: Quit",
        Focus::Scripts => {
            "↑↓: Select | Esc: Deselect | n: New | r: Run | Tab: Editor | ?: Help | q: Quit"
        }
    };

    f.render_widget(
        Paragraph::new(keybinds)
            .style(Style::default().fg(Color::Cyan))
            .block(
                Block::default()
                    .title("Keybindings")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray)),
            )
            .alignment(Alignment::Center),
        chunks[0],
    );

    let log_items: Vec<Line> = app
        .session
        .surface()
        .logs
        .iter()
        .rev()
        .take(1)
        .map(|log| {
            let (icon, color) = match log.level {
                LogLevel::Info => ("ℹ", Color::Cyan),
                LogLevel::Success => ("✓", Color::Green),
                LogLevel::Error => ("✗", Color::Red),
                LogLevel::Warning => ("⚠", Color::Yellow),
            };

            Line::from(vec![
                Span::styled(format!("[{}] ", log.timestamp), Style::default().fg(Color::DarkGray)),
                Span::styled(format!("{} ", icon), Style::default().fg(color)),
                Span::styled(log.message.as_str(), Style::default().fg(color)),
            ])
        })
        .collect();

    f.render_widget(
        Paragraph::new(log_items).block(
            Block::default()
                .title("Log")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        ),
        chunks[1],
    );
}

fn render_name_prompt(f: &mut Frame, app: &App) {
    let area = centered_rect(50, 20, f.area());

    let lines = vec![
        Line::from(Span::styled(
            "Script name (.m is added):",
            Style::default().fg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(">> ", Style::default().fg(Color::Yellow)),
            Span::styled(app.input_buffer.as_str(), Style::default().fg(Color::White)),
            Span::styled(
                "_",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
        ]),
    ];

    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .title("New Script")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .padding(Padding::horizontal(1)),
        ),
        area,
    );
}

fn render_help_popup(f: &mut Frame) {
    let area = centered_rect(60, 60, f.area());

    let help_text = vec![
        Line::from(Span::styled(
            "Octave Scratchpad - Help",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Scripts re-run shortly after you stop typing."),
        Line::from(""),
        Line::from(Span::styled("Anywhere:", Style::default().fg(Color::Yellow))),
        Line::from("  Tab              - Switch between editor and scripts"),
        Line::from("  Ctrl+R           - Save and run now"),
        Line::from("  Ctrl+N           - Create or open a script by name"),
        Line::from("  Ctrl+Q           - Save and quit"),
        Line::from(""),
        Line::from(Span::styled("Scripts:", Style::default().fg(Color::Yellow))),
        Line::from("  ↑ / ↓            - Select script (saves the current one)"),
        Line::from("  Esc              - Deselect"),
        Line::from("  n / r / q        - New / Run / Quit"),
        Line::from(""),
        Line::from(Span::styled("Press any key to close", Style::default().fg(Color::DarkGray))),
    ];

    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(help_text).block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .padding(Padding::uniform(1)),
        ),
        area,
    );
}

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
