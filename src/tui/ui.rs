//! UI layout and rendering logic for the TUI.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use unicode_width::UnicodeWidthChar;

use super::app::App;
use crate::presentation::format_stats;

/// Render the main UI
pub fn render_ui(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(3),    // Editor + output
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_header(frame, app, main_layout[0]);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(main_layout[1]);

    render_editor(frame, app, panes[0]);
    render_output(frame, app, panes[1]);
    render_status_bar(frame, app, main_layout[2]);

    if app.picker.is_some() {
        render_language_picker(frame, app);
    }

    if app.show_help {
        render_help_overlay(frame);
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let busy = app.display().is_busy;
    let line = Line::from(vec![
        Span::styled(" runpad ", Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::raw(" "),
        Span::styled(app.language.display_name, Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        if busy {
            Span::styled("Running...", Style::default().fg(Color::Magenta))
        } else {
            Span::styled("Run Code (Ctrl+R)", Style::default().fg(Color::Green))
        },
        Span::raw("  "),
        Span::styled(app.api_url.as_str(), Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Render the editor pane with a line-number gutter and keep the cursor visible.
fn render_editor(frame: &mut Frame, app: &App, area: Rect) {
    let lines = app.editor.lines();
    let gutter = lines.len().to_string().len().max(2);
    let (row, _) = app.editor.cursor();
    let col = app.editor.cursor_display_col();

    let height = area.height.saturating_sub(2) as usize;
    let text_width = (area.width.saturating_sub(2) as usize).saturating_sub(gutter + 1);
    let top = if height > 0 && row >= height { row + 1 - height } else { 0 };
    let left = if text_width > 0 && col >= text_width { col + 1 - text_width } else { 0 };

    let content: Vec<Line> = lines
        .iter()
        .enumerate()
        .skip(top)
        .take(height)
        .map(|(i, l)| {
            Line::from(vec![
                Span::styled(format!("{:>gutter$} ", i + 1), Style::default().fg(Color::DarkGray)),
                Span::raw(skip_columns(l, left)),
            ])
        })
        .collect();

    let title = format!("Editor - main{} [{}]", app.language.extension, app.language.editor_syntax_id);
    let block = Block::default().borders(Borders::ALL).title(title);
    frame.render_widget(Paragraph::new(Text::from(content)).block(block), area);

    if app.picker.is_none() && !app.show_help && height > 0 {
        let max_x = (area.x + area.width.saturating_sub(2)) as usize;
        let x = (area.x as usize + 1 + gutter + 1 + (col - left)).min(max_x);
        let y = area.y + 1 + (row - top) as u16;
        frame.set_cursor_position((x as u16, y));
    }
}

/// Drop the first `cols` display columns of `line`.
fn skip_columns(line: &str, cols: usize) -> &str {
    let mut seen = 0;
    for (i, c) in line.char_indices() {
        if seen >= cols {
            return &line[i..];
        }
        seen += c.width().unwrap_or(0);
    }
    ""
}

/// Render the output pane from the projected display model
fn render_output(frame: &mut Frame, app: &App, area: Rect) {
    let model = app.display();

    let mut title = match app.session.language() {
        Some(lang) if model.has_output() => format!("Output ({})", lang.label),
        _ => "Output".to_string(),
    };
    if let Some(stats) = format_stats(&model) {
        title.push_str(&format!(" | {stats}"));
    }

    let text = if model.is_busy {
        Text::from(Line::from(Span::styled(
            "Executing code...",
            Style::default().fg(Color::Magenta).add_modifier(Modifier::ITALIC),
        )))
    } else if model.has_output() {
        let mut lines: Vec<Line> = model
            .stdout_text
            .lines()
            .map(|l| Line::from(l.to_string()))
            .collect();
        if !model.stdout_text.is_empty() && !model.stderr_text.is_empty() {
            lines.push(Line::from(""));
        }
        let err_style = Style::default().fg(Color::Red);
        lines.extend(
            model
                .stderr_text
                .lines()
                .map(|l| Line::from(Span::styled(l.to_string(), err_style))),
        );
        Text::from(lines)
    } else {
        Text::from(Line::from(Span::styled(
            "Run your code to see the output here",
            Style::default().fg(Color::DarkGray),
        )))
    };

    let paragraph = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false })
        .scroll((app.output_scroll, 0));
    frame.render_widget(paragraph, area);
}

/// Render the status bar
fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status_paragraph = Paragraph::new(app.status_message.as_str())
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    frame.render_widget(status_paragraph, area);
}

fn render_language_picker(frame: &mut Frame, app: &App) {
    let popup_area = centered_rect(40, 50, frame.area());
    frame.render_widget(Clear, popup_area);

    let items: Vec<ListItem> = app
        .registry
        .list_all()
        .iter()
        .map(|l| ListItem::new(format!("{:<11} {}", l.label, l.display_name)))
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Language (Enter select, Esc cancel)")
                .title_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        )
        .highlight_style(Style::default().bg(Color::Cyan).fg(Color::Black))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.picker);
    frame.render_stateful_widget(list, popup_area, &mut state);
}

/// Render help overlay
fn render_help_overlay(frame: &mut Frame) {
    let popup_area = centered_rect(70, 60, frame.area());
    frame.render_widget(Clear, popup_area);

    let help_lines = vec![
        Line::from("Editor Help"),
        Line::from(""),
        Line::from("Run:"),
        Line::from("  Ctrl+R / F5  - Run code"),
        Line::from("  Ctrl+L       - Clear output"),
        Line::from("  PgUp/PgDn    - Scroll output"),
        Line::from(""),
        Line::from("Editing:"),
        Line::from("  Arrows, Home, End, Tab, Enter, Backspace, Delete"),
        Line::from("  Ctrl+T       - Reset to language template"),
        Line::from("  F2           - Choose language"),
        Line::from(""),
        Line::from("  F1           - Toggle this help"),
        Line::from("  Ctrl+Q       - Quit"),
    ];

    let help_paragraph = Paragraph::new(Text::from(help_lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Help")
                .title_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(help_paragraph, popup_area);
}

/// Helper function to create a centered rectangle
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
