//! TUI application state: the editor buffer, the selected language and the
//! execution session behind the output pane.

use std::sync::Arc;

use unicode_width::UnicodeWidthStr;

use crate::{
    execution::{ExecutionResult, Executor},
    languages::{LanguageDescriptor, Registry},
    presentation::{project, DisplayModel},
    session::{PendingRun, Session, Settlement},
};

const TAB: &str = "    ";

/// Multi-line text buffer with a char-indexed cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorBuffer {
    lines: Vec<String>,
    row: usize,
    col: usize,
}

impl Default for EditorBuffer {
    fn default() -> Self {
        Self { lines: vec![String::new()], row: 0, col: 0 }
    }
}

impl EditorBuffer {
    pub fn from_text(text: &str) -> Self {
        let mut buf = Self::default();
        buf.set_text(text);
        buf
    }

    pub fn set_text(&mut self, text: &str) {
        self.lines = text.split('\n').map(|l| l.trim_end_matches('\r').to_string()).collect();
        self.row = 0;
        self.col = 0;
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    /// Display width of the text left of the cursor on its line.
    pub fn cursor_display_col(&self) -> usize {
        let line = &self.lines[self.row];
        line[..self.byte_index(line, self.col)].width()
    }

    fn line_chars(&self, row: usize) -> usize {
        self.lines[row].chars().count()
    }

    fn byte_index(&self, line: &str, col: usize) -> usize {
        line.char_indices().nth(col).map(|(i, _)| i).unwrap_or(line.len())
    }

    pub fn insert_char(&mut self, c: char) {
        let idx = self.byte_index(&self.lines[self.row], self.col);
        self.lines[self.row].insert(idx, c);
        self.col += 1;
    }

    pub fn insert_str(&mut self, s: &str) {
        for c in s.chars() {
            match c {
                '\n' => self.insert_newline(),
                '\r' => {}
                '\t' => self.insert_tab(),
                c => self.insert_char(c),
            }
        }
    }

    pub fn insert_tab(&mut self) {
        for c in TAB.chars() {
            self.insert_char(c);
        }
    }

    /// Split the line at the cursor, carrying the current indentation over.
    pub fn insert_newline(&mut self) {
        let line = &self.lines[self.row];
        let idx = self.byte_index(line, self.col);
        let indent: String = line.chars().take_while(|c| *c == ' ' || *c == '\t').collect();
        let rest = self.lines[self.row].split_off(idx);
        self.row += 1;
        self.col = indent.chars().count();
        self.lines.insert(self.row, indent + &rest);
    }

    pub fn backspace(&mut self) {
        if self.col > 0 {
            self.col -= 1;
            let idx = self.byte_index(&self.lines[self.row], self.col);
            self.lines[self.row].remove(idx);
        } else if self.row > 0 {
            let current = self.lines.remove(self.row);
            self.row -= 1;
            self.col = self.line_chars(self.row);
            self.lines[self.row].push_str(&current);
        }
    }

    pub fn delete(&mut self) {
        if self.col < self.line_chars(self.row) {
            let idx = self.byte_index(&self.lines[self.row], self.col);
            self.lines[self.row].remove(idx);
        } else if self.row + 1 < self.lines.len() {
            let next = self.lines.remove(self.row + 1);
            self.lines[self.row].push_str(&next);
        }
    }

    pub fn move_left(&mut self) {
        if self.col > 0 {
            self.col -= 1;
        } else if self.row > 0 {
            self.row -= 1;
            self.col = self.line_chars(self.row);
        }
    }

    pub fn move_right(&mut self) {
        if self.col < self.line_chars(self.row) {
            self.col += 1;
        } else if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = 0;
        }
    }

    pub fn move_up(&mut self) {
        if self.row > 0 {
            self.row -= 1;
            self.col = self.col.min(self.line_chars(self.row));
        }
    }

    pub fn move_down(&mut self) {
        if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = self.col.min(self.line_chars(self.row));
        }
    }

    pub fn move_home(&mut self) {
        self.col = 0;
    }

    pub fn move_end(&mut self) {
        self.col = self.line_chars(self.row);
    }
}

/// Application state for the TUI
pub struct App {
    pub registry: Registry,
    /// Language the editor is currently set to
    pub language: &'static LanguageDescriptor,
    pub editor: EditorBuffer,
    pub session: Session,
    /// Base URL shown in the header
    pub api_url: String,
    /// Status message to display
    pub status_message: String,
    /// Whether to show help
    pub show_help: bool,
    /// Highlighted row of the language picker, when open
    pub picker: Option<usize>,
    /// Lines scrolled in the output pane
    pub output_scroll: u16,
}

impl App {
    pub fn new(
        registry: Registry,
        executor: Arc<dyn Executor>,
        language: &'static LanguageDescriptor,
        code: Option<String>,
        api_url: String,
    ) -> Self {
        let text = code.unwrap_or_else(|| language.starter_template.to_string());
        Self {
            registry,
            language,
            editor: EditorBuffer::from_text(&text),
            session: Session::new(registry, executor),
            api_url,
            status_message: idle_status().to_string(),
            show_help: false,
            picker: None,
            output_scroll: 0,
        }
    }

    pub fn display(&self) -> DisplayModel {
        project(self.session.state())
    }

    /// Start a run of the buffer. The run control is disabled while busy, so
    /// this returns `None` instead of overlapping runs.
    pub fn request_run(&mut self) -> Option<PendingRun> {
        if self.session.is_running() {
            self.status_message = "Already running... wait for the result or Ctrl+L to clear".to_string();
            return None;
        }
        self.output_scroll = 0;
        self.status_message = "Running...".to_string();
        Some(self.session.begin(&self.editor.text(), self.language.key))
    }

    pub fn apply_settlement(&mut self, settlement: Settlement) {
        if !self.session.settle(settlement) {
            return;
        }
        self.status_message = match &self.session.state().result {
            Some(ExecutionResult::Success(_)) => "Finished | Ctrl+R run again".to_string(),
            Some(ExecutionResult::Failure { .. }) => "Execution failed | Ctrl+R retry".to_string(),
            None => idle_status().to_string(),
        };
    }

    pub fn clear_output(&mut self) {
        self.session.clear();
        self.output_scroll = 0;
        self.status_message = idle_status().to_string();
    }

    /// Replace the buffer with the language's starter template.
    pub fn reset_template(&mut self) {
        self.editor.set_text(self.registry.template(self.language.key));
        self.clear_output();
    }

    pub fn set_language(&mut self, key: &str) {
        self.language = self.registry.describe(key);
        self.reset_template();
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn open_picker(&mut self) {
        self.picker = Some(self.registry.position(self.language.key).unwrap_or(0));
    }

    pub fn close_picker(&mut self) {
        self.picker = None;
    }

    pub fn picker_up(&mut self) {
        if let Some(i) = self.picker {
            self.picker = Some(i.saturating_sub(1));
        }
    }

    pub fn picker_down(&mut self) {
        if let Some(i) = self.picker {
            let last = self.registry.list_all().len().saturating_sub(1);
            self.picker = Some((i + 1).min(last));
        }
    }

    pub fn confirm_picker(&mut self) {
        if let Some(i) = self.picker.take() {
            if let Some(lang) = self.registry.list_all().get(i) {
                if lang.key != self.language.key {
                    self.set_language(lang.key);
                }
            }
        }
    }

    pub fn scroll_output_up(&mut self) {
        self.output_scroll = self.output_scroll.saturating_sub(1);
    }

    pub fn scroll_output_down(&mut self) {
        self.output_scroll = self.output_scroll.saturating_add(1);
    }
}

fn idle_status() -> &'static str {
    "Ctrl+R run | F2 language | Ctrl+L clear | Ctrl+T template | F1 help"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::RunOutput;
    use crate::session::Phase;
    use async_trait::async_trait;

    struct OkExecutor;

    #[async_trait]
    impl Executor for OkExecutor {
        async fn submit(&self, request: crate::execution::ExecutionRequest) -> ExecutionResult {
            ExecutionResult::Success(RunOutput {
                stdout: Some(format!("ran {}", request.language_id)),
                ..RunOutput::default()
            })
        }
    }

    fn app() -> App {
        let reg = Registry::builtin();
        App::new(reg, Arc::new(OkExecutor), reg.describe("python"), None, "http://localhost:8080".into())
    }

    #[test]
    fn test_buffer_editing() {
        let mut buf = EditorBuffer::from_text("ab");
        buf.move_end();
        buf.insert_char('c');
        assert_eq!(buf.text(), "abc");
        buf.move_left();
        buf.insert_newline();
        assert_eq!(buf.text(), "ab\nc");
        assert_eq!(buf.cursor(), (1, 0));
        buf.backspace();
        assert_eq!(buf.text(), "abc");
        assert_eq!(buf.cursor(), (0, 2));
        buf.delete();
        assert_eq!(buf.text(), "ab");
    }

    #[test]
    fn test_newline_keeps_indent() {
        let mut buf = EditorBuffer::from_text("def f():");
        buf.move_end();
        buf.insert_newline();
        buf.insert_tab();
        buf.insert_str("x = 1\ny");
        assert_eq!(buf.text(), "def f():\n    x = 1\n    y");
    }

    #[test]
    fn test_delete_at_line_end_joins() {
        let mut buf = EditorBuffer::from_text("a\nb");
        buf.move_end();
        buf.delete();
        assert_eq!(buf.text(), "ab");
    }

    #[test]
    fn test_multibyte_cursor() {
        let mut buf = EditorBuffer::from_text("héllo");
        buf.move_right();
        buf.move_right();
        buf.insert_char('!');
        assert_eq!(buf.text(), "hé!llo");
        assert_eq!(buf.cursor_display_col(), 3);
        buf.backspace();
        buf.backspace();
        assert_eq!(buf.text(), "hllo");
    }

    #[test]
    fn test_vertical_moves_clamp_column() {
        let mut buf = EditorBuffer::from_text("long line\nab");
        buf.move_end();
        buf.move_down();
        assert_eq!(buf.cursor(), (1, 2));
        buf.move_up();
        assert_eq!(buf.cursor(), (0, 2));
    }

    #[test]
    fn test_new_app_loads_template() {
        let app = app();
        assert_eq!(app.editor.text(), app.language.starter_template);
        assert!(!app.display().is_busy);
    }

    #[tokio::test]
    async fn test_run_flow_disables_second_run() {
        let mut app = app();
        let pending = app.request_run().unwrap();
        assert!(app.display().is_busy);
        assert!(app.request_run().is_none());

        app.apply_settlement(pending.execute().await);
        assert_eq!(app.session.state().phase, Phase::Settled);
        assert_eq!(app.display().stdout_text, "ran 71");
        assert!(app.request_run().is_some());
    }

    #[tokio::test]
    async fn test_clear_discards_in_flight_result() {
        let mut app = app();
        let pending = app.request_run().unwrap();
        app.clear_output();
        app.apply_settlement(pending.execute().await);
        assert_eq!(app.session.state().phase, Phase::Idle);
        assert!(!app.display().has_output());
    }

    #[test]
    fn test_picker_switches_language_and_template() {
        let mut app = app();
        app.editor.insert_str("garbage");
        app.open_picker();
        assert_eq!(app.picker, Some(2));
        app.picker_down();
        app.picker_down();
        app.confirm_picker();
        assert_eq!(app.language.key, "javascript");
        assert_eq!(app.editor.text(), app.language.starter_template);
        assert!(app.picker.is_none());
    }

    #[test]
    fn test_picker_bounds() {
        let mut app = app();
        app.open_picker();
        for _ in 0..20 {
            app.picker_down();
        }
        assert_eq!(app.picker, Some(7));
        for _ in 0..20 {
            app.picker_up();
        }
        assert_eq!(app.picker, Some(0));
        app.close_picker();
        assert_eq!(app.language.key, "python");
    }
}
