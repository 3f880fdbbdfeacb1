//! Async event loop for the terminal editor.

use std::io;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use tokio::sync::mpsc;

use super::{app::App, events::TuiEvent, ui::render_ui};
use crate::{
    config::Config,
    execution::ExecutionClient,
    languages::{LanguageDescriptor, Registry},
};

/// Run the editor until the user quits.
pub async fn run_editor(
    cfg: &Config,
    registry: Registry,
    language: &'static LanguageDescriptor,
    code: Option<String>,
) -> Result<()> {
    let client = ExecutionClient::from_config(cfg)?;
    let api_url = client.base_url().to_string();
    let mut app = App::new(registry, Arc::new(client), language, code, api_url);
    tracing::info!(language = language.key, api = %app.api_url, "editor started");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (event_tx, event_rx) = mpsc::unbounded_channel::<TuiEvent>();

    let result = run_app(&mut terminal, &mut app, event_tx, event_rx).await;

    // Restore terminal
    disable_raw_mode()?;
    terminal.backend_mut().execute(DisableBracketedPaste)?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Main application loop
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    event_tx: mpsc::UnboundedSender<TuiEvent>,
    mut event_rx: mpsc::UnboundedReceiver<TuiEvent>,
) -> Result<()> {
    // Spawn input handler; it stops once the loop below exits.
    let stop = Arc::new(AtomicBool::new(false));
    let input_tx = event_tx.clone();
    let input_stop = Arc::clone(&stop);
    tokio::task::spawn_blocking(move || {
        while !input_stop.load(Ordering::Relaxed) {
            if !event::poll(Duration::from_millis(100)).unwrap_or(false) {
                continue;
            }
            let ev = match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => TuiEvent::Key(key),
                Ok(Event::Paste(text)) => TuiEvent::Paste(text),
                Ok(_) => continue,
                Err(e) => {
                    tracing::error!(error = %e, "terminal input failed");
                    TuiEvent::Quit
                }
            };
            if input_tx.send(ev).is_err() {
                break; // Channel closed
            }
        }
    });

    let outcome = event_loop(terminal, app, &event_tx, &mut event_rx).await;
    stop.store(true, Ordering::Relaxed);
    outcome
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    event_tx: &mpsc::UnboundedSender<TuiEvent>,
    event_rx: &mut mpsc::UnboundedReceiver<TuiEvent>,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render_ui(frame, app))?;

        let mut quit = false;
        while let Ok(tui_event) = event_rx.try_recv() {
            match tui_event {
                TuiEvent::Key(key) => {
                    if handle_key_event(app, key, event_tx) {
                        quit = true;
                    }
                }
                TuiEvent::Paste(text) => {
                    if app.picker.is_none() {
                        app.editor.insert_str(&text);
                    }
                }
                TuiEvent::Settled(settlement) => app.apply_settlement(settlement),
                TuiEvent::Quit => quit = true,
            }
            if quit {
                break;
            }
        }
        if quit {
            return Ok(());
        }

        // Small delay to prevent busy waiting
        tokio::time::sleep(Duration::from_millis(16)).await; // ~60 FPS
    }
}

/// Handle keyboard events. Returns true when the user asked to quit.
fn handle_key_event(app: &mut App, key: KeyEvent, event_tx: &mpsc::UnboundedSender<TuiEvent>) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q')) {
        return true;
    }

    // Help overlay: any key closes it
    if app.show_help {
        app.toggle_help();
        return false;
    }

    if app.picker.is_some() {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => app.picker_up(),
            KeyCode::Down | KeyCode::Char('j') => app.picker_down(),
            KeyCode::Enter => app.confirm_picker(),
            KeyCode::Esc | KeyCode::F(2) => app.close_picker(),
            _ => {}
        }
        return false;
    }

    match key.code {
        KeyCode::Char('r') if ctrl => spawn_run(app, event_tx),
        KeyCode::F(5) => spawn_run(app, event_tx),
        KeyCode::Char('l') if ctrl => app.clear_output(),
        KeyCode::Char('t') if ctrl => app.reset_template(),
        KeyCode::F(1) => app.toggle_help(),
        KeyCode::F(2) => app.open_picker(),
        KeyCode::PageUp => app.scroll_output_up(),
        KeyCode::PageDown => app.scroll_output_down(),
        KeyCode::Enter => app.editor.insert_newline(),
        KeyCode::Tab => app.editor.insert_tab(),
        KeyCode::Backspace => app.editor.backspace(),
        KeyCode::Delete => app.editor.delete(),
        KeyCode::Left => app.editor.move_left(),
        KeyCode::Right => app.editor.move_right(),
        KeyCode::Up => app.editor.move_up(),
        KeyCode::Down => app.editor.move_down(),
        KeyCode::Home => app.editor.move_home(),
        KeyCode::End => app.editor.move_end(),
        KeyCode::Char(c) if !ctrl => app.editor.insert_char(c),
        _ => {}
    }

    false
}

/// Begin a run and settle it back into the loop from a spawned task.
fn spawn_run(app: &mut App, event_tx: &mpsc::UnboundedSender<TuiEvent>) {
    let Some(pending) = app.request_run() else {
        return;
    };
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let settlement = pending.execute().await;
        if tx.send(TuiEvent::Settled(settlement)).is_err() {
            tracing::debug!("editor closed before run settled");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::{ExecutionRequest, ExecutionResult, Executor, RunOutput};
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl Executor for Echo {
        async fn submit(&self, request: ExecutionRequest) -> ExecutionResult {
            ExecutionResult::Success(RunOutput {
                stdout: Some(request.source_code),
                ..RunOutput::default()
            })
        }
    }

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[tokio::test]
    async fn test_ctrl_r_runs_and_settles_through_channel() {
        let reg = Registry::builtin();
        let mut app = App::new(reg, Arc::new(Echo), reg.describe("rust"), Some("fn main() {}".into()), String::new());
        let (tx, mut rx) = mpsc::unbounded_channel();

        assert!(!handle_key_event(&mut app, press(KeyCode::Char('r'), KeyModifiers::CONTROL), &tx));
        assert!(app.display().is_busy);

        match rx.recv().await {
            Some(TuiEvent::Settled(s)) => app.apply_settlement(s),
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(app.display().stdout_text, "fn main() {}");
    }

    #[test]
    fn test_typing_and_quit() {
        let reg = Registry::builtin();
        let mut app = App::new(reg, Arc::new(Echo), reg.describe("go"), Some(String::new()), String::new());
        let (tx, _rx) = mpsc::unbounded_channel();

        for c in "hi".chars() {
            handle_key_event(&mut app, press(KeyCode::Char(c), KeyModifiers::NONE), &tx);
        }
        handle_key_event(&mut app, press(KeyCode::Enter, KeyModifiers::NONE), &tx);
        assert_eq!(app.editor.text(), "hi\n");
        assert!(handle_key_event(&mut app, press(KeyCode::Char('q'), KeyModifiers::CONTROL), &tx));
    }

    #[test]
    fn test_picker_captures_keys() {
        let reg = Registry::builtin();
        let mut app = App::new(reg, Arc::new(Echo), reg.describe("c"), None, String::new());
        let (tx, _rx) = mpsc::unbounded_channel();

        handle_key_event(&mut app, press(KeyCode::F(2), KeyModifiers::NONE), &tx);
        handle_key_event(&mut app, press(KeyCode::Char('j'), KeyModifiers::NONE), &tx);
        handle_key_event(&mut app, press(KeyCode::Enter, KeyModifiers::NONE), &tx);
        assert_eq!(app.language.key, "cpp");
        assert_eq!(app.editor.text(), app.language.starter_template);
    }
}
