//! Chat TUI - terminal setup, teardown, and the main event loop
//!
//! One full-screen session: the transcript on top, a status line, and the
//! input box. The loop redraws at ~60fps so the progress spinner animates
//! while a request is in flight, and applies exchange outcomes as they
//! arrive on the app channel.

use crate::tui::app::{App, AppState};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::io;
use std::time::Duration;

pub mod app;
pub mod ui;

/// Main entry point for the chat TUI
pub async fn run(mut app: App) -> io::Result<()> {
    use crossterm::{
        execute,
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    };
    use ratatui::{backend::CrosstermBackend, Terminal};

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_event_loop(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Main event loop
async fn run_event_loop<B: ratatui::backend::Backend>(
    terminal: &mut ratatui::Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(16); // ~60 FPS

    loop {
        terminal.draw(|f| ui::render(f, app))?;

        if app.should_quit {
            return Ok(());
        }

        tokio::select! {
            _ = tokio::time::sleep(tick_rate) => {
                app.tick = app.tick.wrapping_add(1);
                if event::poll(Duration::from_secs(0))? {
                    match event::read()? {
                        Event::Key(key) => handle_key_event(app, key),
                        Event::Resize(_, _) => {}
                        _ => {}
                    }
                }
            }

            // Outcome of the in-flight exchange
            outcome = app.outcome_rx.recv() => {
                if let Some(outcome) = outcome {
                    app.apply_outcome(outcome);
                }
            }
        }
    }
}

fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind == KeyEventKind::Release {
        return;
    }

    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
        }
        KeyCode::Char('l') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.clear_history();
        }
        KeyCode::Enter => app.submit(),
        KeyCode::Backspace => app.delete_char(),
        KeyCode::Left => app.move_cursor_left(),
        KeyCode::Right => app.move_cursor_right(),
        KeyCode::Home => app.move_cursor_home(),
        KeyCode::End => app.move_cursor_end(),
        KeyCode::Up => app.scroll_up(),
        KeyCode::Down => app.scroll_down(),
        KeyCode::PageUp => {
            for _ in 0..10 {
                app.scroll_up();
            }
        }
        KeyCode::PageDown => {
            for _ in 0..10 {
                app.scroll_down();
            }
        }
        KeyCode::Char(c) => {
            // A dismissed error banner goes back to the hint line as soon
            // as the user starts typing again
            if matches!(app.state, AppState::Error(_)) {
                app.state = AppState::Idle;
            }
            app.enter_char(c);
        }
        _ => {}
    }
}
