//! Per-session UI state
//!
//! `App` owns the `Session` and the gateway for the lifetime of the
//! interactive session. Each submission is one unit of work: the prompt is
//! held as pending, the conversation handle travels with a spawned task for
//! the duration of the remote call (so the spinner can animate), and the
//! outcome comes back over a channel to be applied on the UI loop. The
//! transcript is only touched once the outcome proves a conversation
//! existed, so a failed open grows it by zero. The input is gated while a
//! request is pending, so there is never more than one exchange in flight.

use gemchat_core::chat::Turn;
use gemchat_core::error::ChatError;
use gemchat_core::gateway::ModelGateway;
use gemchat_core::session::{perform_exchange, ExchangeOutcome, Session};
use std::sync::Arc;
use tokio::sync::mpsc;

/// What the UI is doing right now
#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    /// Waiting for input
    Idle,
    /// A request is in flight
    Thinking,
    /// Last exchange failed; message shown in the banner until the next
    /// submission or clear
    Error(String),
}

/// Core application state for the chat TUI
pub struct App {
    pub session: Session,
    pub gateway: Arc<dyn ModelGateway>,
    pub model: String,

    // Input line
    pub input: String,
    pub cursor: usize,

    /// Prompt of the in-flight exchange. Rendered below the transcript
    /// while thinking; committed as a user turn only once the outcome
    /// arrives with a handle attached.
    pub pending_prompt: Option<String>,

    // Transcript viewport
    pub scroll: usize,
    pub auto_scroll: bool,

    pub state: AppState,
    pub should_quit: bool,
    pub tick: u64,

    pub outcome_tx: mpsc::UnboundedSender<ExchangeOutcome>,
    pub outcome_rx: mpsc::UnboundedReceiver<ExchangeOutcome>,
}

impl App {
    pub fn new(session: Session, gateway: Arc<dyn ModelGateway>, model: String) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        App {
            session,
            gateway,
            model,
            input: String::new(),
            cursor: 0,
            pending_prompt: None,
            scroll: 0,
            auto_scroll: true,
            state: AppState::Idle,
            should_quit: false,
            tick: 0,
            outcome_tx,
            outcome_rx,
        }
    }

    /// Whether a request is in flight
    pub fn busy(&self) -> bool {
        matches!(self.state, AppState::Thinking)
    }

    /// Put an error in the banner
    pub fn show_error(&mut self, error: &ChatError) {
        self.state = AppState::Error(error.to_string());
    }

    /// Submit the current input line as one exchange
    pub fn submit(&mut self) {
        if self.busy() {
            return;
        }
        let text = self.input.trim().to_string();
        if text.is_empty() {
            return;
        }

        let Some(credential) = self.session.credential().map(str::to_string) else {
            self.state = AppState::Error(
                "No API key configured. Restart with GOOGLE_API_KEY set or use --api-key."
                    .to_string(),
            );
            return;
        };

        self.input.clear();
        self.cursor = 0;
        self.auto_scroll = true;

        self.pending_prompt = Some(text.clone());
        self.state = AppState::Thinking;

        let gateway = Arc::clone(&self.gateway);
        let handle = self.session.detach_handle();
        let tx = self.outcome_tx.clone();

        tokio::spawn(async move {
            let outcome =
                perform_exchange(gateway.as_ref(), handle, Some(&credential), &text).await;
            let _ = tx.send(outcome);
        });
    }

    /// Apply the outcome of an in-flight exchange on the UI loop.
    ///
    /// The pending prompt becomes a transcript turn whenever a conversation
    /// existed (reply or failed send). When opening itself failed the
    /// transcript stays untouched and the prompt goes back into the input
    /// box for a retry.
    pub fn apply_outcome(&mut self, outcome: ExchangeOutcome) {
        let prompt = self.pending_prompt.take().unwrap_or_default();
        match outcome {
            ExchangeOutcome::Reply { handle, text } => {
                self.session.attach_handle(handle);
                self.session.append(Turn::user(prompt));
                self.session.append(Turn::model(text));
                self.state = AppState::Idle;
                self.auto_scroll = true;
            }
            ExchangeOutcome::SendFailed { handle, error } => {
                self.session.attach_handle(handle);
                self.session.append(Turn::user(prompt));
                self.show_error(&error);
            }
            ExchangeOutcome::OpenFailed { error } => {
                self.input = prompt;
                self.cursor = self.input.chars().count();
                self.show_error(&error);
            }
        }
    }

    /// Clear the chat history and invalidate the conversation. Ignored
    /// while an exchange is in flight: the detached handle will re-attach
    /// when the outcome lands, so clearing now would resurrect it.
    pub fn clear_history(&mut self) {
        if self.busy() {
            return;
        }
        self.session.clear();
        self.scroll = 0;
        self.auto_scroll = true;
        self.state = AppState::Idle;
    }

    // Input line editing

    pub fn enter_char(&mut self, new_char: char) {
        if new_char == '\r' {
            return;
        }
        if self.cursor >= self.input.chars().count() {
            self.input.push(new_char);
        } else {
            let byte_idx = self
                .input
                .char_indices()
                .nth(self.cursor)
                .map(|(i, _)| i)
                .unwrap_or(self.input.len());
            self.input.insert(byte_idx, new_char);
        }
        self.cursor += 1;
    }

    pub fn delete_char(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let byte_idx = self
            .input
            .char_indices()
            .nth(self.cursor - 1)
            .map(|(i, _)| i);
        if let Some(idx) = byte_idx {
            self.input.remove(idx);
            self.cursor -= 1;
        }
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor < self.input.chars().count() {
            self.cursor += 1;
        }
    }

    pub fn move_cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor = self.input.chars().count();
    }

    // Transcript scrolling; offsets are clamped during rendering

    pub fn scroll_up(&mut self) {
        self.auto_scroll = false;
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_add(1);
    }
}
