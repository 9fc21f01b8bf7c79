//! Session store
//!
//! Holds the chat transcript and the conversation handle for one
//! interactive session. There is exactly one session per process and it is
//! passed by reference to every operation; no ambient globals.
//!
//! Handle lifecycle: `Uninitialized -> Open -> (clear / credential change)
//! -> Uninitialized`. The `Uninitialized -> Open` transition happens either
//! eagerly when a credential is available or lazily on the first send,
//! depending on [`OpenPolicy`].

use crate::chat::Turn;
use crate::config::OpenPolicy;
use crate::error::{ChatError, ChatResult};
use crate::gateway::{ConversationHandle, ModelGateway};
use tracing::{info, warn};

/// State of the conversation handle
#[derive(Debug)]
pub enum HandleState {
    /// No remote conversation; credentials absent, not yet opened, or
    /// invalidated by `clear`
    Uninitialized,
    /// An open remote conversation
    Open(ConversationHandle),
}

/// One interactive chat session: transcript plus conversation handle
pub struct Session {
    transcript: Vec<Turn>,
    handle: HandleState,
    credential: Option<String>,
    open_policy: OpenPolicy,
}

impl Session {
    /// Create a fresh session with an empty transcript and an unopened
    /// handle
    pub fn new(credential: Option<String>, open_policy: OpenPolicy) -> Self {
        Session {
            transcript: Vec::new(),
            handle: HandleState::Uninitialized,
            credential,
            open_policy,
        }
    }

    /// The transcript, chronological
    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    /// Append a turn to the end of the transcript
    pub fn append(&mut self, turn: Turn) {
        self.transcript.push(turn);
    }

    /// Empty the transcript and invalidate the conversation handle.
    /// Idempotent; a fresh handle must be opened before the next exchange.
    pub fn clear(&mut self) {
        self.transcript.clear();
        self.handle = HandleState::Uninitialized;
        info!("session cleared");
    }

    /// Current conversation handle, or `None` when uninitialized
    pub fn handle(&self) -> Option<&ConversationHandle> {
        match &self.handle {
            HandleState::Open(handle) => Some(handle),
            HandleState::Uninitialized => None,
        }
    }

    /// Whether the handle is open
    pub fn is_open(&self) -> bool {
        matches!(self.handle, HandleState::Open(_))
    }

    /// The credential this session is bound to, if any
    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    /// The configured open policy
    pub fn open_policy(&self) -> OpenPolicy {
        self.open_policy
    }

    /// Replace the credential. Any open handle is tied to the old
    /// credential and is invalidated.
    pub fn set_credential(&mut self, credential: Option<String>) {
        self.credential = credential;
        self.handle = HandleState::Uninitialized;
    }

    /// Open the conversation handle. No-op when already open; fails with
    /// [`ChatError::InvalidCredential`] when no credential is configured.
    /// On failure the handle stays `Uninitialized`.
    pub async fn open<G: ModelGateway + ?Sized>(&mut self, gateway: &G) -> ChatResult<()> {
        if self.is_open() {
            return Ok(());
        }

        let credential = self.credential.clone().ok_or_else(|| {
            ChatError::InvalidCredential {
                reason: "no API key configured".to_string(),
            }
        })?;

        let handle = gateway.open(&credential).await?;
        self.handle = HandleState::Open(handle);
        Ok(())
    }

    /// Handle one user submission as a single unit of work: open the
    /// handle if needed, send through the gateway, and commit the turns.
    /// Returns the reply text.
    ///
    /// On success the transcript grows by exactly two turns. When opening
    /// fails it grows by zero. When the send itself fails the user turn
    /// stays with no model turn — the transcript is visibly unanswered and
    /// the handle remains open, so the user may simply send again.
    pub async fn exchange<G: ModelGateway + ?Sized>(
        &mut self,
        gateway: &G,
        text: &str,
    ) -> ChatResult<&str> {
        let handle = self.detach_handle();
        match perform_exchange(gateway, handle, self.credential.as_deref(), text).await {
            ExchangeOutcome::Reply {
                handle,
                text: reply,
            } => {
                self.attach_handle(handle);
                self.append(Turn::user(text));
                self.append(Turn::model(reply));
                let reply = self
                    .transcript
                    .last()
                    .map(|turn| turn.text.as_str())
                    .unwrap_or_default();
                Ok(reply)
            }
            ExchangeOutcome::SendFailed { handle, error } => {
                self.attach_handle(handle);
                self.append(Turn::user(text));
                warn!(error = %error, "exchange failed; user turn left unanswered");
                Err(error)
            }
            ExchangeOutcome::OpenFailed { error } => Err(error),
        }
    }

    /// Take ownership of the open handle so it can travel with an
    /// in-flight exchange task; pair with [`Session::attach_handle`].
    pub fn detach_handle(&mut self) -> Option<ConversationHandle> {
        match std::mem::replace(&mut self.handle, HandleState::Uninitialized) {
            HandleState::Open(handle) => Some(handle),
            HandleState::Uninitialized => None,
        }
    }

    /// Re-install a handle previously detached for an in-flight exchange
    pub fn attach_handle(&mut self, handle: ConversationHandle) {
        self.handle = HandleState::Open(handle);
    }
}

/// Outcome of the remote half of one exchange
pub enum ExchangeOutcome {
    /// The model replied; the handle comes back with its history extended
    Reply {
        handle: ConversationHandle,
        text: String,
    },
    /// The send failed on an open conversation. The handle is still
    /// usable, and the user turn belongs in the transcript, unanswered.
    SendFailed {
        handle: ConversationHandle,
        error: ChatError,
    },
    /// No conversation could be opened; nothing was sent, so the
    /// transcript must not grow
    OpenFailed { error: ChatError },
}

/// Run the remote half of one exchange: open a conversation when none is
/// supplied, then send one message.
///
/// Owns no session state, so callers may run it on a spawned task and fold
/// the outcome back into the session when it arrives; [`Session::exchange`]
/// folds inline. Keeping both callers on this one path keeps their
/// open-failure behavior identical.
pub async fn perform_exchange<G: ModelGateway + ?Sized>(
    gateway: &G,
    handle: Option<ConversationHandle>,
    credential: Option<&str>,
    text: &str,
) -> ExchangeOutcome {
    let mut handle = match handle {
        Some(handle) => handle,
        None => {
            let Some(credential) = credential else {
                return ExchangeOutcome::OpenFailed {
                    error: ChatError::InvalidCredential {
                        reason: "no API key configured".to_string(),
                    },
                };
            };
            match gateway.open(credential).await {
                Ok(handle) => handle,
                Err(error) => return ExchangeOutcome::OpenFailed { error },
            }
        }
    };

    match gateway.send(&mut handle, text).await {
        Ok(text) => ExchangeOutcome::Reply { handle, text },
        Err(error) => ExchangeOutcome::SendFailed { handle, error },
    }
}
