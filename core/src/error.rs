//! Structured error types for gemchat
//!
//! Errors are typed values returned from `open`/`send` and translated to
//! UI banners at the boundary. None of them are fatal to the process: each
//! failure is scoped to the current session or exchange.

use thiserror::Error;

/// Primary error type for chat operations
#[derive(Error, Debug)]
pub enum ChatError {
    /// Missing, malformed, or rejected API key.
    ///
    /// Recoverable by supplying a valid credential; the conversation
    /// handle stays `Uninitialized`.
    #[error("invalid credential: {reason}")]
    InvalidCredential { reason: String },

    /// Transport or initialization failure while opening a conversation.
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String },

    /// Failure during a send (transport, quota, or content policy).
    ///
    /// The user turn appended before the call stays in the transcript;
    /// no model turn is appended.
    #[error("request failed: {message}")]
    RequestFailed {
        /// HTTP status from the remote service, if one was received
        status: Option<u16>,
        message: String,
    },
}

impl ChatError {
    /// Short label for UI banner headers
    pub fn label(&self) -> &'static str {
        match self {
            ChatError::InvalidCredential { .. } => "Invalid credential",
            ChatError::ServiceUnavailable { .. } => "Service unavailable",
            ChatError::RequestFailed { .. } => "Request failed",
        }
    }
}

pub type ChatResult<T> = Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ChatError::InvalidCredential {
            reason: "empty key".to_string(),
        };
        assert_eq!(err.to_string(), "invalid credential: empty key");

        let err = ChatError::RequestFailed {
            status: Some(429),
            message: "quota exceeded".to_string(),
        };
        assert_eq!(err.to_string(), "request failed: quota exceeded");
    }

    #[test]
    fn test_error_labels() {
        let err = ChatError::ServiceUnavailable {
            message: "connect timeout".to_string(),
        };
        assert_eq!(err.label(), "Service unavailable");
    }
}
