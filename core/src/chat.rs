//! Chat transcript types
//!
//! A transcript is an ordered sequence of [`Turn`]s, one per message,
//! chronological by insertion. Turns are immutable once created.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of the turn author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person typing
    User,
    /// The remote model
    Model,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Model => write!(f, "model"),
        }
    }
}

/// One message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Who authored the turn
    pub role: Role,
    /// Text content
    pub text: String,
    /// When the turn was appended
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a new user turn
    pub fn user(text: impl Into<String>) -> Self {
        Turn {
            role: Role::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a new model turn
    pub fn model(text: impl Into<String>) -> Self {
        Turn {
            role: Role::Model,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_creation() {
        let user_turn = Turn::user("Hello");
        assert_eq!(user_turn.role, Role::User);
        assert_eq!(user_turn.text, "Hello");

        let model_turn = Turn::model("Hi there");
        assert_eq!(model_turn.role, Role::Model);
        assert_eq!(model_turn.text, "Hi there");
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(serde_json::to_string(&Role::Model).unwrap(), "\"model\"");
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Model.to_string(), "model");
    }
}
