//! Shared helpers

use crate::error::{ChatError, ChatResult};

/// Sanitize an API key before it is used in a request URL.
///
/// Catches obviously malformed credentials locally so they never reach the
/// network: empty strings, embedded whitespace, control characters, DEL.
/// Returns the trimmed key on success.
pub fn sanitize_credential(value: &str) -> ChatResult<String> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(ChatError::InvalidCredential {
            reason: "API key is empty".to_string(),
        });
    }

    for (index, ch) in trimmed.char_indices() {
        if ch.is_control() || ch.is_whitespace() {
            return Err(ChatError::InvalidCredential {
                reason: format!(
                    "API key contains invalid character at position {} ({:?})",
                    index, ch
                ),
            });
        }
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_key_is_trimmed() {
        let key = sanitize_credential("  AIzaSyExample123  ").unwrap();
        assert_eq!(key, "AIzaSyExample123");
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(
            sanitize_credential(""),
            Err(ChatError::InvalidCredential { .. })
        ));
        assert!(matches!(
            sanitize_credential("   "),
            Err(ChatError::InvalidCredential { .. })
        ));
    }

    #[test]
    fn test_control_characters_rejected() {
        assert!(sanitize_credential("abc\ndef").is_err());
        assert!(sanitize_credential("abc\tdef").is_err());
        assert!(sanitize_credential("abc def").is_err());
        assert!(sanitize_credential("abc\u{7f}def").is_err());
    }
}
