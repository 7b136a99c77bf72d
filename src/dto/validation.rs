//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::state::session::BOT_USERNAME;

/// Maximum accepted username length, matching the persistence column width.
const MAX_USERNAME_LEN: usize = 100;

/// Validates a username supplied in a `join` message.
///
/// Usernames double as the rejoin identity, so they must be non-empty,
/// bounded, free of control characters, and must not collide with the
/// reserved bot name.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        let mut err = ValidationError::new("username_empty");
        err.message = Some("Username must not be empty".into());
        return Err(err);
    }

    if username.len() > MAX_USERNAME_LEN {
        let mut err = ValidationError::new("username_length");
        err.message = Some(
            format!(
                "Username must be at most {MAX_USERNAME_LEN} bytes (got {})",
                username.len()
            )
            .into(),
        );
        return Err(err);
    }

    if username.chars().any(char::is_control) {
        let mut err = ValidationError::new("username_format");
        err.message = Some("Username must not contain control characters".into());
        return Err(err);
    }

    if username == BOT_USERNAME {
        let mut err = ValidationError::new("username_reserved");
        err.message = Some(format!("Username `{BOT_USERNAME}` is reserved").into());
        return Err(err);
    }

    Ok(())
}
