//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest player name accepted, counted in characters after trimming.
pub const MAX_PLAYER_NAME_CHARS: usize = 24;

/// Validates that a player name is non-blank and at most [`MAX_PLAYER_NAME_CHARS`] once trimmed.
///
/// # Examples
///
/// ```ignore
/// validate_player_name("Ada")        // Ok
/// validate_player_name("   ")        // Err - blank
/// validate_player_name(&"x".repeat(25)) // Err - too long
/// ```
pub fn validate_player_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("player_name_empty");
        err.message = Some("Player name must not be empty".into());
        return Err(err);
    }

    let chars = trimmed.chars().count();
    if chars > MAX_PLAYER_NAME_CHARS {
        let mut err = ValidationError::new("player_name_length");
        err.message = Some(
            format!("Player name must be at most {MAX_PLAYER_NAME_CHARS} characters (got {chars})")
                .into(),
        );
        return Err(err);
    }

    Ok(())
}
