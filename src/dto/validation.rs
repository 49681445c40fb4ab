//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest team name accepted by the setup endpoint, in characters.
pub const MAX_TEAM_NAME_CHARS: usize = 64;

/// Validates that a team name is not blank and at most [`MAX_TEAM_NAME_CHARS`] long once trimmed.
///
/// # Examples
///
/// ```ignore
/// validate_team_name("Sand Sharks") // Ok
/// validate_team_name("   ")         // Err - blank
/// ```
pub fn validate_team_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("team_name_blank");
        err.message = Some("Team name must not be blank".into());
        return Err(err);
    }

    let length = trimmed.chars().count();
    if length > MAX_TEAM_NAME_CHARS {
        let mut err = ValidationError::new("team_name_length");
        err.message = Some(
            format!("Team name must be at most {MAX_TEAM_NAME_CHARS} characters (got {length})")
                .into(),
        );
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_team_name_valid() {
        assert!(validate_team_name("Sand Sharks").is_ok());
        assert!(validate_team_name("  Dune Riders  ").is_ok());
        assert!(validate_team_name("Équipe Été").is_ok());
        assert!(validate_team_name(&"x".repeat(MAX_TEAM_NAME_CHARS)).is_ok());
    }

    #[test]
    fn test_validate_team_name_blank() {
        assert!(validate_team_name("").is_err());
        assert!(validate_team_name("   \t").is_err());
    }

    #[test]
    fn test_validate_team_name_too_long() {
        let err = validate_team_name(&"x".repeat(MAX_TEAM_NAME_CHARS + 1)).unwrap_err();
        assert_eq!(err.code, "team_name_length");
        // Length is counted in characters, not bytes.
        assert!(validate_team_name(&"é".repeat(MAX_TEAM_NAME_CHARS)).is_ok());
    }
}
