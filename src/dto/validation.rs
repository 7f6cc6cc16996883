//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a display name has at least one non-whitespace character.
///
/// # Examples
///
/// ```ignore
/// validate_not_blank("Azul")  // Ok
/// validate_not_blank("   ")   // Err
/// ```
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Name must not be blank".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_not_blank_valid() {
        assert!(validate_not_blank("Azul").is_ok());
        assert!(validate_not_blank(" Ann ").is_ok());
    }

    #[test]
    fn test_validate_not_blank_invalid() {
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank(" \t\n").is_err());
    }
}
