// Validation utilities module
// Custom validation functions used by the review request DTOs

use validator::ValidationError;

/// Validates that text content is non-empty after trimming whitespace
pub fn validate_not_blank(content: &str) -> Result<(), ValidationError> {
    if content.trim().is_empty() {
        let mut err = ValidationError::new("content_blank");
        err.message = Some("Content must not be empty".into());
        Err(err)
    } else {
        Ok(())
    }
}
