use regex::Regex;

use crate::filter::WILDCARD;
use crate::ValidationError;

/// Validates a user-entered name filter.
///
/// Empty input and `*` both mean "any name". Anything else must compile
/// as a regular expression and is returned unchanged.
pub fn validate_name_pattern(raw: &str) -> Result<String, ValidationError> {
    if raw.is_empty() || raw == WILDCARD {
        return Ok(WILDCARD.to_string());
    }
    match Regex::new(raw) {
        Ok(_) => Ok(raw.to_string()),
        Err(e) => {
            tracing::debug!(pattern = raw, error = %e, "rejected name pattern");
            Err(ValidationError::InvalidPattern {
                pattern: raw.to_string(),
                reason: e.to_string(),
            })
        }
    }
}
