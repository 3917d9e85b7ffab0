//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! Limits are chosen based on:
//! - Reasonable UX limits for names and metadata
//! - SQLite TEXT has no built-in length enforcement

use rust_decimal::Decimal;

use crate::db::models::Location;
use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Spot names
pub const MAX_NAME_LEN: usize = 200;

/// Extended-info keys
pub const MAX_KEY_LEN: usize = 100;

/// Extended-info values
pub const MAX_VALUE_LEN: usize = 500;

// ── Validation helpers (CRUD handlers) ──────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that a location, if present, holds coordinates in decimal-degree range.
pub fn validate_location(location: &Option<Location>) -> Result<(), AppError> {
    if let Some(loc) = location {
        let ninety = Decimal::from(90);
        if loc.latitude < -ninety || loc.latitude > ninety {
            return Err(AppError::validation(format!(
                "latitude {} outside [-90, 90]",
                loc.latitude
            )));
        }
        let one_eighty = Decimal::from(180);
        if loc.longitude < -one_eighty || loc.longitude > one_eighty {
            return Err(AppError::validation(format!(
                "longitude {} outside [-180, 180]",
                loc.longitude
            )));
        }
    }
    Ok(())
}

/// Validate an extended-info map: non-empty keys, bounded key/value lengths.
pub fn validate_extended_info<'a>(
    entries: impl Iterator<Item = (&'a String, &'a String)>,
) -> Result<(), AppError> {
    for (key, value) in entries {
        validate_required_text(key, "extended_info key", MAX_KEY_LEN)?;
        if value.len() > MAX_VALUE_LEN {
            return Err(AppError::validation(format!(
                "extended_info value for '{key}' is too long ({} chars, max {MAX_VALUE_LEN})",
                value.len()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn rejects_empty_name() {
        assert!(validate_required_text("   ", "name", MAX_NAME_LEN).is_err());
        assert!(validate_required_text("Study Room", "name", MAX_NAME_LEN).is_ok());
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let bad = Some(Location {
            latitude: Decimal::from(91),
            longitude: Decimal::from(0),
        });
        assert!(validate_location(&bad).is_err());

        let good = Some(Location {
            latitude: Decimal::from(55),
            longitude: Decimal::from(30),
        });
        assert!(validate_location(&good).is_ok());
        assert!(validate_location(&None).is_ok());
    }
}
