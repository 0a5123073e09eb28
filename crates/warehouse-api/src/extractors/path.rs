//! Typed path parameter helpers.

use uuid::Uuid;

use warehouse_core::AppError;

/// Parses a UUID from a path segment.
pub fn parse_uuid(s: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(s).map_err(|_| AppError::validation(format!("Invalid UUID: {s}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use warehouse_core::ErrorKind;

    #[test]
    fn test_parse_uuid() {
        let id = Uuid::now_v7();
        assert_eq!(parse_uuid(&id.to_string()).unwrap(), id);
        assert_eq!(parse_uuid("42").unwrap_err().kind, ErrorKind::Validation);
    }
}
