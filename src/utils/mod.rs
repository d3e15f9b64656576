//! Small helpers shared by the route modules.

use bookbuddy_http::AppError;
use uuid::Uuid;

/// Parse a path id. Anything that is not a UUID cannot name a stored
/// document, so it is reported as missing.
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::not_found(format!("{what} not found")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_ids_are_not_found() {
        assert!(matches!(
            parse_id("abc", "book"),
            Err(AppError::NotFound { .. })
        ));

        let id = Uuid::now_v7();
        assert_eq!(parse_id(&id.to_string(), "book").unwrap(), id);
    }
}
