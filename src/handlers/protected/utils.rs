use uuid::Uuid;

use crate::error::ApiError;

/// Parse a path id, answering 400 for anything that is not a UUID
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::validation_error(format!("Invalid {} id '{}'", what, raw)))
}
