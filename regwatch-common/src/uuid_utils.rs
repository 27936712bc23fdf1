//! UUID utilities

use uuid::Uuid;

/// Generate a new UUIDv4
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// Parse a submission identifier supplied by a user
///
/// Surrounding whitespace is ignored.
pub fn parse(s: &str) -> crate::Result<Uuid> {
    Uuid::parse_str(s.trim())
        .map_err(|e| crate::Error::InvalidInput(format!("Invalid identifier '{}': {}", s, e)))
}

/// First eight hex digits of a UUID, for compact terminal output
pub fn short(id: &Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}
