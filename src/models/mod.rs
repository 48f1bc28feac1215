pub mod chat;
pub mod datum;
pub mod enums;
pub mod user;

pub use chat::*;
pub use datum::*;
pub use enums::*;
pub use user::*;

use crate::db::StorageError;

/// Reject blank or whitespace-only text for a required field.
pub(crate) fn require_nonblank(field: &'static str, value: &str) -> Result<(), StorageError> {
    if value.trim().is_empty() {
        return Err(StorageError::Validation(format!("{field} cannot be blank")));
    }
    Ok(())
}
