//! Repository layer — entity-scoped database operations over a borrowed
//! connection. All public functions are re-exported here.

mod chat;
mod datum;
mod user;
mod user_role;

pub use chat::*;
pub use datum::*;
pub use user::*;
pub use user_role::*;

use chrono::{NaiveDate, NaiveDateTime};

use super::StorageError;
pub(crate) use crate::models::require_nonblank;

// Zero-padded ISO text compares lexicographically, so open-ended time
// ranges bind these sentinels instead of branching on the SQL.
pub(crate) const MIN_TS: &str = "0000-01-01 00:00:00";
pub(crate) const MAX_TS: &str = "9999-12-31 23:59:59";

pub(crate) fn fmt_datetime(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub(crate) fn parse_datetime(field: &'static str, s: &str) -> Result<NaiveDateTime, StorageError> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| StorageError::Validation(format!("invalid {field} timestamp in storage: {s}")))
}

pub(crate) fn parse_date(field: &'static str, s: &str) -> Result<NaiveDate, StorageError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| StorageError::Validation(format!("invalid {field} date in storage: {s}")))
}
