use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::require_nonblank;
use crate::db::StorageError;

/// A named role attachable to many users (e.g. "Doctor", "Admin").
///
/// `role_id` is assigned by the store on create and is immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRole {
    pub role_id: Option<i64>,
    pub role_name: String,
}

impl UserRole {
    /// Build an unpersisted role. Fails if the name is blank.
    pub fn new(role_name: impl Into<String>) -> Result<Self, StorageError> {
        let role_name = role_name.into();
        require_nonblank("role_name", &role_name)?;
        Ok(Self {
            role_id: None,
            role_name,
        })
    }
}

/// A user record with its assigned roles and care relationships.
///
/// `medical_staff` and `patients` are two views of a single directed
/// doctor -> patient edge set: `medical_staff` lists the doctors treating
/// this user, `patients` the users this user treats. On update only the
/// `patients` side is authoritative; `medical_staff` is derived when read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: Option<i64>,
    pub dob: NaiveDate,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub roles: Vec<UserRole>,
    #[serde(default)]
    pub medical_staff: Vec<User>,
    #[serde(default)]
    pub patients: Vec<User>,
}

impl User {
    /// Build an unpersisted user. Fails if either name is blank.
    pub fn new(
        dob: NaiveDate,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        roles: Vec<UserRole>,
    ) -> Result<Self, StorageError> {
        let first_name = first_name.into();
        let last_name = last_name.into();
        require_nonblank("first_name", &first_name)?;
        require_nonblank("last_name", &last_name)?;
        Ok(Self {
            user_id: None,
            dob,
            first_name,
            last_name,
            roles,
            medical_staff: Vec::new(),
            patients: Vec::new(),
        })
    }
}
