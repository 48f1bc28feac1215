use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::db::StorageError;
use crate::models::{require_nonblank, UserRole};

pub fn create_user_role(conn: &Connection, role: &UserRole) -> Result<UserRole, StorageError> {
    if role.role_id.is_some() {
        return Err(StorageError::Validation(
            "role_id is assigned by the store and must be unset on create".into(),
        ));
    }
    require_nonblank("role_name", &role.role_name)?;

    conn.execute(
        "INSERT INTO user_roles (role_name) VALUES (?1)",
        params![role.role_name],
    )?;
    let role_id = conn.last_insert_rowid();
    debug!("Created role {role_id} ({})", role.role_name);

    Ok(UserRole {
        role_id: Some(role_id),
        role_name: role.role_name.clone(),
    })
}

pub fn get_user_role(conn: &Connection, role_id: i64) -> Result<Option<UserRole>, StorageError> {
    let role = conn
        .query_row(
            "SELECT role_id, role_name FROM user_roles WHERE role_id = ?1",
            params![role_id],
            |row| {
                Ok(UserRole {
                    role_id: Some(row.get(0)?),
                    role_name: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(role)
}

/// Replace the name of an existing role.
pub fn update_user_role(conn: &Connection, role: &UserRole) -> Result<UserRole, StorageError> {
    let role_id = role.role_id.ok_or_else(|| {
        StorageError::Validation("role_id is required on update".into())
    })?;
    require_nonblank("role_name", &role.role_name)?;

    let updated = conn.execute(
        "UPDATE user_roles SET role_name = ?1 WHERE role_id = ?2",
        params![role.role_name, role_id],
    )?;
    if updated == 0 {
        return Err(StorageError::NotFound {
            entity: "user_role",
            id: role_id,
        });
    }
    Ok(role.clone())
}

/// Delete a role. Assignment rows referencing it are removed by cascade.
///
/// Returns whether a row was actually deleted; a missing id is not an error.
pub fn delete_user_role(conn: &Connection, role_id: i64) -> Result<bool, StorageError> {
    let deleted = conn.execute(
        "DELETE FROM user_roles WHERE role_id = ?1",
        params![role_id],
    )?;
    if deleted > 0 {
        debug!("Deleted role {role_id}");
    }
    Ok(deleted > 0)
}

pub(crate) fn role_exists(conn: &Connection, role_id: i64) -> Result<bool, StorageError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM user_roles WHERE role_id = ?1",
        params![role_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}
