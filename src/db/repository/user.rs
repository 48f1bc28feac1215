use std::collections::HashSet;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use super::user_role::role_exists;
use super::{parse_date, require_nonblank};
use crate::db::StorageError;
use crate::models::{User, UserRole};

/// Create a user together with its role assignments and any construction-time
/// relationships, in a single transaction.
///
/// Both `medical_staff` and `patients` entries are honored here so a patient
/// can be created already linked to an existing doctor. A reference to a
/// nonexistent role or user fails the whole operation with
/// [`StorageError::DanglingReference`].
pub fn create_user(conn: &Connection, user: &User) -> Result<User, StorageError> {
    if user.user_id.is_some() {
        return Err(StorageError::Validation(
            "user_id is assigned by the store and must be unset on create".into(),
        ));
    }
    require_nonblank("first_name", &user.first_name)?;
    require_nonblank("last_name", &user.last_name)?;

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO users (dob, first_name, last_name) VALUES (?1, ?2, ?3)",
        params![user.dob.to_string(), user.first_name, user.last_name],
    )?;
    let user_id = tx.last_insert_rowid();

    for role_id in role_id_set(&user.roles)? {
        insert_role_assignment(&tx, user_id, role_id)?;
    }
    for staff_id in user_id_set(&user.medical_staff)? {
        insert_relationship(&tx, staff_id, user_id)?;
    }
    for patient_id in user_id_set(&user.patients)? {
        insert_relationship(&tx, user_id, patient_id)?;
    }
    tx.commit()?;
    debug!("Created user {user_id}");

    require_user(conn, user_id)
}

/// Fetch one user, fully hydrated, or `None` if the id does not exist.
///
/// Hydration resolves `roles`, `medical_staff`, and `patients` to full
/// records on every call; nested users carry their own roles but empty
/// relationship lists.
pub fn get_user(conn: &Connection, user_id: i64) -> Result<Option<User>, StorageError> {
    let core = match get_user_core(conn, user_id)? {
        Some(core) => core,
        None => return Ok(None),
    };

    let user = User {
        medical_staff: related_users(conn, user_id, Side::MedicalStaff)?,
        patients: related_users(conn, user_id, Side::Patients)?,
        roles: roles_for_user(conn, user_id)?,
        ..core
    };
    Ok(Some(user))
}

/// Batch fetch. The result is aligned positionally with the input ids, with
/// `None` in the slot of any id that does not exist.
pub fn get_users(conn: &Connection, user_ids: &[i64]) -> Result<Vec<Option<User>>, StorageError> {
    user_ids.iter().map(|id| get_user(conn, *id)).collect()
}

/// Update a user's core fields and reconcile its role and patient sets
/// against the desired state, applying only the delta.
///
/// Only the `patients` side of the relationship is authoritative here;
/// `medical_staff` is derived at read time and ignored on update. Mutating a
/// user's `patients` list is the only way to add or remove a doctor/patient
/// edge.
pub fn update_user(conn: &Connection, user: &User) -> Result<User, StorageError> {
    let user_id = user
        .user_id
        .ok_or_else(|| StorageError::Validation("user_id is required on update".into()))?;
    require_nonblank("first_name", &user.first_name)?;
    require_nonblank("last_name", &user.last_name)?;

    let tx = conn.unchecked_transaction()?;
    let updated = tx.execute(
        "UPDATE users SET dob = ?1, first_name = ?2, last_name = ?3 WHERE user_id = ?4",
        params![user.dob.to_string(), user.first_name, user.last_name, user_id],
    )?;
    if updated == 0 {
        return Err(StorageError::NotFound {
            entity: "user",
            id: user_id,
        });
    }

    let current_roles = assigned_role_ids(&tx, user_id)?;
    let desired_roles = role_id_set(&user.roles)?;
    for role_id in desired_roles.difference(&current_roles) {
        insert_role_assignment(&tx, user_id, *role_id)?;
    }
    for role_id in current_roles.difference(&desired_roles) {
        tx.execute(
            "DELETE FROM user_role_assignments WHERE user_id = ?1 AND role_id = ?2",
            params![user_id, role_id],
        )?;
    }

    let current_patients = patient_ids_for_doctor(&tx, user_id)?;
    let desired_patients = user_id_set(&user.patients)?;
    for patient_id in desired_patients.difference(&current_patients) {
        insert_relationship(&tx, user_id, *patient_id)?;
    }
    for patient_id in current_patients.difference(&desired_patients) {
        tx.execute(
            "DELETE FROM treatment_relationships WHERE doctor_id = ?1 AND patient_id = ?2",
            params![user_id, patient_id],
        )?;
    }

    tx.commit()?;
    debug!("Updated user {user_id}");

    require_user(conn, user_id)
}

/// Delete a user. Role assignments and relationship rows in both directions
/// are removed by cascade.
pub fn delete_user(conn: &Connection, user_id: i64) -> Result<bool, StorageError> {
    let deleted = conn.execute("DELETE FROM users WHERE user_id = ?1", params![user_id])?;
    if deleted > 0 {
        debug!("Deleted user {user_id}");
    }
    Ok(deleted > 0)
}

pub(crate) fn user_exists(conn: &Connection, user_id: i64) -> Result<bool, StorageError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn require_user(conn: &Connection, user_id: i64) -> Result<User, StorageError> {
    get_user(conn, user_id)?.ok_or(StorageError::NotFound {
        entity: "user",
        id: user_id,
    })
}

/// Collect persisted ids out of a role list. A role that was never created
/// has no id to reference and is rejected.
fn role_id_set(roles: &[UserRole]) -> Result<HashSet<i64>, StorageError> {
    roles
        .iter()
        .map(|role| {
            role.role_id.ok_or_else(|| {
                StorageError::Validation(
                    "roles must be created before they can be assigned".into(),
                )
            })
        })
        .collect()
}

fn user_id_set(users: &[User]) -> Result<HashSet<i64>, StorageError> {
    users
        .iter()
        .map(|user| {
            user.user_id.ok_or_else(|| {
                StorageError::Validation(
                    "related users must be created before they can be linked".into(),
                )
            })
        })
        .collect()
}

fn insert_role_assignment(
    conn: &Connection,
    user_id: i64,
    role_id: i64,
) -> Result<(), StorageError> {
    if !role_exists(conn, role_id)? {
        return Err(StorageError::DanglingReference {
            entity: "user_role",
            id: role_id,
        });
    }
    conn.execute(
        "INSERT OR IGNORE INTO user_role_assignments (user_id, role_id) VALUES (?1, ?2)",
        params![user_id, role_id],
    )?;
    Ok(())
}

fn insert_relationship(
    conn: &Connection,
    doctor_id: i64,
    patient_id: i64,
) -> Result<(), StorageError> {
    if !user_exists(conn, doctor_id)? {
        return Err(StorageError::DanglingReference {
            entity: "user",
            id: doctor_id,
        });
    }
    if !user_exists(conn, patient_id)? {
        return Err(StorageError::DanglingReference {
            entity: "user",
            id: patient_id,
        });
    }
    conn.execute(
        "INSERT OR IGNORE INTO treatment_relationships (doctor_id, patient_id) VALUES (?1, ?2)",
        params![doctor_id, patient_id],
    )?;
    Ok(())
}

/// Core user row without roles or relationships.
fn get_user_core(conn: &Connection, user_id: i64) -> Result<Option<User>, StorageError> {
    let row = conn
        .query_row(
            "SELECT user_id, dob, first_name, last_name FROM users WHERE user_id = ?1",
            params![user_id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;

    match row {
        Some((id, dob, first_name, last_name)) => Ok(Some(User {
            user_id: Some(id),
            dob: parse_date("dob", &dob)?,
            first_name,
            last_name,
            roles: Vec::new(),
            medical_staff: Vec::new(),
            patients: Vec::new(),
        })),
        None => Ok(None),
    }
}

fn roles_for_user(conn: &Connection, user_id: i64) -> Result<Vec<UserRole>, StorageError> {
    let mut stmt = conn.prepare(
        "SELECT r.role_id, r.role_name FROM user_roles r
         JOIN user_role_assignments a ON a.role_id = r.role_id
         WHERE a.user_id = ?1 ORDER BY r.role_id",
    )?;
    let rows = stmt.query_map(params![user_id], |row| {
        Ok(UserRole {
            role_id: Some(row.get(0)?),
            role_name: row.get(1)?,
        })
    })?;
    rows.map(|r| r.map_err(StorageError::from)).collect()
}

enum Side {
    MedicalStaff,
    Patients,
}

/// Users on the other end of this user's relationship edges. Nested records
/// are hydrated one level deep: roles resolved, relationship lists empty.
fn related_users(conn: &Connection, user_id: i64, side: Side) -> Result<Vec<User>, StorageError> {
    let sql = match side {
        Side::MedicalStaff => {
            "SELECT u.user_id, u.dob, u.first_name, u.last_name FROM users u
             JOIN treatment_relationships t ON t.doctor_id = u.user_id
             WHERE t.patient_id = ?1 ORDER BY u.user_id"
        }
        Side::Patients => {
            "SELECT u.user_id, u.dob, u.first_name, u.last_name FROM users u
             JOIN treatment_relationships t ON t.patient_id = u.user_id
             WHERE t.doctor_id = ?1 ORDER BY u.user_id"
        }
    };

    let mut stmt = conn.prepare(sql)?;
    let rows: Vec<(i64, String, String, String)> = stmt
        .query_map(params![user_id], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })?
        .collect::<Result<_, _>>()?;
    drop(stmt);

    let mut users = Vec::with_capacity(rows.len());
    for (id, dob, first_name, last_name) in rows {
        users.push(User {
            user_id: Some(id),
            dob: parse_date("dob", &dob)?,
            first_name,
            last_name,
            roles: roles_for_user(conn, id)?,
            medical_staff: Vec::new(),
            patients: Vec::new(),
        });
    }
    Ok(users)
}

fn assigned_role_ids(conn: &Connection, user_id: i64) -> Result<HashSet<i64>, StorageError> {
    let mut stmt =
        conn.prepare("SELECT role_id FROM user_role_assignments WHERE user_id = ?1")?;
    let rows = stmt.query_map(params![user_id], |row| row.get::<_, i64>(0))?;
    rows.map(|r| r.map_err(StorageError::from)).collect()
}

fn patient_ids_for_doctor(conn: &Connection, user_id: i64) -> Result<HashSet<i64>, StorageError> {
    let mut stmt =
        conn.prepare("SELECT patient_id FROM treatment_relationships WHERE doctor_id = ?1")?;
    let rows = stmt.query_map(params![user_id], |row| row.get::<_, i64>(0))?;
    rows.map(|r| r.map_err(StorageError::from)).collect()
}
