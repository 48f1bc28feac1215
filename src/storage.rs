//! Storage facade — owns the SQLite connection and exposes the stores as
//! borrowed views with no independent lifecycle.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use rusqlite::Connection;
use tracing::info;

use crate::db::{self, repository, StorageError};
use crate::models::{Datum, Message, User, UserRole};

/// Handle to the backing database.
///
/// Opening against a non-existent path initializes an empty schema; an
/// existing path is opened and reused. All store views borrow the one
/// connection, so the facade assumes a single writer; hosts that need
/// concurrent writers must serialize access themselves.
pub struct Storage {
    conn: Connection,
    path: PathBuf,
}

impl Storage {
    /// Open or create the database at the given path and run migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let conn = db::sqlite::open_database(&path)?;
        info!("Storage opened at {}", path.display());
        Ok(Self { conn, path })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = db::sqlite::open_memory_database()?;
        Ok(Self {
            conn,
            path: PathBuf::from(":memory:"),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn user_roles(&self) -> RoleStore<'_> {
        RoleStore { conn: &self.conn }
    }

    pub fn users(&self) -> UserStore<'_> {
        UserStore { conn: &self.conn }
    }

    pub fn data(&self) -> DataStore<'_> {
        DataStore { conn: &self.conn }
    }

    pub fn messages(&self) -> MessageStore<'_> {
        MessageStore { conn: &self.conn }
    }

    /// Close the connection, flushing any outstanding state.
    pub fn close(self) -> Result<(), StorageError> {
        self.conn.close().map_err(|(_, err)| err.into())
    }
}

/// CRUD over named roles.
pub struct RoleStore<'a> {
    conn: &'a Connection,
}

impl RoleStore<'_> {
    pub fn create(&self, role: &UserRole) -> Result<UserRole, StorageError> {
        repository::create_user_role(self.conn, role)
    }

    pub fn get(&self, role_id: i64) -> Result<Option<UserRole>, StorageError> {
        repository::get_user_role(self.conn, role_id)
    }

    pub fn update(&self, role: &UserRole) -> Result<UserRole, StorageError> {
        repository::update_user_role(self.conn, role)
    }

    pub fn delete(&self, role_id: i64) -> Result<bool, StorageError> {
        repository::delete_user_role(self.conn, role_id)
    }
}

/// CRUD over users, their role assignments, and the care relationship graph.
pub struct UserStore<'a> {
    conn: &'a Connection,
}

impl UserStore<'_> {
    pub fn create(&self, user: &User) -> Result<User, StorageError> {
        repository::create_user(self.conn, user)
    }

    pub fn get(&self, user_id: i64) -> Result<Option<User>, StorageError> {
        repository::get_user(self.conn, user_id)
    }

    pub fn get_many(&self, user_ids: &[i64]) -> Result<Vec<Option<User>>, StorageError> {
        repository::get_users(self.conn, user_ids)
    }

    pub fn update(&self, user: &User) -> Result<User, StorageError> {
        repository::update_user(self.conn, user)
    }

    pub fn delete(&self, user_id: i64) -> Result<bool, StorageError> {
        repository::delete_user(self.conn, user_id)
    }
}

/// Append-oriented storage for device telemetry.
pub struct DataStore<'a> {
    conn: &'a Connection,
}

impl DataStore<'_> {
    pub fn create(&self, datum: &Datum) -> Result<Datum, StorageError> {
        repository::create_datum(self.conn, datum)
    }

    pub fn create_many(&self, data: &[Datum]) -> Result<Vec<Datum>, StorageError> {
        repository::create_data(self.conn, data)
    }

    pub fn get(&self, datum_id: i64) -> Result<Option<Datum>, StorageError> {
        repository::get_datum(self.conn, datum_id)
    }

    pub fn for_user(
        &self,
        user_id: i64,
        since: Option<NaiveDateTime>,
        until: Option<NaiveDateTime>,
    ) -> Result<Vec<Datum>, StorageError> {
        repository::data_for_user(self.conn, user_id, since, until)
    }

    pub fn for_device(
        &self,
        device_id: i64,
        since: Option<NaiveDateTime>,
        until: Option<NaiveDateTime>,
    ) -> Result<Vec<Datum>, StorageError> {
        repository::data_for_device(self.conn, device_id, since, until)
    }
}

/// Conversation log keyed by participant sets.
pub struct MessageStore<'a> {
    conn: &'a Connection,
}

impl MessageStore<'_> {
    pub fn log(&self, recipients: &[i64], message: &Message) -> Result<Message, StorageError> {
        repository::log_message(self.conn, recipients, message)
    }

    pub fn latest(
        &self,
        user_ids: &[i64],
        until: Option<NaiveDateTime>,
        limit: u32,
    ) -> Result<Vec<Message>, StorageError> {
        repository::latest_messages(self.conn, user_ids, until, limit)
    }

    pub fn time_range(
        &self,
        user_ids: &[i64],
        since: Option<NaiveDateTime>,
        until: Option<NaiveDateTime>,
    ) -> Result<Vec<Message>, StorageError> {
        repository::messages_in_range(self.conn, user_ids, since, until)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::DatumValue;

    fn dob() -> NaiveDate {
        NaiveDate::from_ymd_opt(1990, 12, 15).unwrap()
    }

    #[test]
    fn stores_share_one_database() {
        let storage = Storage::open_in_memory().unwrap();

        let role = storage
            .user_roles()
            .create(&UserRole::new("Doctor").unwrap())
            .unwrap();
        let user = storage
            .users()
            .create(&User::new(dob(), "Gregory", "House", vec![role.clone()]).unwrap())
            .unwrap();

        let read = storage.users().get(user.user_id.unwrap()).unwrap().unwrap();
        assert_eq!(read.roles, vec![role]);
    }

    #[test]
    fn reopen_preserves_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("medtrack.db");

        let storage = Storage::open(&path).unwrap();
        let role = storage
            .user_roles()
            .create(&UserRole::new("Admin").unwrap())
            .unwrap();
        let user = storage
            .users()
            .create(&User::new(dob(), "John", "Doe", vec![role.clone()]).unwrap())
            .unwrap();
        storage.close().unwrap();

        let storage = Storage::open(&path).unwrap();
        let read = storage.users().get(user.user_id.unwrap()).unwrap().unwrap();
        assert_eq!(read.first_name, "John");
        assert_eq!(read.roles, vec![role]);
    }

    #[test]
    fn facade_exposes_data_and_messages() {
        let storage = Storage::open_in_memory().unwrap();
        let at = dob().and_hms_opt(9, 30, 0).unwrap();

        let datum = storage
            .data()
            .create(&Datum::new(1, 2, at, at, DatumValue::Temperature { deg_c: 36.6 }))
            .unwrap();
        assert_eq!(storage.data().get(datum.datum_id.unwrap()).unwrap(), Some(datum));

        let message = storage
            .messages()
            .log(&[2], &Message::new(1, at, "hello", vec![]))
            .unwrap();
        let latest = storage.messages().latest(&[1, 2], None, 5).unwrap();
        assert_eq!(latest, vec![message]);
    }

    #[test]
    fn path_reports_location() {
        let storage = Storage::open_in_memory().unwrap();
        assert_eq!(storage.path().to_string_lossy(), ":memory:");
    }

    #[test]
    fn close_succeeds() {
        let storage = Storage::open_in_memory().unwrap();
        assert!(storage.close().is_ok());
    }
}
