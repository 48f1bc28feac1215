//! Embedded storage core for a medical device tracking backend.
//!
//! One SQLite file backs four subsystems: users with role assignments and a
//! directed doctor -> patient relationship graph, named roles, typed device
//! telemetry, and a conversation log keyed by participant sets. The hosting
//! layer (HTTP, task queue) is expected to handle wire formats and map
//! [`StorageError`] values to its own responses; this crate only accepts and
//! returns plain records.
//!
//! ```no_run
//! use medtrack_storage::models::{User, UserRole};
//! use medtrack_storage::Storage;
//!
//! # fn main() -> Result<(), medtrack_storage::StorageError> {
//! let storage = Storage::open("medtrack.db")?;
//! let role = storage.user_roles().create(&UserRole::new("Doctor")?)?;
//! let dob = chrono::NaiveDate::from_ymd_opt(1959, 6, 11).unwrap();
//! let doctor = storage
//!     .users()
//!     .create(&User::new(dob, "Gregory", "House", vec![role])?)?;
//! assert!(doctor.user_id.is_some());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
pub mod models;
pub mod storage;

pub use db::StorageError;
pub use storage::Storage;
