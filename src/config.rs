use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Application-level constants
pub const APP_NAME: &str = "MedTrack";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DB_FILENAME: &str = "medtrack.db";

/// Get the application data directory (~/MedTrack/ on all platforms)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join(APP_NAME)
}

/// Default location of the backing database file
pub fn default_db_path() -> PathBuf {
    app_data_dir().join(DB_FILENAME)
}

/// Settings a hosting application passes to the storage layer. Deserializable
/// so hosts can load it from a config file; missing fields take defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with(APP_NAME));
    }

    #[test]
    fn default_db_path_under_app_data() {
        let path = default_db_path();
        assert!(path.starts_with(app_data_dir()));
        assert!(path.ends_with(DB_FILENAME));
    }

    #[test]
    fn config_defaults_when_fields_missing() {
        let config: StorageConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.db_path, default_db_path());

        let config: StorageConfig =
            serde_json::from_str("{\"db_path\": \"/tmp/test.db\"}").unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/test.db"));
    }
}
