mod config;
pub mod database;
pub mod kv;
pub mod store;

pub use config::{Config, ExerciseConfig, NotificationsConfig, ProgressConfig};
pub use database::SqliteStore;
pub use kv::{KeyValueStore, MemoryStore};
pub use store::ProgressStore;

use std::path::PathBuf;

use crate::error::StorageError;

/// Returns the data directory, creating it if needed.
///
/// `KEGEL_DATA_DIR` overrides the location outright. Otherwise this is
/// `~/.config/kegel[-dev]/`, with the `-dev` suffix when `KEGEL_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("KEGEL_DATA_DIR") {
        Some(custom) => PathBuf::from(custom),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("KEGEL_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("kegel-dev")
            } else {
                base_dir.join("kegel")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
