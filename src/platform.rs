// PasteCrop platform paths
// Resolves per-user config and data directories for the current OS.
//
// Linux:   ~/.config/pastecrop, ~/.local/share/pastecrop (XDG variables honored)
// macOS:   ~/Library/Application Support/PasteCrop
// Windows: %APPDATA%\PasteCrop

use std::path::PathBuf;

#[cfg(any(target_os = "macos", target_os = "windows"))]
const APP_DIR: &str = "PasteCrop";
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const APP_DIR: &str = "pastecrop";

/// File name of the history database inside the data directory.
pub const DATABASE_FILE: &str = "pastecrop.db";

/// Returns the directory holding `settings.json`.
pub fn get_config_dir() -> PathBuf {
    base_or_tmp(dirs::config_dir()).join(APP_DIR)
}

/// Returns the directory holding the history database.
pub fn get_data_dir() -> PathBuf {
    base_or_tmp(dirs::data_dir()).join(APP_DIR)
}

/// Default location of the history database.
pub fn default_database_path() -> PathBuf {
    get_data_dir().join(DATABASE_FILE)
}

// No home directory (some containers): fall back to the temp dir.
fn base_or_tmp(base: Option<PathBuf>) -> PathBuf {
    base.unwrap_or_else(std::env::temp_dir)
}
