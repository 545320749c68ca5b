// LaterList platform paths
// Per-OS config and data directories, selected with `cfg(target_os)`.
// `LATERLIST_DATA_DIR` overrides the data directory on every platform.

use std::env;
use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

/// Environment variable relocating the data directory (database, backups).
pub const DATA_DIR_ENV: &str = "LATERLIST_DATA_DIR";

/// Directory holding `settings.json`.
///
/// - **Linux**: `$XDG_CONFIG_HOME/laterlist` or `~/.config/laterlist`
/// - **macOS**: `~/Library/Application Support/LaterList`
/// - **Windows**: `%APPDATA%/LaterList`
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_config_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_config_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_config_dir()
    }
}

/// Directory holding the database, unless `LATERLIST_DATA_DIR` is set.
///
/// - **Linux**: `$XDG_DATA_HOME/laterlist` or `~/.local/share/laterlist`
/// - **macOS**: `~/Library/Application Support/LaterList`
/// - **Windows**: `%LOCALAPPDATA%/LaterList`
pub fn get_data_dir() -> PathBuf {
    if let Some(dir) = env::var_os(DATA_DIR_ENV).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    #[cfg(target_os = "linux")]
    {
        linux::get_data_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_data_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_data_dir()
    }
}
