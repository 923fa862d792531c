//! Path management for the agent's durable state.

use std::env;
use std::path::PathBuf;

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "AEGIS_DATA_DIR";

/// Returns the directory holding the identity, queue and experience files.
///
/// Uses `AEGIS_DATA_DIR` when set, otherwise the platform data directory:
/// - Linux: `~/.local/share/aegis/<project>`
/// - macOS: `~/Library/Application Support/aegis/<project>`
/// - Windows: `%LOCALAPPDATA%\aegis\<project>`
///
/// The directory is not created here; writers create it on first save.
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = env::var(DATA_DIR_ENV) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }

    let app_name = get_project_directory_name();
    let app_author = "aegis";

    if cfg!(target_os = "linux") {
        let home = env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(app_author)
            .join(&app_name)
    } else if cfg!(target_os = "macos") {
        let home = env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        PathBuf::from(home)
            .join("Library")
            .join("Application Support")
            .join(app_author)
            .join(&app_name)
    } else if cfg!(target_os = "windows") {
        let local_app_data = env::var("LOCALAPPDATA")
            .unwrap_or_else(|_| env::var("APPDATA").unwrap_or_else(|_| "C:\\tmp".to_string()));
        PathBuf::from(local_app_data).join(app_author).join(&app_name)
    } else {
        PathBuf::from("/tmp").join(app_author).join(&app_name)
    }
}

/// Returns the current project directory name, used to keep agents started
/// from different working directories apart.
pub fn get_project_directory_name() -> String {
    env::current_dir()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .unwrap_or_else(|| "default".to_string())
}
