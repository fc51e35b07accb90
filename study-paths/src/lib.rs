//! XDG Base Directory paths for study-buddy.
//!
//! Config lives under `$XDG_CONFIG_HOME/study-buddy`, generated content and
//! curricula under `$XDG_DATA_HOME/study-buddy`. The same layout is used on
//! every platform.

use std::path::PathBuf;

/// Directory name shared by the config and data roots.
pub const APP_DIR: &str = "study-buddy";

/// Get the study-buddy config directory.
///
/// Returns `$XDG_CONFIG_HOME/study-buddy` if set, otherwise
/// `~/.config/study-buddy`.
///
/// # Examples
///
/// ```
/// use study_paths::config_dir;
///
/// let config_file = config_dir().join("config.toml");
/// ```
pub fn config_dir() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", ".config")
}

/// Get the study-buddy data directory.
///
/// Returns `$XDG_DATA_HOME/study-buddy` if set, otherwise
/// `~/.local/share/study-buddy`. Curricula, progress and the content cache
/// are stored here.
pub fn data_dir() -> PathBuf {
    xdg_dir("XDG_DATA_HOME", ".local/share")
}

/// Root of the per-curriculum content cache inside a data directory.
pub fn content_dir(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join("content")
}

fn xdg_dir(env_var: &str, home_relative: &str) -> PathBuf {
    if let Ok(base) = std::env::var(env_var) {
        PathBuf::from(base).join(APP_DIR)
    } else if let Some(home) = dirs::home_dir() {
        home.join(home_relative).join(APP_DIR)
    } else {
        PathBuf::from(home_relative).join(APP_DIR)
    }
}
