//! Platform-specific location of the engine config.
//!
//! - Linux: `~/.config/polysub/engine.toml`
//! - macOS: `~/Library/Application Support/polysub/engine.toml`
//! - Windows: `%APPDATA%\polysub\engine.toml`

use std::path::PathBuf;

/// Application name used for directory paths.
const APP_NAME: &str = "polysub";

/// File name of the engine config inside [`user_config_dir`].
pub const CONFIG_FILE_NAME: &str = "engine.toml";

/// The user-specific configuration directory.
///
/// Falls back to the current directory if the platform config directory
/// cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default path of the engine config file.
pub fn default_config_path() -> PathBuf {
    user_config_dir().join(CONFIG_FILE_NAME)
}
