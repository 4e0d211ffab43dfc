//! User-level configuration
//!
//! Same schema as `solidscan.toml`, read from
//! `~/.config/solidscan/config.toml` (platform config dir).

use super::project_config::{load_optional, ProjectConfig};
use std::path::PathBuf;

/// Get the user config file path
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("solidscan").join("config.toml"))
}

/// Load the user config, or defaults when absent or invalid
pub fn load_user_config() -> ProjectConfig {
    user_config_path()
        .and_then(|path| load_optional(&path))
        .unwrap_or_default()
}
