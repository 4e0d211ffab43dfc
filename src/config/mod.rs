//! Configuration module for solidscan
//!
//! Settings are layered, later layers winning:
//! 1. User config (`<config_dir>/solidscan/config.toml`)
//! 2. Project config (`./solidscan.toml`)
//! 3. `SOLIDSCAN_KB` environment variable (knowledge-base path only)
//! 4. Command-line flags (applied by the CLI)

mod project_config;
mod user_config;

pub use project_config::{load_project_config, ProjectConfig, PROJECT_CONFIG_FILE};
pub use user_config::{load_user_config, user_config_path};

use std::path::{Path, PathBuf};

/// Environment variable overriding the knowledge-base path
pub const KB_ENV_VAR: &str = "SOLIDSCAN_KB";

/// Load the layered config for a run started in `dir`
pub fn load_config(dir: &Path) -> ProjectConfig {
    layer(
        load_user_config(),
        load_project_config(dir),
        std::env::var(KB_ENV_VAR).ok(),
    )
}

fn layer(user: ProjectConfig, project: ProjectConfig, env_kb: Option<String>) -> ProjectConfig {
    let mut config = user;
    config.merge(project);
    if let Some(kb) = env_kb.filter(|s| !s.trim().is_empty()) {
        config.knowledge_base = Some(PathBuf::from(kb));
    }
    config
}
