//! Configuration for bxlchat.
//!
//! Two layers:
//!
//! - [`load_and_apply`] reads the XDG `config.toml` `[env]` table and a project `.env`, then
//!   applies them to the process environment with priority **existing env > .env > XDG**.
//! - [`Settings`] and [`CloudBuildSettings`] are typed records built once from that environment
//!   at startup and passed explicitly to the code that needs them.

mod cloudbuild;
mod env_file;
mod settings;
mod xdg_toml;

use std::path::Path;
use thiserror::Error;

pub use cloudbuild::{
    CloudBuildSettings, DEFAULT_BASE_URL, DEFAULT_CLIENT_ID, DEFAULT_REDIRECT_URI, DEFAULT_SCOPE,
    DEFAULT_TENANT, ENV_ACCESS_TOKEN, ENV_BASE_URL, UNKNOWN_REQUESTER,
};
pub use settings::{Settings, SettingsError, ENV_SETTINGS_NAME};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("read xdg config: {0}")]
    XdgRead(std::io::Error),
    #[error("parse xdg toml: {0}")]
    XdgParse(#[from] toml::de::Error),
    #[error("read .env: {0}")]
    Dotenv(#[from] dotenv::Error),
}

/// Loads `$XDG_CONFIG_HOME/<app_name>/config.toml` and an optional `.env`, then sets every key
/// that is **not** already present in the process environment.
///
/// * `app_name`: directory name under the config home, e.g. `"bxlchat"`.
/// * `override_dir`: if `Some`, look for `.env` there instead of the current directory.
pub fn load_and_apply(app_name: &str, override_dir: Option<&Path>) -> Result<(), LoadError> {
    let xdg_map = xdg_toml::load_env_map(app_name)?;
    let dotenv_map = env_file::load_env_map(override_dir)?;

    let mut keys: std::collections::BTreeSet<&String> = xdg_map.keys().collect();
    keys.extend(dotenv_map.keys());

    for key in keys {
        if std::env::var_os(key).is_some() {
            continue;
        }
        if let Some(v) = dotenv_map.get(key).or_else(|| xdg_map.get(key)) {
            std::env::set_var(key, v);
        }
    }

    Ok(())
}
