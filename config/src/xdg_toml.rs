//! Load the `[env]` table from `<config home>/<app>/config.toml`.
//!
//! The config home is `$XDG_CONFIG_HOME` when set, otherwise the platform config directory.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::LoadError;

fn config_home() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::config_dir)
}

fn xdg_config_path(app_name: &str) -> Option<PathBuf> {
    let path = config_home()?.join(app_name).join("config.toml");
    path.is_file().then_some(path)
}

#[derive(serde::Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    env: HashMap<String, String>,
}

/// Returns the `[env]` pairs. Missing file or missing section yields an empty map.
pub fn load_env_map(app_name: &str) -> Result<HashMap<String, String>, LoadError> {
    let Some(path) = xdg_config_path(app_name) else {
        return Ok(HashMap::new());
    };
    let content = std::fs::read_to_string(&path).map_err(LoadError::XdgRead)?;
    let config: ConfigFile = toml::from_str(&content)?;
    Ok(config.env)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_config<R>(app: &str, body: &str, f: impl FnOnce() -> R) -> R {
        let dir = tempfile::tempdir().unwrap();
        let app_dir = dir.path().join(app);
        std::fs::create_dir_all(&app_dir).unwrap();
        std::fs::write(app_dir.join("config.toml"), body).unwrap();
        temp_env::with_var("XDG_CONFIG_HOME", Some(dir.path()), f)
    }

    #[test]
    fn missing_config_returns_empty_map() {
        let dir = tempfile::tempdir().unwrap();
        temp_env::with_var("XDG_CONFIG_HOME", Some(dir.path()), || {
            assert!(load_env_map("bxlchat").unwrap().is_empty());
        });
    }

    #[test]
    fn reads_env_table() {
        let map = with_config(
            "bxlchat",
            "[env]\nCLOUDBUILD_BASE_URL = \"https://cb.test/\"\nRUST_LOG = \"debug\"\n",
            || load_env_map("bxlchat").unwrap(),
        );
        assert_eq!(
            map.get("CLOUDBUILD_BASE_URL").map(String::as_str),
            Some("https://cb.test/")
        );
        assert_eq!(map.get("RUST_LOG").map(String::as_str), Some("debug"));
    }

    #[test]
    fn other_sections_are_ignored() {
        let map = with_config("bxlchat", "[other]\nkey = \"ignored\"\n", || {
            load_env_map("bxlchat").unwrap()
        });
        assert!(map.is_empty());
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let result = with_config("bxlchat", "not valid toml [[[\n", || load_env_map("bxlchat"));
        assert!(matches!(result, Err(LoadError::XdgParse(_))));
    }
}
