//! Read a project `.env` into a key-value map without touching the process environment.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

fn dotenv_path(override_dir: Option<&Path>) -> Option<PathBuf> {
    let dir = override_dir
        .map(Path::to_path_buf)
        .or_else(|| std::env::current_dir().ok())?;
    let path = dir.join(".env");
    path.is_file().then_some(path)
}

/// Parses `.env` from `override_dir` (or the current directory). A missing file yields an empty map.
pub fn load_env_map(override_dir: Option<&Path>) -> Result<HashMap<String, String>, dotenv::Error> {
    let Some(path) = dotenv_path(override_dir) else {
        return Ok(HashMap::new());
    };
    dotenv::from_path_iter(&path)?.collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let m = load_env_map(Some(dir.path())).unwrap();
        assert!(m.is_empty());
    }

    #[test]
    fn reads_pairs_and_skips_comments() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".env"),
            "# chat provider\nOPENAI_SETTINGS=\"false;gpt-35;https://x.openai.azure.com/;k;\"\nUSERNAME=alice\n",
        )
        .unwrap();
        let m = load_env_map(Some(dir.path())).unwrap();
        assert_eq!(m.len(), 2);
        assert_eq!(
            m.get("OPENAI_SETTINGS").map(String::as_str),
            Some("false;gpt-35;https://x.openai.azure.com/;k;")
        );
        assert_eq!(m.get("USERNAME").map(String::as_str), Some("alice"));
    }
}
