//! Chat-completion provider settings parsed from `OPENAI_SETTINGS`.
//!
//! Format: `UseOpenAI;Model;EndPoint;ApiKey;OrgId` (exactly five `;`-separated fields).

use thiserror::Error;

/// Environment variable holding the provider settings.
pub const ENV_SETTINGS_NAME: &str = "OPENAI_SETTINGS";

const FIELD_COUNT: usize = 5;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Environment variable OPENAI_SETTINGS not found")]
    Missing,
    #[error(
        "The value of environment variable OPENAI_SETTINGS does not contain complete information \
         (expected 5 fields, found {found}).\n\
         Format: 'UseOpenAI;Model;EndPoint;ApiKey;OrgId'\n\
         Examples:\n\
         - 'true;gpt-3.5-turbo;;sk-12345;' - for OpenAI, with 'gpt-3.5-turbo' model and API key 'sk-12345'\n\
         - 'false;gpt-35-turbo-a;https://1es.openai.azure.com/;5e1ec7ed;' - for Azure OpenAI, with \
         'gpt-35-turbo-a' model, 'https://1es.openai.azure.com' endpoint, and API key '5e1ec7ed'"
    )]
    Malformed { found: usize },
}

/// Provider settings: OpenAI (`use_openai`) or Azure OpenAI (`endpoint` + deployment `model`).
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub use_openai: bool,
    pub model: String,
    pub endpoint: String,
    pub api_key: String,
    pub org_id: String,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("use_openai", &self.use_openai)
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("org_id", &self.org_id)
            .finish()
    }
}

impl Settings {
    /// Parses one settings string. The flag is lenient: anything but `true` (any case) is false.
    pub fn parse(value: &str) -> Result<Self, SettingsError> {
        let parts: Vec<&str> = value.split(';').collect();
        if parts.len() != FIELD_COUNT {
            return Err(SettingsError::Malformed { found: parts.len() });
        }

        Ok(Self {
            use_openai: parts[0].trim().eq_ignore_ascii_case("true"),
            model: parts[1].trim().to_string(),
            endpoint: parts[2].trim().to_string(),
            api_key: parts[3].trim().to_string(),
            org_id: parts[4].trim().to_string(),
        })
    }

    /// Reads and parses [`ENV_SETTINGS_NAME`].
    pub fn from_env() -> Result<Self, SettingsError> {
        let raw = std::env::var(ENV_SETTINGS_NAME).map_err(|_| SettingsError::Missing)?;
        Self::parse(&raw)
    }
}
