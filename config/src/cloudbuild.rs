//! CloudBuild submission settings: requester identity, service address and sign-in parameters.

/// Default CloudBuild service address (submissions go to `ScheduleBuild/submit` under it).
pub const DEFAULT_BASE_URL: &str = "https://cloudbuild.microsoft.com/";
/// Public client application id used for the interactive sign-in.
pub const DEFAULT_CLIENT_ID: &str = "a5a5dbed-8a88-40d9-94f3-f62bad35ad07";
pub const DEFAULT_TENANT: &str = "microsoft.com";
/// Loopback redirect; the sign-in flow appends the port it listens on.
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost";
pub const DEFAULT_SCOPE: &str = "https://cloudbuild.microsoft.com/.default";
pub const UNKNOWN_REQUESTER: &str = "unknown";

/// Overrides [`DEFAULT_BASE_URL`].
pub const ENV_BASE_URL: &str = "CLOUDBUILD_BASE_URL";
/// Pre-acquired bearer token; when set, no interactive sign-in happens.
pub const ENV_ACCESS_TOKEN: &str = "CLOUDBUILD_ACCESS_TOKEN";

#[derive(Clone, PartialEq, Eq)]
pub struct CloudBuildSettings {
    /// Identity recorded as `requester` in build requests.
    pub requester: String,
    pub base_url: String,
    pub client_id: String,
    pub tenant: String,
    pub redirect_uri: String,
    pub scope: String,
    pub access_token: Option<String>,
}

impl std::fmt::Debug for CloudBuildSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudBuildSettings")
            .field("requester", &self.requester)
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("tenant", &self.tenant)
            .field("redirect_uri", &self.redirect_uri)
            .field("scope", &self.scope)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for CloudBuildSettings {
    fn default() -> Self {
        Self {
            requester: UNKNOWN_REQUESTER.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            tenant: DEFAULT_TENANT.to_string(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            access_token: None,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl CloudBuildSettings {
    /// Resolves settings from the environment once at startup.
    ///
    /// Requester: `USERNAME` (Windows), then `USER`, else [`UNKNOWN_REQUESTER`].
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            requester: non_empty_var("USERNAME")
                .or_else(|| non_empty_var("USER"))
                .unwrap_or(defaults.requester),
            base_url: non_empty_var(ENV_BASE_URL).unwrap_or(defaults.base_url),
            access_token: non_empty_var(ENV_ACCESS_TOKEN),
            ..defaults
        }
    }

    pub fn with_requester(mut self, requester: impl Into<String>) -> Self {
        self.requester = requester.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Authority used for the authorize and token endpoints.
    pub fn authority(&self) -> String {
        format!("https://login.microsoftonline.com/{}", self.tenant)
    }
}
