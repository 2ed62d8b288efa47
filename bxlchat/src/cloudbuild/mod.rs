//! CloudBuild domain: build-request documents, submission, and bearer tokens.

pub mod auth;
mod request;
mod submit;

pub use auth::{
    AccessToken, AuthError, InteractiveBrowserTokenProvider, StaticTokenProvider, TokenProvider,
};
pub use request::{
    create_build_request, create_build_request_at, default_description, normalize_engine_or_drop,
    BuildEngineOptions, BuildRequest, BuildRequestArgs, BuildRequestError, ToolPaths,
    DEFAULT_DROP_ROOT, DESCRIPTION_TIMESTAMP_FORMAT, DROP_BASE_URL,
};
pub use submit::{BuildSubmitter, SubmitError, SubmitOutcome, SUBMIT_PATH};
