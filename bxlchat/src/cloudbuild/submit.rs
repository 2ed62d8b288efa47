//! Submits a build-request document to CloudBuild.
//!
//! Expected failures (sign-in problems, a rejected request) come back as
//! [`SubmitOutcome`] text for the model to relay. Transport failures and an unreadable success
//! body are [`SubmitError`]s.

use std::sync::Arc;

use env_config::CloudBuildSettings;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, info, trace};
use url::Url;

use crate::cloudbuild::auth::{AuthError, TokenProvider};

/// Submission path relative to the service base URL.
pub const SUBMIT_PATH: &str = "ScheduleBuild/submit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Service response, re-indented.
    Submitted(String),
    InteractionRequired,
    TokenError(String),
    Rejected {
        path: String,
        status: StatusCode,
        body: String,
    },
}

impl SubmitOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, Self::Submitted(_))
    }
}

impl std::fmt::Display for SubmitOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Submitted(body) => f.write_str(body),
            Self::InteractionRequired => write!(
                f,
                "Failed to submit build because interactive authentication is required"
            ),
            Self::TokenError(msg) => write!(
                f,
                "Failed to submit build because of an error acquiring token: {}",
                msg
            ),
            Self::Rejected { path, status, body } => write!(
                f,
                "Failed to submit buildRequest: '{}' ({}): {}.",
                path, status, body
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Build request is required")]
    MissingBuildRequest,
    #[error("invalid CloudBuild base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("request to CloudBuild failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("CloudBuild returned a response that is not JSON: {0}")]
    MalformedResponse(#[source] serde_json::Error),
}

pub struct BuildSubmitter {
    client: reqwest::Client,
    submit_url: Url,
    scope: String,
    token_provider: Arc<dyn TokenProvider>,
}

impl BuildSubmitter {
    pub fn new(
        settings: &CloudBuildSettings,
        token_provider: Arc<dyn TokenProvider>,
    ) -> Result<Self, SubmitError> {
        Self::with_base_url(&settings.base_url, &settings.scope, token_provider)
    }

    /// `base_url` may omit the trailing slash.
    pub fn with_base_url(
        base_url: &str,
        scope: &str,
        token_provider: Arc<dyn TokenProvider>,
    ) -> Result<Self, SubmitError> {
        let invalid = |source| SubmitError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        };
        let base = if base_url.ends_with('/') {
            Url::parse(base_url)
        } else {
            Url::parse(&format!("{}/", base_url))
        }
        .map_err(invalid)?;
        let submit_url = base.join(SUBMIT_PATH).map_err(invalid)?;

        Ok(Self {
            client: reqwest::Client::new(),
            submit_url,
            scope: scope.to_string(),
            token_provider,
        })
    }

    pub fn submit_url(&self) -> &Url {
        &self.submit_url
    }

    /// Signs in, then posts `build_request` as the JSON body.
    pub async fn submit(&self, build_request: &str) -> Result<SubmitOutcome, SubmitError> {
        if build_request.trim().is_empty() {
            return Err(SubmitError::MissingBuildRequest);
        }

        let token = match self.token_provider.access_token(&[&self.scope]).await {
            Ok(token) => token,
            Err(AuthError::InteractionRequired) => return Ok(SubmitOutcome::InteractionRequired),
            Err(AuthError::Failed(msg)) => return Ok(SubmitOutcome::TokenError(msg)),
        };

        debug!(url = %self.submit_url, "posting build request");
        let res = self
            .client
            .post(self.submit_url.clone())
            .bearer_auth(token.secret())
            .header("Content-Type", "application/json; charset=utf-8")
            .body(build_request.to_string())
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            // An unreadable body is reported as empty.
            let body = res.text().await.unwrap_or_default();
            trace!(%status, body = %body, "CloudBuild rejected the request");
            return Ok(SubmitOutcome::Rejected {
                path: SUBMIT_PATH.to_string(),
                status,
                body,
            });
        }

        let body = res.text().await?;
        trace!(%status, body = %body, "CloudBuild response");

        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(SubmitError::MalformedResponse)?;
        info!(%status, "build request submitted");
        let pretty = serde_json::to_string_pretty(&value).map_err(SubmitError::MalformedResponse)?;
        Ok(SubmitOutcome::Submitted(pretty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloudbuild::auth::StaticTokenProvider;

    fn provider() -> Arc<dyn TokenProvider> {
        Arc::new(StaticTokenProvider::new("t"))
    }

    #[test]
    fn outcome_messages() {
        assert_eq!(
            SubmitOutcome::InteractionRequired.to_string(),
            "Failed to submit build because interactive authentication is required"
        );
        assert_eq!(
            SubmitOutcome::TokenError("no network".into()).to_string(),
            "Failed to submit build because of an error acquiring token: no network"
        );
        assert_eq!(
            SubmitOutcome::Rejected {
                path: SUBMIT_PATH.into(),
                status: StatusCode::BAD_REQUEST,
                body: "bad queue".into(),
            }
            .to_string(),
            "Failed to submit buildRequest: 'ScheduleBuild/submit' (400 Bad Request): bad queue."
        );
        assert_eq!(SubmitOutcome::Submitted("{}".into()).to_string(), "{}");
    }

    #[test]
    fn submit_url_joins_with_or_without_trailing_slash() {
        for base in ["https://cb.example.com", "https://cb.example.com/"] {
            let submitter = BuildSubmitter::with_base_url(base, "s", provider()).unwrap();
            assert_eq!(
                submitter.submit_url().as_str(),
                "https://cb.example.com/ScheduleBuild/submit"
            );
        }
        let nested = BuildSubmitter::with_base_url("http://127.0.0.1:9/cb", "s", provider()).unwrap();
        assert_eq!(nested.submit_url().as_str(), "http://127.0.0.1:9/cb/ScheduleBuild/submit");
    }

    #[test]
    fn invalid_base_url_is_an_error() {
        let err = BuildSubmitter::with_base_url("not a url", "s", provider())
            .err()
            .unwrap();
        assert!(matches!(err, SubmitError::InvalidBaseUrl { .. }));
    }

    #[tokio::test]
    async fn blank_request_fails_before_network() {
        let submitter = BuildSubmitter::with_base_url("http://127.0.0.1:9", "s", provider()).unwrap();
        let err = submitter.submit("  ").await.unwrap_err();
        assert!(matches!(err, SubmitError::MissingBuildRequest));
        assert_eq!(err.to_string(), "Build request is required");
    }

    /// Serves one response whose body is cut short of its `Content-Length`.
    async fn truncated_response(status_line: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let _ = stream.read(&mut buf).await;
            let head = format!("{}\r\nContent-Length: 100\r\n\r\npartial", status_line);
            let _ = stream.write_all(head.as_bytes()).await;
            let _ = stream.shutdown().await;
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn unreadable_rejection_body_is_still_rejected() {
        let base = truncated_response("HTTP/1.1 503 Service Unavailable").await;
        let submitter = BuildSubmitter::with_base_url(&base, "s", provider()).unwrap();
        let outcome = submitter.submit("{}").await.unwrap();
        assert_eq!(
            outcome,
            SubmitOutcome::Rejected {
                path: SUBMIT_PATH.into(),
                status: StatusCode::SERVICE_UNAVAILABLE,
                body: String::new(),
            }
        );
    }

    #[tokio::test]
    async fn unreadable_success_body_is_a_transport_error() {
        let base = truncated_response("HTTP/1.1 200 OK").await;
        let submitter = BuildSubmitter::with_base_url(&base, "s", provider()).unwrap();
        let err = submitter.submit("{}").await.unwrap_err();
        assert!(matches!(err, SubmitError::Transport(_)), "{:?}", err);
    }
}
