//! Interactive sign-in: OAuth 2.0 authorization code + PKCE through the system browser.
//!
//! A one-route axum app on an ephemeral loopback port receives the redirect; the code is then
//! exchanged for a token at the tenant's v2.0 token endpoint. Every call signs in again (no cache).

use std::collections::HashMap;
use std::future::IntoFuture;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use env_config::CloudBuildSettings;
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, CsrfToken, PkceCodeChallenge, RedirectUrl,
    RequestTokenError, Scope, TokenResponse, TokenUrl,
};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::{AccessToken, AuthError, TokenProvider};

/// How long to wait for the browser redirect.
pub const SIGN_IN_TIMEOUT: Duration = Duration::from_secs(300);

/// How long the redirect page gets to reach the browser once the code is in.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Error codes from the identity provider that mean the user has to interact.
const INTERACTION_ERRORS: &[&str] = &["interaction_required", "login_required", "consent_required"];

const SIGNED_IN_PAGE: &str = "<html><body>Sign-in complete. You can close this window and return to the chat.</body></html>";
const FAILED_PAGE: &str = "<html><body>Sign-in failed. Return to the chat for details.</body></html>";

type RedirectOutcome = Result<String, AuthError>;

pub struct InteractiveBrowserTokenProvider {
    client_id: String,
    authority: String,
    redirect_base: String,
    /// Called with the authorization URL after it has been printed.
    launch: fn(&str),
    timeout: Duration,
}

impl InteractiveBrowserTokenProvider {
    pub fn new(settings: &CloudBuildSettings) -> Self {
        Self {
            client_id: settings.client_id.clone(),
            authority: settings.authority(),
            redirect_base: settings.redirect_uri.trim_end_matches('/').to_string(),
            launch: open_in_browser,
            timeout: SIGN_IN_TIMEOUT,
        }
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/oauth2/v2.0/{}", self.authority, name)
    }

    async fn sign_in(&self, scopes: &[&str]) -> Result<AccessToken, AuthError> {
        let listener = TcpListener::bind(("127.0.0.1", 0))
            .await
            .map_err(|e| AuthError::Failed(format!("cannot listen for sign-in redirect: {}", e)))?;
        let port = listener
            .local_addr()
            .map_err(|e| AuthError::Failed(e.to_string()))?
            .port();
        let redirect = format!("{}:{}", self.redirect_base, port);

        let client = BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_auth_uri(AuthUrl::new(self.endpoint("authorize")).map_err(invalid_url)?)
            .set_token_uri(TokenUrl::new(self.endpoint("token")).map_err(invalid_url)?)
            .set_redirect_uri(RedirectUrl::new(redirect).map_err(invalid_url)?);

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let mut request = client
            .authorize_url(CsrfToken::new_random)
            .set_pkce_challenge(pkce_challenge)
            .add_extra_param("prompt", "select_account");
        for scope in scopes {
            request = request.add_scope(Scope::new(scope.to_string()));
        }
        let (auth_url, csrf) = request.url();

        eprintln!("Sign in to CloudBuild in your browser:\n{}", auth_url);
        (self.launch)(auth_url.as_str());

        let code = tokio::time::timeout(
            self.timeout,
            wait_for_redirect(listener, csrf.secret().clone()),
        )
        .await
        .map_err(|_| AuthError::Failed("timed out waiting for sign-in".to_string()))??;
        debug!(port, "received sign-in redirect");

        let http_client = oauth2::reqwest::ClientBuilder::new()
            .redirect(oauth2::reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AuthError::Failed(e.to_string()))?;

        let token = client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(pkce_verifier)
            .request_async(&http_client)
            .await
            .map_err(|e| match e {
                RequestTokenError::ServerResponse(resp) => {
                    classify(&resp.error().to_string(), resp.error_description().map(|s| s.as_str()))
                }
                other => AuthError::Failed(other.to_string()),
            })?;

        Ok(AccessToken::new(token.access_token().secret().clone()))
    }
}

#[async_trait]
impl TokenProvider for InteractiveBrowserTokenProvider {
    async fn access_token(&self, scopes: &[&str]) -> Result<AccessToken, AuthError> {
        self.sign_in(scopes).await.inspect_err(|e| {
            warn!(error = %e, "interactive sign-in failed");
        })
    }
}

fn invalid_url(e: url::ParseError) -> AuthError {
    AuthError::Failed(format!("invalid sign-in endpoint: {}", e))
}

fn classify(code: &str, description: Option<&str>) -> AuthError {
    if INTERACTION_ERRORS.contains(&code) {
        return AuthError::InteractionRequired;
    }
    match description {
        Some(d) if !d.is_empty() => AuthError::Failed(format!("{}: {}", code, d)),
        _ => AuthError::Failed(code.to_string()),
    }
}

/// Shared state of the redirect route: the expected `state` and the one-shot slot for the result.
struct Callback {
    expected_state: String,
    outcome_tx: Mutex<Option<oneshot::Sender<RedirectOutcome>>>,
}

fn callback_router(callback: Arc<Callback>) -> Router {
    Router::new()
        .route("/", get(redirect_handler))
        .with_state(callback)
}

async fn redirect_handler(
    State(callback): State<Arc<Callback>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let Some(outcome) = redirect_outcome(&params, &callback.expected_state) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let page = if outcome.is_ok() { SIGNED_IN_PAGE } else { FAILED_PAGE };
    let slot = callback.outcome_tx.lock().ok().and_then(|mut tx| tx.take());
    if let Some(tx) = slot {
        let _ = tx.send(outcome);
    }
    Html(page).into_response()
}

/// Serves the redirect route until it yields a code or an error, then shuts the server down.
async fn wait_for_redirect(listener: TcpListener, expected_state: String) -> RedirectOutcome {
    let (outcome_tx, outcome_rx) = oneshot::channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let app = callback_router(Arc::new(Callback {
        expected_state,
        outcome_tx: Mutex::new(Some(outcome_tx)),
    }));

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        })
        .into_future();
    let mut server = std::pin::pin!(server);

    let outcome = tokio::select! {
        outcome = outcome_rx => outcome
            .map_err(|_| AuthError::Failed("sign-in listener stopped".to_string()))?,
        served = &mut server => {
            let reason = match served {
                Ok(()) => "sign-in listener stopped".to_string(),
                Err(e) => format!("sign-in listener failed: {}", e),
            };
            return Err(AuthError::Failed(reason));
        }
    };

    let _ = shutdown_tx.send(());
    // Idle browser connections must not keep the sign-in open.
    if tokio::time::timeout(SHUTDOWN_GRACE, server).await.is_err() {
        debug!("sign-in listener did not drain in time");
    }
    outcome
}

/// Maps the redirect's query to a result.
///
/// Returns `None` for requests that are not the redirect (no `code` and no `error`).
fn redirect_outcome(
    params: &HashMap<String, String>,
    expected_state: &str,
) -> Option<RedirectOutcome> {
    if let Some(error) = params.get("error") {
        return Some(Err(classify(
            error,
            params.get("error_description").map(String::as_str),
        )));
    }
    let code = params.get("code")?;
    if params.get("state").map(String::as_str) != Some(expected_state) {
        return Some(Err(AuthError::Failed(
            "sign-in redirect state did not match".to_string(),
        )));
    }
    Some(Ok(code.clone()))
}

fn open_in_browser(url: &str) {
    #[cfg(target_os = "windows")]
    let result = std::process::Command::new("cmd")
        .args(["/C", "start", "", url])
        .spawn();
    #[cfg(target_os = "macos")]
    let result = std::process::Command::new("open").arg(url).spawn();
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    let result = std::process::Command::new("xdg-open").arg(url).spawn();

    if let Err(e) = result {
        warn!(error = %e, "could not launch a browser; open the printed URL manually");
    }
}
