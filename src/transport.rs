//! HTTP transport with bearer injection and refresh-then-retry.
//!
//! Flow Overview: every request carries `Authorization: Bearer <access>` when
//! the session holds a token. A `401` on a request that carried a token and has
//! not been retried triggers a refresh through the single-flight gate, then one
//! replay with the new token. Requests that hit a `401` while a refresh is
//! outstanding wait for it instead of starting their own. A failed refresh
//! clears the session and sends the user to the login view; every failure is
//! still returned to the caller.

use crate::{
    config::ClientConfig,
    error::{Error, Result},
    navigation::{Navigator, View},
    refresh::RefreshGate,
    session::{copy_secret, SessionState},
};
use reqwest::{
    header::{ACCEPT, CONTENT_TYPE},
    Client, Method, Response, StatusCode,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};
use url::Url;

pub const REFRESH_PATH: &str = "/auth/token/refresh/";
/// Maximum number of error body characters surfaced to callers.
const MAX_ERROR_CHARS: usize = 200;

/// Lifecycle of one outgoing request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Attempt {
    Initial,
    /// Replayed once with a refreshed token.
    Retried,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access: Option<String>,
    refresh: Option<String>,
}

pub struct Transport {
    client: Client,
    config: ClientConfig,
    session: Arc<SessionState>,
    navigator: Arc<dyn Navigator>,
    refresh: RefreshGate,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("api_base_url", &self.config.api_base_url())
            .field("refreshing", &self.refresh.is_refreshing())
            .finish_non_exhaustive()
    }
}

impl Transport {
    /// # Errors
    /// Returns [`Error::Config`] if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn new(
        config: ClientConfig,
        session: Arc<SessionState>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .user_agent(config.user_agent())
            .timeout(config.timeout())
            .build()
            .map_err(|err| Error::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            config,
            session,
            navigator,
            refresh: RefreshGate::default(),
        })
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }

    #[must_use]
    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.refresh.is_refreshing()
    }

    /// # Errors
    /// See [`Transport::request`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::GET, path, None::<&Value>).await
    }

    /// # Errors
    /// See [`Transport::request`].
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.request(Method::POST, path, Some(body)).await
    }

    /// Posts without a body.
    /// # Errors
    /// See [`Transport::request`].
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::POST, path, None::<&Value>).await
    }

    /// # Errors
    /// See [`Transport::request`].
    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.request(Method::PATCH, path, Some(body)).await
    }

    /// Sends a request through the refresh interceptor.
    /// # Errors
    /// Returns [`Error::Http`] for non-success statuses, [`Error::AuthorizationExpired`]
    /// when the replayed request is rejected again, [`Error::RefreshFailed`] when the
    /// refresh itself fails, and network, timeout or decoding errors otherwise.
    #[instrument(skip(self, body))]
    pub async fn request<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let url = self.config.endpoint(path)?;
        let payload = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|err| Error::Serialization(format!("Failed to encode request: {err}")))?;

        let mut token = self.session.access_token();
        let mut attempt = Attempt::Initial;

        loop {
            let result = self
                .send_once(method.clone(), &url, payload.as_deref(), token.as_ref())
                .await;

            match result {
                Err(err) if is_unauthorized(&err) && token.is_some() => match attempt {
                    Attempt::Initial => {
                        debug!(%url, "authorization rejected, refreshing access token");
                        token = Some(self.refresh_access_token().await?);
                        attempt = Attempt::Retried;
                    }
                    Attempt::Retried => {
                        warn!(%url, "authorization rejected after refresh");
                        return Err(Error::AuthorizationExpired(error_text(&err)));
                    }
                },
                outcome => return outcome,
            }
        }
    }

    /// Refreshes the access token, or joins the refresh already in flight.
    /// On failure the session is cleared and the login view is shown.
    /// # Errors
    /// Returns [`Error::RefreshFailed`] if there is no refresh token or the backend rejects it.
    pub async fn refresh_access_token(&self) -> Result<SecretString> {
        self.refresh.run(|| self.perform_refresh()).await
    }

    #[instrument(skip(self))]
    async fn perform_refresh(&self) -> Result<SecretString> {
        let Some(refresh_token) = self.session.refresh_token() else {
            warn!("no refresh token available");
            self.end_session();
            return Err(Error::RefreshFailed(
                "No refresh token available".to_string(),
            ));
        };

        let url = self.config.endpoint(REFRESH_PATH)?;
        let payload = json!({ "refresh": refresh_token.expose_secret() }).to_string();

        // bypasses the interceptor so a rejected refresh never recurses
        let result: Result<RefreshResponse> = self
            .send_once(Method::POST, &url, Some(payload.as_bytes()), None)
            .await;

        match result.and_then(|response| self.install_refreshed(&refresh_token, response)) {
            Ok(Some(access)) => {
                debug!("access token refreshed");
                Ok(access)
            }
            // logged out or logged in again while the refresh was in flight
            Ok(None) => {
                warn!("session ended during refresh, discarding new access token");
                Err(Error::RefreshFailed("session ended during refresh".to_string()))
            }
            Err(err) => {
                error!("Failed to refresh access token: {err}");
                if self.holds_refresh_token(&refresh_token) {
                    self.end_session();
                }
                Err(match err {
                    Error::RefreshFailed(_) => err,
                    other => Error::RefreshFailed(other.to_string()),
                })
            }
        }
    }

    fn install_refreshed(
        &self,
        sent: &SecretString,
        response: RefreshResponse,
    ) -> Result<Option<SecretString>> {
        let access = response
            .access
            .filter(|access| !access.is_empty())
            .map(SecretString::from)
            .ok_or_else(|| {
                Error::InvalidResponse("refresh response is missing access".to_string())
            })?;

        // a rotated refresh token replaces the old one, which the backend blacklists
        let rotated = response
            .refresh
            .filter(|refresh| !refresh.is_empty())
            .map(SecretString::from);

        let installed = self
            .session
            .replace_refreshed(sent, copy_secret(&access), rotated)?;
        Ok(installed.then_some(access))
    }

    fn holds_refresh_token(&self, sent: &SecretString) -> bool {
        self.session
            .refresh_token()
            .is_some_and(|current| current.expose_secret() == sent.expose_secret())
    }

    fn end_session(&self) {
        self.session.clear();
        self.navigator.navigate(View::Login);
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &Url,
        payload: Option<&[u8]>,
        token: Option<&SecretString>,
    ) -> Result<T> {
        let mut builder = self
            .client
            .request(method, url.clone())
            .header(ACCEPT, "application/json");

        if let Some(token) = token {
            builder = builder.bearer_auth(token.expose_secret());
        }

        if let Some(payload) = payload {
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .body(payload.to_vec());
        }

        let response = builder.send().await?;

        handle_json_response(response).await
    }
}

fn is_unauthorized(err: &Error) -> bool {
    err.status() == Some(StatusCode::UNAUTHORIZED.as_u16())
}

fn error_text(err: &Error) -> String {
    match err {
        Error::Http {
            detail: Some(detail),
            ..
        } => detail.clone(),
        Error::Http { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

/// Parses JSON responses; an empty success body decodes as `null`.
async fn handle_json_response<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response.bytes().await?;

    if status.is_success() {
        let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &body[..]
        };
        serde_json::from_slice(body)
            .map_err(|err| Error::Parse(format!("Failed to decode response: {err}")))
    } else {
        let text = String::from_utf8_lossy(&body).into_owned();
        Err(Error::Http {
            status: status.as_u16(),
            detail: extract_detail(&text),
            message: sanitize_body(&text),
        })
    }
}

/// Lifts a `detail` string out of a JSON error body.
fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("detail")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|detail| !detail.is_empty())
        .map(ToString::to_string)
}

/// Trims and truncates error bodies for user-facing messages.
fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}
