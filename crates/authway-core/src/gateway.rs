//! Authenticated request gateway.
//!
//! Wraps outbound HTTP calls: resolves the target against the configured
//! base origin, injects the stored bearer token, and on a 401 renews the
//! access token once and retries the original request once. When renewal is
//! impossible the store is cleared and the injected logout hook fires.

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Method, Response, StatusCode};
use serde::Deserialize;

use crate::config::Config;
use crate::store::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, TokenStore};

/// Path of the token renewal endpoint on the base origin.
const REFRESH_ENDPOINT: &str = "/api/auth/token/refresh/";

/// Navigation target handed to the logout hook.
pub const LOGOUT_TARGET: &str = "/";

/// Capability invoked when the session cannot be recovered.
///
/// Receives the navigation target. The hook is fire-and-forget relative to
/// the response `execute` returns, and callers should expect no further
/// authenticated traffic to succeed after it fires.
pub type LogoutHook = Box<dyn Fn(&str) + Send + Sync>;

/// Caller-supplied request configuration.
///
/// Headers are forwarded as-is, except `Authorization`, which the gateway
/// owns whenever an access token is stored.
#[derive(Debug, Default, Clone)]
pub struct RequestOptions {
    pub headers: HeaderMap,
    /// Optional JSON body. Kept as a value so the retry attempt can re-send
    /// an identical request.
    pub json: Option<serde_json::Value>,
}

/// Successful renewal response body.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
    refresh: Option<String>,
}

/// Authenticated request gateway.
pub struct Gateway {
    http: reqwest::Client,
    base_url: String,
    store: Arc<dyn TokenStore>,
    on_logout: LogoutHook,
}

impl Gateway {
    /// Creates a gateway over the given token store.
    ///
    /// The base origin and transport timeout come from config; the gateway
    /// itself imposes no timeout of its own.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &Config, store: Arc<dyn TokenStore>, on_logout: LogoutHook) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            store,
            on_logout,
        })
    }

    /// Performs an authenticated request with a single self-healing retry.
    ///
    /// Returns the transport's response unaltered, except for exactly one
    /// case: a 401 primary response with a successful renewal, where the
    /// retry's response is returned instead. A 401 that cannot be recovered
    /// clears the token store, fires the logout hook and returns the
    /// original response.
    ///
    /// # Errors
    /// Returns an error on transport failure (primary or retry attempt) or
    /// on token store I/O failure. Renewal rejection is not an error.
    pub async fn execute(
        &self,
        method: Method,
        target: &str,
        options: RequestOptions,
    ) -> Result<Response> {
        let url = self.resolve_url(target);

        let access = self.store.get(ACCESS_TOKEN_KEY)?;
        let response = self
            .send(method.clone(), &url, &options, access.as_deref())
            .await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::debug!(%url, "request unauthorized, attempting token renewal");
        match self.renew_access().await? {
            Some(access) => {
                // Re-issue the identical request once with the fresh token.
                // Its response is returned as-is, even another 401.
                self.send(method, &url, &options, Some(&access)).await
            }
            None => {
                self.store
                    .clear()
                    .context("Failed to clear token store after renewal failure")?;
                (self.on_logout)(LOGOUT_TARGET);
                Ok(response)
            }
        }
    }

    /// Resolves a target against the base origin.
    /// Absolute URLs are used verbatim.
    fn resolve_url(&self, target: &str) -> String {
        if url::Url::parse(target).is_ok() {
            target.to_string()
        } else {
            format!("{}{target}", self.base_url)
        }
    }

    /// Sends one attempt. The stored access token, when present, overrides
    /// any caller-supplied `Authorization` header; all other caller headers
    /// win over anything the gateway would set.
    async fn send(
        &self,
        method: Method,
        url: &str,
        options: &RequestOptions,
        access: Option<&str>,
    ) -> Result<Response> {
        let mut headers = options.headers.clone();
        if let Some(token) = access {
            let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
                .context("Stored access token is not a valid header value")?;
            headers.insert(AUTHORIZATION, bearer);
        }

        let mut request = self.http.request(method, url).headers(headers);
        if let Some(body) = &options.json {
            request = request.json(body);
        }

        request
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))
    }

    /// Exchanges the stored refresh token for a new access token.
    ///
    /// Returns `Ok(None)` when renewal is impossible: no refresh token
    /// stored (no network call is made), a non-2xx response, a transport
    /// failure, or a malformed response body. At most one renewal request
    /// is sent per invocation.
    ///
    /// # Errors
    /// Returns an error only for token store I/O failures.
    async fn renew_access(&self) -> Result<Option<String>> {
        let Some(refresh) = self.store.get(REFRESH_TOKEN_KEY)? else {
            tracing::debug!("no refresh token stored, renewal skipped");
            return Ok(None);
        };

        let url = format!("{}{REFRESH_ENDPOINT}", self.base_url);
        let response = match self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({ "refresh": refresh }))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("token renewal request failed: {e}");
                return Ok(None);
            }
        };

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "token renewal rejected");
            return Ok(None);
        }

        let tokens: RefreshResponse = match response.json().await {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::warn!("malformed token renewal response: {e}");
                return Ok(None);
            }
        };
        if tokens.access.is_empty() {
            tracing::warn!("token renewal response carried an empty access token");
            return Ok(None);
        }

        self.store
            .set(ACCESS_TOKEN_KEY, &tokens.access)
            .context("Failed to persist renewed access token")?;
        // The refresh token rotates only when the endpoint sends one back.
        if let Some(refresh) = tokens.refresh.filter(|r| !r.is_empty()) {
            self.store
                .set(REFRESH_TOKEN_KEY, &refresh)
                .context("Failed to persist rotated refresh token")?;
        }

        tracing::debug!("access token renewed");
        Ok(Some(tokens.access))
    }
}
