//! Identity-provider callback handling.
//!
//! After a successful login the identity provider redirects back to the
//! application with the credential pair and an optional destination hint in
//! the query string. This module parses that redirect, persists the pair,
//! and decides where the client should land.

use anyhow::{Context, Result};
use url::Url;

use crate::store::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, TokenStore};

/// Landing page for successful logins without a usable hint.
pub const DEFAULT_DESTINATION: &str = "/dashboard";

/// Recognized post-login destination hints.
const DESTINATIONS: &[(&str, &str)] = &[("dashboard", "/dashboard"), ("account", "/account")];

/// Error code used when the callback carries no explicit error.
const MISSING_TOKENS_ERROR: &str = "auth_failed";

/// Outcome of parsing a callback redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// A complete credential pair arrived.
    LoggedIn {
        access: String,
        refresh: String,
        destination: String,
    },
    /// The provider reported an error, or the token pair was incomplete.
    Failed { destination: String },
}

impl CallbackOutcome {
    /// Applies this outcome to a token store and returns the navigation
    /// target. A login persists both halves of the pair; a failure leaves
    /// the store untouched.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub fn apply(&self, store: &dyn TokenStore) -> Result<&str> {
        match self {
            CallbackOutcome::LoggedIn {
                access,
                refresh,
                destination,
            } => {
                store
                    .set(ACCESS_TOKEN_KEY, access)
                    .context("Failed to persist access token")?;
                store
                    .set(REFRESH_TOKEN_KEY, refresh)
                    .context("Failed to persist refresh token")?;
                Ok(destination)
            }
            CallbackOutcome::Failed {
                destination,
            } => Ok(destination),
        }
    }
}

/// Parses an identity-provider callback URL.
///
/// Expected query parameters: `access_token`, `refresh_token`, an optional
/// `redirect` destination hint and an optional `error` code.
///
/// # Errors
/// Returns an error if the input is not a valid URL.
pub fn parse_callback_url(input: &str) -> Result<CallbackOutcome> {
    let url = Url::parse(input.trim()).context("Callback is not a valid URL")?;

    let query = |name: &str| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.to_string())
            .filter(|v| !v.is_empty())
    };

    if let Some(code) = query("error") {
        return Ok(CallbackOutcome::Failed {
            destination: error_destination(&code),
        });
    }

    match (query(ACCESS_TOKEN_KEY), query(REFRESH_TOKEN_KEY)) {
        (Some(access), Some(refresh)) => Ok(CallbackOutcome::LoggedIn {
            access,
            refresh,
            destination: destination_for_hint(query("redirect").as_deref()),
        }),
        _ => Ok(CallbackOutcome::Failed {
            destination: error_destination(MISSING_TOKENS_ERROR),
        }),
    }
}

/// Maps a destination hint to a landing page.
/// Unknown or missing hints fall back to the default.
fn destination_for_hint(hint: Option<&str>) -> String {
    hint.and_then(|hint| {
        DESTINATIONS
            .iter()
            .find(|(name, _)| *name == hint)
            .map(|(_, dest)| (*dest).to_string())
    })
    .unwrap_or_else(|| DEFAULT_DESTINATION.to_string())
}

/// Root path annotated with an error indicator.
fn error_destination(code: &str) -> String {
    let query: String = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("error", code)
        .finish();
    format!("/?{query}")
}
