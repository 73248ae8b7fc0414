//! Fetch command handler.

use std::sync::Arc;

use anyhow::{Context, Result};
use authway_core::config::Config;
use authway_core::gateway::{Gateway, RequestOptions};
use authway_core::store::FileTokenStore;
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

pub struct FetchOptions<'a> {
    pub target: &'a str,
    pub method: &'a str,
    pub data: Option<&'a str>,
    pub headers: &'a [String],
}

pub async fn run(config: &Config, options: FetchOptions<'_>) -> Result<()> {
    let method = Method::from_bytes(options.method.to_uppercase().as_bytes())
        .with_context(|| format!("invalid HTTP method '{}'", options.method))?;
    let headers = parse_headers(options.headers)?;
    let json = options
        .data
        .map(|data| {
            serde_json::from_str::<serde_json::Value>(data)
                .context("request body is not valid JSON")
        })
        .transpose()?;

    let store = Arc::new(FileTokenStore::open_default());
    let gateway = Gateway::new(config, store, Box::new(notify_logged_out))?;

    let response = gateway
        .execute(
            method,
            options.target,
            RequestOptions {
                headers,
                json,
            },
        )
        .await?;

    let status = response.status();
    eprintln!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("")
    );

    let body = response.text().await.context("read response body")?;
    if !body.is_empty() {
        println!("{body}");
    }

    Ok(())
}

/// Parses repeated 'Name: value' header arguments.
fn parse_headers(raw_headers: &[String]) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for raw in raw_headers {
        let (name, value) = raw
            .split_once(':')
            .with_context(|| format!("invalid header '{raw}', expected 'Name: value'"))?;
        let name: HeaderName = name
            .trim()
            .parse()
            .with_context(|| format!("invalid header name in '{raw}'"))?;
        let value: HeaderValue = value
            .trim()
            .parse()
            .with_context(|| format!("invalid header value in '{raw}'"))?;
        headers.append(name, value);
    }
    Ok(headers)
}

/// Logout hook for the CLI: the web client navigates away, here we can only
/// tell the user the session is gone.
fn notify_logged_out(target: &str) {
    eprintln!("Session expired and could not be renewed. Log in again (continuing at {target}).");
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: header argument parsing.
    #[test]
    fn test_parse_headers() {
        let headers =
            parse_headers(&["X-Trace: abc".to_string(), "Accept: text/plain".to_string()])
                .unwrap();

        assert_eq!(headers.get("x-trace").unwrap(), "abc");
        assert_eq!(headers.get("accept").unwrap(), "text/plain");
    }

    /// Test: malformed header arguments are rejected.
    #[test]
    fn test_parse_headers_rejects_malformed() {
        assert!(parse_headers(&["no-colon".to_string()]).is_err());
    }
}
