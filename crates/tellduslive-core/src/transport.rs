//! Transport abstraction over the Telldus Live and local TellStick APIs.
//!
//! Both APIs expose the same JSON resources (`devices/list`,
//! `device/turnOn`, ...) and differ only in base URL and authentication.
//! The [`Transport`] trait captures that common surface so the session can
//! be driven by either, or by a [`MockTransport`](crate::mock::MockTransport)
//! in tests.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Error, Result};

/// Timeout applied to every HTTP request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Query parameters of a request.
pub type Params<'a> = [(&'a str, String)];

/// A JSON API the session can talk to.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Base URL requests are resolved against.
    fn base_url(&self) -> &str;

    /// Renew credentials if they are about to expire.
    ///
    /// The default implementation does nothing.
    async fn maybe_refresh_token(&self) -> Result<()> {
        Ok(())
    }

    /// `GET <base_url><path>?<params>` and return the JSON body.
    ///
    /// A body carrying an `error` key is returned as [`Error::Api`].
    async fn get(&self, path: &str, params: &Params<'_>) -> Result<Value>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn base_url(&self) -> &str {
        (**self).base_url()
    }

    async fn maybe_refresh_token(&self) -> Result<()> {
        (**self).maybe_refresh_token().await
    }

    async fn get(&self, path: &str, params: &Params<'_>) -> Result<Value> {
        (**self).get(path, params).await
    }
}

/// Obtains access credentials for a transport interactively.
#[async_trait]
pub trait Authorizer: Send {
    /// Start authorization and return the URL the user must visit.
    async fn authorize_url(&mut self) -> Result<String>;

    /// Finish authorization after the user approved access.
    async fn authorize(&mut self) -> Result<AccessToken>;
}

/// Credentials produced by an [`Authorizer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    /// Only issued by Telldus Live.
    pub token_secret: Option<String>,
}

/// Build a reqwest client with the request timeout applied.
pub(crate) fn http_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?)
}

/// `base` + `path`, with `params` as a percent-encoded query string.
pub(crate) fn build_url(base: &str, path: &str, params: &Params<'_>) -> String {
    let mut url = join_url(base, path);
    if !params.is_empty() {
        let query: Vec<String> = params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect();
        url.push('?');
        url.push_str(&query.join("&"));
    }
    url
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Turn an HTTP response into a JSON body, mapping HTTP and API errors.
pub(crate) async fn handle_response(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    if !status.is_success() {
        let message = response
            .json::<Value>()
            .await
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
            .unwrap_or_else(|| status.to_string());
        return Err(Error::Api {
            status: Some(status.as_u16()),
            message,
        });
    }

    let body: Value = response
        .json()
        .await
        .map_err(|e| Error::InvalidResponse(e.to_string()))?;
    check_body(body)
}

/// Reject bodies that carry an `error` key.
pub(crate) fn check_body(body: Value) -> Result<Value> {
    match body.get("error") {
        Some(Value::String(message)) => Err(Error::api(message.clone())),
        Some(other) => Err(Error::api(other.to_string())),
        None => Ok(body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_url_encodes_params() {
        let url = build_url(
            "https://api.telldus.com/json/",
            "devices/list",
            &[("supportedMethods", "915".into()), ("name", "a b&c".into())],
        );
        assert_eq!(
            url,
            "https://api.telldus.com/json/devices/list?supportedMethods=915&name=a%20b%26c"
        );
    }

    #[test]
    fn test_build_url_without_params() {
        assert_eq!(
            build_url("http://10.0.0.5/api", "/device/turnOn", &[]),
            "http://10.0.0.5/api/device/turnOn"
        );
    }

    #[test]
    fn test_check_body_error_key() {
        let err = check_body(json!({"error": "The method is not permitted"})).unwrap_err();
        assert!(matches!(err, Error::Api { status: None, .. }));
        assert!(err.to_string().contains("not permitted"));

        assert!(check_body(json!({"device": []})).is_ok());
    }
}
