//! Telldus Live cloud transport (OAuth 1.0a).

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::oauth::{OAuthSigner, parse_token_response};
use crate::transport::{
    AccessToken, Authorizer, Params, Transport, build_url, handle_response, http_client, join_url,
};

/// Base URL of the Telldus Live JSON API.
pub const LIVE_API_URL: &str = "https://api.telldus.com/json/";
/// Base URL of the Telldus Live OAuth endpoints.
pub const LIVE_OAUTH_URL: &str = "https://api.telldus.com/oauth/";

/// Signed requests against Telldus Live.
#[derive(Debug, Clone)]
pub struct LiveTransport {
    client: Client,
    base_url: String,
    signer: OAuthSigner,
    application: Option<String>,
}

impl LiveTransport {
    pub fn new(
        public_key: &str,
        private_key: &str,
        token: &str,
        token_secret: &str,
        application: Option<String>,
    ) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: LIVE_API_URL.to_string(),
            signer: OAuthSigner::new(public_key, private_key).with_token(token, token_secret),
            application,
        })
    }

    /// Point the transport at another API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Transport for LiveTransport {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, path: &str, params: &Params<'_>) -> Result<Value> {
        let endpoint = join_url(&self.base_url, path);
        let url = build_url(&self.base_url, path, params);
        debug!("Request {} {:?}", endpoint, params);

        let mut request = self
            .client
            .get(&url)
            .header(
                reqwest::header::AUTHORIZATION,
                self.signer.authorization_header("GET", &endpoint, params),
            );
        if let Some(app) = &self.application {
            request = request.header("X-Application", app);
        }

        let body = handle_response(request.send().await?).await?;
        debug!("Response {}", body);
        Ok(body)
    }
}

/// Three-legged OAuth flow against Telldus Live.
#[derive(Debug)]
pub struct LiveAuthorizer {
    client: Client,
    oauth_url: String,
    public_key: String,
    private_key: String,
    request_token: Option<(String, String)>,
}

impl LiveAuthorizer {
    pub fn new(public_key: impl Into<String>, private_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            oauth_url: LIVE_OAUTH_URL.to_string(),
            public_key: public_key.into(),
            private_key: private_key.into(),
            request_token: None,
        })
    }

    pub fn with_oauth_url(mut self, oauth_url: impl Into<String>) -> Self {
        self.oauth_url = oauth_url.into();
        self
    }

    async fn fetch_token(&self, endpoint: &str, signer: &OAuthSigner) -> Result<(String, String)> {
        let url = join_url(&self.oauth_url, endpoint);
        let response = self
            .client
            .get(&url)
            .header(
                reqwest::header::AUTHORIZATION,
                signer.authorization_header("GET", &url, &[]),
            )
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::Api {
                status: Some(status.as_u16()),
                message: body,
            });
        }
        parse_token_response(&body)
            .ok_or_else(|| Error::InvalidResponse(format!("no token in response from {}", url)))
    }
}

#[async_trait]
impl Authorizer for LiveAuthorizer {
    async fn authorize_url(&mut self) -> Result<String> {
        debug!("Fetching request token");
        let signer = OAuthSigner::new(&self.public_key, &self.private_key);
        let (token, secret) = self.fetch_token("requestToken", &signer).await?;
        debug!("Got request token");

        let url = format!(
            "{}?oauth_token={}",
            join_url(&self.oauth_url, "authorize"),
            urlencoding::encode(&token)
        );
        self.request_token = Some((token, secret));
        Ok(url)
    }

    async fn authorize(&mut self) -> Result<AccessToken> {
        let (token, secret) = self
            .request_token
            .clone()
            .ok_or_else(|| Error::Authorization("no request token; fetch the URL first".into()))?;

        debug!("Fetching access token");
        let signer = OAuthSigner::new(&self.public_key, &self.private_key).with_token(token, secret);
        let (token, token_secret) = self.fetch_token("accessToken", &signer).await?;
        debug!("Got access token");

        Ok(AccessToken {
            token,
            token_secret: Some(token_secret),
        })
    }
}
