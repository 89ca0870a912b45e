//! Local TellStick ZNet / Net v2 transport (bearer token).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::transport::{
    AccessToken, Authorizer, Params, Transport, build_url, handle_response, http_client, join_url,
};
use crate::wire::LocalToken;

/// Tokens older than this are renewed before the next request.
pub const TOKEN_REFRESH_AGE: Duration = Duration::from_secs(12 * 60 * 60);

/// Products whose firmware exposes the local REST API.
pub const SUPPORTS_LOCAL_API: [&str; 2] = ["TellstickZnet", "TellstickNetV2"];

/// Whether the product name reported by discovery supports the local API.
pub fn supports_local_api(product: &str) -> bool {
    SUPPORTS_LOCAL_API.iter().any(|p| product.contains(p))
}

/// `http://<host>/api/`.
pub fn local_api_url(host: &str) -> String {
    format!("http://{}/api/", host)
}

#[derive(Debug)]
struct TokenState {
    token: String,
    /// When the token was last issued or refreshed. `None` if that failed.
    refreshed_at: Option<Instant>,
}

/// Requests against the REST API of a TellStick on the local network.
#[derive(Debug)]
pub struct LocalTransport {
    client: Client,
    base_url: String,
    token: RwLock<TokenState>,
}

impl LocalTransport {
    /// Create a transport for `host` and refresh `token` once.
    ///
    /// A failed refresh is logged; the given token is still used.
    pub async fn connect(host: &str, token: &str) -> Result<Self> {
        Self::with_base_url(local_api_url(host), token).await
    }

    /// Like [`connect`](Self::connect) with an explicit API root.
    pub async fn with_base_url(base_url: impl Into<String>, token: &str) -> Result<Self> {
        let transport = Self {
            client: http_client()?,
            base_url: base_url.into(),
            token: RwLock::new(TokenState {
                token: token.to_string(),
                refreshed_at: None,
            }),
        };
        if let Err(e) = transport.refresh_access_token().await {
            error!("Failed to refresh access token: {}", e);
        }
        Ok(transport)
    }

    /// The bearer token currently in use.
    pub async fn access_token(&self) -> String {
        self.token.read().await.token.clone()
    }

    /// Exchange the current token for a fresh one.
    pub async fn refresh_access_token(&self) -> Result<()> {
        let url = join_url(&self.base_url, "refreshToken");
        let bearer = self.access_token().await;
        let response = self.client.get(&url).bearer_auth(&bearer).send().await?;
        let body: LocalToken = serde_json::from_value(handle_response(response).await?)
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;

        let token = body
            .token
            .ok_or_else(|| Error::InvalidResponse("refreshToken returned no token".into()))?;
        debug!("Token refreshed, expires {:?}", body.expires);

        let mut state = self.token.write().await;
        state.token = token;
        state.refreshed_at = Some(Instant::now());
        Ok(())
    }
}

#[async_trait]
impl Transport for LocalTransport {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn maybe_refresh_token(&self) -> Result<()> {
        let due = match self.token.read().await.refreshed_at {
            Some(at) => at.elapsed() > TOKEN_REFRESH_AGE,
            None => false,
        };
        if due {
            debug!("Access token older than {:?}, refreshing", TOKEN_REFRESH_AGE);
            if let Err(e) = self.refresh_access_token().await {
                error!("Failed to refresh access token: {}", e);
            }
        }
        Ok(())
    }

    async fn get(&self, path: &str, params: &Params<'_>) -> Result<Value> {
        let url = build_url(&self.base_url, path, params);
        debug!("Request {}", url);

        let bearer = self.access_token().await;
        let response = self.client.get(&url).bearer_auth(bearer).send().await?;
        let body = handle_response(response).await?;
        debug!("Response {}", body);
        Ok(body)
    }
}

/// Request-token flow of the local API.
#[derive(Debug)]
pub struct LocalAuthorizer {
    client: Client,
    base_url: String,
    application: String,
    request_token: Option<String>,
}

impl LocalAuthorizer {
    pub fn new(host: &str, application: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: local_api_url(host),
            application: application.into(),
            request_token: None,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Authorizer for LocalAuthorizer {
    async fn authorize_url(&mut self) -> Result<String> {
        let url = join_url(&self.base_url, "token");
        let response = self
            .client
            .put(&url)
            .form(&[("app", self.application.as_str())])
            .send()
            .await?;
        let body: LocalToken = serde_json::from_value(handle_response(response).await?)
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;

        self.request_token = body.token;
        body.auth_url
            .ok_or_else(|| Error::InvalidResponse("token request returned no authUrl".into()))
    }

    async fn authorize(&mut self) -> Result<AccessToken> {
        let request_token = self
            .request_token
            .clone()
            .ok_or_else(|| Error::Authorization("no request token; fetch the URL first".into()))?;

        let url = build_url(&self.base_url, "token", &[("token", request_token)]);
        let response = self.client.get(&url).send().await?;
        let body: LocalToken = serde_json::from_value(handle_response(response).await?)
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;

        let token = body
            .token
            .ok_or_else(|| Error::Authorization("access was not granted".into()))?;
        debug!("Token expires {:?}", body.expires);
        Ok(AccessToken {
            token,
            token_secret: None,
        })
    }
}
