//! Bearer-credential acquisition
//!
//! The service accepts three roads to the same bearer token: an
//! operator-provided token, an emailed bootstrap token exchanged for an
//! access token, and OAuth-style client credentials (with optional
//! self-registration for first-run setups). Each road is an
//! [`AuthStrategy`]; the orchestrator only ever sees the resulting
//! [`BearerToken`].

use std::fmt;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use openibuy_types::first_string;

use crate::error::{ClientError, Result};

/// Prefix carried by emailed bootstrap tokens.
pub const BOOTSTRAP_TOKEN_PREFIX: &str = "mbt_";

/// An acquired bearer credential.
///
/// Debug output is redacted; tokens must not end up in logs.
#[derive(Clone)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ClientError::Auth("empty bearer token".to_string()));
        }
        Ok(Self(token.trim().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BearerToken(len={})", self.0.len())
    }
}

/// Whether a pasted value looks like an emailed bootstrap token.
pub fn is_bootstrap_token(raw: &str) -> bool {
    raw.trim().starts_with(BOOTSTRAP_TOKEN_PREFIX)
}

/// A way of producing a bearer credential.
#[async_trait]
pub trait AuthStrategy: Send + Sync {
    /// Strategy name for log lines.
    fn name(&self) -> &'static str;

    /// Acquire the bearer token.
    async fn acquire(&self, http: &reqwest::Client) -> Result<BearerToken>;
}

async fn post_json(
    http: &reqwest::Client,
    url: &str,
    body: &Value,
    bearer: Option<&str>,
) -> Result<Value> {
    let mut req = http.post(url).json(body);
    if let Some(token) = bearer {
        req = req.bearer_auth(token);
    }
    let resp = req.send().await?;
    let status = resp.status();
    let text = resp.text().await?;
    if !status.is_success() {
        return Err(ClientError::HttpStatus {
            status: status.as_u16(),
            body: text,
        });
    }
    if text.is_empty() {
        return Ok(json!({}));
    }
    Ok(serde_json::from_str(&text)?)
}

fn access_token_from(url: &str, resp: &Value) -> Result<BearerToken> {
    match first_string(resp, &["access_token"]) {
        Some(token) => BearerToken::new(token),
        None => Err(ClientError::Auth(format!(
            "{url} returned no access_token"
        ))),
    }
}

// ============================================================================
// Provided token
// ============================================================================

/// Use an operator-supplied token as-is.
pub struct ProvidedToken {
    token: String,
}

impl ProvidedToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl AuthStrategy for ProvidedToken {
    fn name(&self) -> &'static str {
        "provided"
    }

    async fn acquire(&self, _http: &reqwest::Client) -> Result<BearerToken> {
        BearerToken::new(self.token.clone())
    }
}

// ============================================================================
// Bootstrap exchange
// ============================================================================

/// Exchange an emailed `mbt_...` bootstrap token for an access token.
pub struct BootstrapExchange {
    pub exchange_url: String,
    pub bootstrap_token: String,
    pub access_ttl_sec: Option<u64>,
}

#[async_trait]
impl AuthStrategy for BootstrapExchange {
    fn name(&self) -> &'static str {
        "bootstrap_exchange"
    }

    async fn acquire(&self, http: &reqwest::Client) -> Result<BearerToken> {
        if !is_bootstrap_token(&self.bootstrap_token) {
            return Err(ClientError::Auth(format!(
                "bootstrap token must start with {BOOTSTRAP_TOKEN_PREFIX}"
            )));
        }
        let mut body = json!({ "bootstrap_token": self.bootstrap_token.trim() });
        if let Some(ttl) = self.access_ttl_sec.filter(|ttl| *ttl > 0) {
            body["ttl_sec"] = json!(ttl);
        }
        let resp = post_json(http, &self.exchange_url, &body, None).await?;
        let token = access_token_from(&self.exchange_url, &resp)?;
        info!("access token issued by bootstrap exchange");
        Ok(token)
    }
}

/// Ask the service to email a bootstrap token to the given address.
///
/// The operator then pastes the token back; this call only starts the
/// exchange, it never returns a credential.
pub async fn request_bootstrap_email(
    http: &reqwest::Client,
    request_url: &str,
    email: &str,
) -> Result<Value> {
    post_json(http, request_url, &json!({ "email": email.to_lowercase() }), None).await
}

// ============================================================================
// Client credentials
// ============================================================================

/// OAuth-style `client_credentials` token issue.
pub struct ClientCredentials {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// Subject the token should be issued for.
    pub user_id: Option<u64>,
    pub ttl_sec: Option<u64>,
    pub refresh_ttl_sec: Option<u64>,
}

#[async_trait]
impl AuthStrategy for ClientCredentials {
    fn name(&self) -> &'static str {
        "client_credentials"
    }

    async fn acquire(&self, http: &reqwest::Client) -> Result<BearerToken> {
        let mut body = json!({
            "grant_type": "client_credentials",
            "client_id": self.client_id,
            "client_secret": self.client_secret,
        });
        if let Some(sub) = self.user_id {
            body["sub"] = json!(sub);
        }
        if let Some(ttl) = self.ttl_sec.filter(|ttl| *ttl > 0) {
            body["ttl_sec"] = json!(ttl);
        }
        if let Some(ttl) = self.refresh_ttl_sec.filter(|ttl| *ttl > 0) {
            body["refresh_ttl_sec"] = json!(ttl);
        }
        let resp = post_json(http, &self.token_url, &body, None).await?;
        let token = access_token_from(&self.token_url, &resp)?;
        info!("access token issued by token endpoint");
        Ok(token)
    }
}

/// Client registration request for first-run self-registration.
pub struct RegisterRequest {
    pub client_id: Option<String>,
    pub display_name: Option<String>,
    pub scope: Option<String>,
    /// Pin the registered client to a fixed subject.
    pub fixed_sub: Option<u64>,
    pub ttl_sec: Option<u64>,
    pub refresh_ttl_sec: Option<u64>,
}

/// Result of a self-registration call.
pub struct RegisteredClient {
    pub client_id: String,
    pub client_secret: String,
    /// Some register endpoints issue a token bundle in the same call.
    pub access_token: Option<BearerToken>,
}

/// Register a client against the register endpoint using a logged-in
/// user bearer, asking for an auto-issued token bundle.
pub async fn register_client(
    http: &reqwest::Client,
    register_url: &str,
    user_bearer: &str,
    request: &RegisterRequest,
) -> Result<RegisteredClient> {
    let mut body = json!({ "auto_issue_token": true });
    if let Some(client_id) = &request.client_id {
        body["client_id"] = json!(client_id);
    }
    if let Some(display_name) = &request.display_name {
        body["display_name"] = json!(display_name);
    }
    if let Some(scope) = &request.scope {
        body["scope"] = json!(scope);
    }
    if let Some(sub) = request.fixed_sub {
        body["fixed_sub"] = json!(sub);
    }
    if let Some(ttl) = request.ttl_sec.filter(|ttl| *ttl > 0) {
        body["ttl_sec"] = json!(ttl);
    }
    if let Some(ttl) = request.refresh_ttl_sec.filter(|ttl| *ttl > 0) {
        body["refresh_ttl_sec"] = json!(ttl);
    }

    let resp = post_json(http, register_url, &body, Some(user_bearer)).await?;

    let client_id = first_string(&resp, &["client_id"])
        .or_else(|| resp.get("client").and_then(|c| first_string(c, &["client_id"])));
    let client_secret = first_string(&resp, &["client_secret"]);
    let (Some(client_id), Some(client_secret)) = (client_id, client_secret) else {
        return Err(ClientError::Auth(format!(
            "{register_url} returned no client credentials"
        )));
    };

    let access_token = resp
        .get("token_bundle")
        .and_then(|bundle| first_string(bundle, &["access_token"]))
        .or_else(|| first_string(&resp, &["access_token"]))
        .and_then(|token| BearerToken::new(token).ok());

    info!(%client_id, "client registered");
    Ok(RegisteredClient {
        client_id,
        client_secret,
        access_token,
    })
}
