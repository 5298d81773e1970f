//! JSON-RPC 2.0 client over HTTP
//!
//! The remote service mounts an MCP-style tools API on a single HTTP
//! endpoint: every call is a POST with a bearer token, requests carry
//! monotonically increasing ids, notifications carry none and expect no
//! result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::auth::BearerToken;
use crate::error::{ClientError, Result};
use crate::invoker::ToolInvoker;
use crate::normalize::normalize_tool_result;

/// Protocol revision sent in the `initialize` handshake.
pub const PROTOCOL_VERSION: &str = "2025-03-26";

const CLIENT_NAME: &str = "openibuy";

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<u64>,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorBody {
    code: i64,
    message: String,
}

/// Low-level JSON-RPC transport.
#[derive(Debug)]
pub struct RpcClient {
    endpoint: String,
    token: BearerToken,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(endpoint: &str, token: BearerToken, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.to_string(),
            token,
            http,
            next_id: AtomicU64::new(1),
        })
    }

    /// Issue a request and return its `result` member.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = JsonRpcRequest {
            jsonrpc: "2.0",
            id: Some(id),
            method,
            params,
        };
        let raw = self.post(&body).await?;
        if !raw.is_object() {
            return Err(ClientError::InvalidEnvelope {
                method: method.to_string(),
            });
        }
        let envelope: JsonRpcResponse = serde_json::from_value(raw)?;
        if let Some(err) = envelope.error {
            return Err(ClientError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        Ok(envelope.result.unwrap_or(Value::Null))
    }

    /// Fire a notification; no id, no result.
    pub async fn notify(&self, method: &str, params: Value) -> Result<()> {
        let body = JsonRpcRequest {
            jsonrpc: "2.0",
            id: None,
            method,
            params,
        };
        self.post(&body).await?;
        Ok(())
    }

    async fn post(&self, body: &JsonRpcRequest<'_>) -> Result<Value> {
        debug!(method = body.method, "rpc request");
        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.token.as_str())
            .json(body)
            .send()
            .await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(ClientError::HttpStatus {
                status: status.as_u16(),
                body: text,
            });
        }
        if text.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// A connected tool-calling session.
///
/// `connect` runs the MCP handshake (`initialize`, the `initialized`
/// notification, `tools/list`) and caches the advertised tool names for
/// the lifetime of the session; a saga run never re-lists.
#[derive(Debug)]
pub struct McpToolClient {
    rpc: RpcClient,
    tools: Vec<String>,
}

impl McpToolClient {
    pub async fn connect(endpoint: &str, token: BearerToken, timeout: Duration) -> Result<Self> {
        let rpc = RpcClient::new(endpoint, token, timeout)?;

        let init = rpc
            .request(
                "initialize",
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {
                        "name": CLIENT_NAME,
                        "version": env!("CARGO_PKG_VERSION"),
                    },
                }),
            )
            .await?;
        debug!(server = ?init.get("serverInfo"), "initialized");
        rpc.notify("notifications/initialized", json!({})).await?;

        let listed = rpc.request("tools/list", json!({})).await?;
        let tools = listed
            .get("tools")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|t| t.get("name").and_then(Value::as_str))
                    .map(|name| name.trim().to_string())
                    .filter(|name| !name.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        debug!(?tools, "tools advertised");

        Ok(Self { rpc, tools })
    }

    pub fn endpoint(&self) -> &str {
        &self.rpc.endpoint
    }
}

#[async_trait]
impl ToolInvoker for McpToolClient {
    async fn list_tools(&self) -> Result<Vec<String>> {
        Ok(self.tools.clone())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value> {
        let raw = self
            .rpc
            .request("tools/call", json!({ "name": name, "arguments": arguments }))
            .await?;
        Ok(normalize_tool_result(raw))
    }
}
