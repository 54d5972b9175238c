//! Minimal JSON-RPC 2.0 client over HTTP.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use yid_core::error::{Result, YidError};

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

/// JSON-RPC client shared by the wallet and contract adapters.
#[derive(Debug)]
pub struct JsonRpcClient {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    /// Creates a client for `url`; every request is bounded by `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| YidError::transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            url: url.into(),
            timeout,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sends one request and decodes its `result` into `T`.
    ///
    /// A JSON-RPC error object becomes `YidError::Rpc` with the wallet's code,
    /// so callers can react to codes such as 4902 or 4001.
    pub async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };
        tracing::debug!(method, id, url = %self.url, "JSON-RPC request");

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_http_error(method, e))?;

        let status = response.status();
        let decoded: RpcResponse = response
            .json()
            .await
            .map_err(|e| YidError::transport(format!("{} returned HTTP {}: {}", method, status, e)))?;

        decode_response(method, decoded)
    }

    fn map_http_error(&self, method: &str, err: reqwest::Error) -> YidError {
        if err.is_timeout() {
            YidError::Timeout {
                operation: method.to_string(),
                seconds: self.timeout.as_secs(),
            }
        } else {
            YidError::transport(format!("{} failed: {}", method, err))
        }
    }
}

fn decode_response<T: DeserializeOwned>(method: &str, response: RpcResponse) -> Result<T> {
    if let Some(error) = response.error {
        tracing::debug!(method, code = error.code, "JSON-RPC error: {}", error.message);
        return Err(YidError::rpc(error.code, error.message));
    }
    let result = response.result.unwrap_or(Value::Null);
    Ok(serde_json::from_value(result)?)
}

/// Parses a `0x`-prefixed hex quantity such as `0xaa36a7`.
pub fn parse_quantity(raw: &str) -> Result<u64> {
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| YidError::invalid_input(format!("quantity '{}' lacks 0x prefix", raw)))?;
    if digits.is_empty() {
        return Err(YidError::invalid_input("empty quantity"));
    }
    u64::from_str_radix(digits, 16)
        .map_err(|e| YidError::invalid_input(format!("quantity '{}': {}", raw, e)))
}

pub fn format_quantity(value: u64) -> String {
    format!("0x{:x}", value)
}
