//! Authenticated request plumbing shared by every endpoint wrapper.

use gloo_net::http::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use dandori_types::{ClientError, Result};

const DEFAULT_API_BASE: &str = "http://localhost:5000";
const TOKEN_STORAGE_KEY: &str = "dandori-token";

/// REST + streaming client for the Dandori backend.
/// Cheap to clone; holds only the base URL.
#[derive(Clone)]
pub struct DandoriApi {
    base_url: String,
}

impl DandoriApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }
}

impl Default for DandoriApi {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE)
    }
}

// ─── Token storage ───────────────────────────────────────────

/// Session token persisted in localStorage under the app's key
pub fn stored_token() -> Option<String> {
    let storage = web_sys::window()?.local_storage().ok()??;
    storage.get_item(TOKEN_STORAGE_KEY).ok()?
}

pub fn store_token(token: &str) {
    if let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
        let _ = storage.set_item(TOKEN_STORAGE_KEY, token);
    }
}

pub fn clear_token() {
    if let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
        let _ = storage.remove_item(TOKEN_STORAGE_KEY);
    }
}

// ─── Request helpers ─────────────────────────────────────────

pub(crate) fn net_err(e: gloo_net::Error) -> ClientError {
    ClientError::Network(e.to_string())
}

/// Attach the bearer token when one is stored
pub(crate) fn with_auth(builder: RequestBuilder) -> RequestBuilder {
    match stored_token() {
        Some(token) => builder.header("Authorization", &format!("Bearer {}", token)),
        None => builder,
    }
}

/// Send a bodyless authenticated request and parse the JSON response
pub(crate) async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T> {
    let response = with_auth(builder).send().await.map_err(net_err)?;
    parse_response(response).await
}

/// Send an authenticated request with a JSON body and parse the response
pub(crate) async fn send_json_body<B: Serialize, T: DeserializeOwned>(
    builder: RequestBuilder,
    body: &B,
) -> Result<T> {
    let response = with_auth(builder)
        .header("Content-Type", "application/json")
        .json(body)
        .map_err(net_err)?
        .send()
        .await
        .map_err(net_err)?;
    parse_response(response).await
}

/// Map the response: 401 invalidates the stored session, any other non-2xx
/// surfaces the server's `error` field when it sends one.
pub(crate) async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T> {
    if response.status() == 401 {
        log::warn!("session rejected by server, clearing stored token");
        clear_token();
        return Err(ClientError::Unauthorized);
    }
    if !response.ok() {
        return Err(api_error(response).await);
    }
    response.json().await.map_err(net_err)
}

pub(crate) async fn api_error(response: Response) -> ClientError {
    let status = response.status();
    let message = match response.json::<Value>().await {
        Ok(body) => body
            .get("error")
            .and_then(|e| e.as_str())
            .map(String::from)
            .unwrap_or_else(|| format!("HTTP {}", status)),
        Err(_) => format!("HTTP {}", status),
    };
    ClientError::Api { status, message }
}
