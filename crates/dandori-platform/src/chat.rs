//! Chat endpoint adapter — the `ChatPort` implementation.
//!
//! `stream_chat` POSTs to `/api/chat` with `stream: true` and adapts the
//! response `ReadableStream` into text chunks for the core's decoder;
//! `send_message` is the plain request the fallback path uses.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use gloo_net::http::Request;
use serde_json::{json, Value};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::ReadableStreamDefaultReader;

use dandori_core::ports::{ChatPort, ChatRequest, ChatReply};
use dandori_types::{ClientError, Result};

use crate::http::{self, DandoriApi};

#[async_trait(?Send)]
impl ChatPort for DandoriApi {
    fn stream_chat(&self, req: ChatRequest) -> Pin<Box<dyn Stream<Item = Result<String>>>> {
        let url = self.url("/api/chat");
        let body = request_body(&req, true);

        enum State {
            Opening { url: String, body: Value },
            Reading(ReadableStreamDefaultReader),
        }

        Box::pin(futures::stream::try_unfold(
            State::Opening { url, body },
            |state| async move {
                let reader = match state {
                    State::Opening { url, body } => open_stream(&url, &body).await?,
                    State::Reading(reader) => reader,
                };
                match read_chunk(&reader).await? {
                    Some(chunk) => Ok(Some((chunk, State::Reading(reader)))),
                    None => Ok(None),
                }
            },
        ))
    }

    async fn send_message(&self, req: ChatRequest) -> Result<ChatReply> {
        let body = request_body(&req, false);
        http::send_json_body(Request::post(&self.url("/api/chat")), &body).await
    }
}

fn request_body(req: &ChatRequest, stream: bool) -> Value {
    let mut body = json!({
        "message": req.message,
        "history": req.history,
        "stream": stream,
    });
    if let Some(profile) = &req.profile {
        body["profile"] = profile.clone();
    }
    body
}

/// Open the streamed response and hand back its body reader
async fn open_stream(url: &str, body: &Value) -> Result<ReadableStreamDefaultReader> {
    let response = http::with_auth(Request::post(url))
        .header("Content-Type", "application/json")
        .json(body)
        .map_err(http::net_err)?
        .send()
        .await
        .map_err(http::net_err)?;

    if !response.ok() {
        return Err(http::api_error(response).await);
    }

    let stream = response
        .body()
        .ok_or_else(|| ClientError::Network("response has no body".to_string()))?;
    stream
        .get_reader()
        .dyn_into::<ReadableStreamDefaultReader>()
        .map_err(|_| ClientError::Network("response body is not readable".to_string()))
}

/// One `reader.read()` round trip. `None` when the stream is finished.
async fn read_chunk(reader: &ReadableStreamDefaultReader) -> Result<Option<String>> {
    let result = JsFuture::from(reader.read()).await.map_err(js_err)?;

    let done = js_sys::Reflect::get(&result, &JsValue::from_str("done"))
        .ok()
        .and_then(|v| v.as_bool())
        .unwrap_or(true);
    if done {
        return Ok(None);
    }

    let value = js_sys::Reflect::get(&result, &JsValue::from_str("value")).map_err(js_err)?;
    let bytes = js_sys::Uint8Array::new(&value).to_vec();
    Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
}

fn js_err(e: JsValue) -> ClientError {
    ClientError::Network(format!("{:?}", e))
}
