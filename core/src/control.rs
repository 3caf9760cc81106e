//! Request construction, dispatch and response decoding for the Konduto API.
//!
//! # Design
//! Every response is decoded once, here, into an [`ApiResponse`]: either the
//! not-found marker (HTTP 404, body ignored) or a typed [`Envelope`]. A body
//! without the `status` key fails decoding, which turns "missing key" into a
//! single protocol error instead of checks spread across operations. Error
//! envelopes on non-2xx statuses are still returned as data so callers can
//! tell a rejected order from a broken exchange.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::{ApiKey, Config};
use crate::error::{KondutoError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};

const JSON: &str = "application/json";

/// Top-level `status` of a response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Ok,
    Error,
}

/// The JSON body every Konduto endpoint answers with.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Envelope {
    pub status: ResponseStatus,
    #[serde(default)]
    pub order: Option<Map<String, Value>>,
    /// Free-form error description on `error` envelopes.
    #[serde(default)]
    pub message: Option<Value>,
}

/// A decoded response.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// HTTP 404. For reads this means the order does not exist.
    NotFound,
    Reply {
        http_status: u16,
        envelope: Envelope,
    },
}

impl ApiResponse {
    pub fn into_envelope(self) -> Option<Envelope> {
        match self {
            ApiResponse::NotFound => None,
            ApiResponse::Reply { envelope, .. } => Some(envelope),
        }
    }

    pub fn is_ok(&self) -> bool {
        match self {
            ApiResponse::NotFound => false,
            ApiResponse::Reply { envelope, .. } => envelope.status == ResponseStatus::Ok,
        }
    }
}

/// Builds, sends and decodes requests for one configured client.
#[derive(Debug, Clone)]
pub struct ApiControl {
    config: Config,
}

impl ApiControl {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Compose the request for `path` (relative to the endpoint, starting
    /// with `/`), authenticated with the configured key.
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
    ) -> Result<HttpRequest> {
        let mut headers = vec![
            header("authorization", &basic_auth(self.config.api_key())),
            header("accept", JSON),
        ];
        let body = match body {
            Some(value) => {
                headers.push(header("content-type", JSON));
                let json = serde_json::to_string(value)
                    .map_err(|e| KondutoError::Serialization(e.to_string()))?;
                Some(json)
            }
            None => None,
        };
        Ok(HttpRequest {
            method,
            url: format!("{}{path}", self.config.endpoint()),
            headers,
            body,
        })
    }

    /// Perform one round trip and decode the answer. Never retries.
    pub fn send_request<T: Transport>(
        &self,
        transport: &T,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse> {
        let request = self.build_request(method, path, body)?;
        tracing::debug!(%method, url = %request.url, "sending request to Konduto");
        let response = transport.execute(&request)?;
        tracing::debug!(status = response.status, "received response from Konduto");
        decode_response(response)
    }
}

fn header(name: &str, value: &str) -> (String, String) {
    (name.to_string(), value.to_string())
}

fn basic_auth(key: &ApiKey) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:", key.as_str())))
}

/// Interpret an HTTP response as a Konduto reply.
pub fn decode_response(response: HttpResponse) -> Result<ApiResponse> {
    if response.status == 404 {
        return Ok(ApiResponse::NotFound);
    }
    match serde_json::from_str::<Envelope>(&response.body) {
        Ok(envelope) => Ok(ApiResponse::Reply {
            http_status: response.status,
            envelope,
        }),
        Err(e) if response.is_success() => Err(KondutoError::Protocol(format!(
            "response body is not a Konduto envelope: {e}"
        ))),
        Err(_) => Err(KondutoError::Http {
            status: response.status,
            body: response.body,
        }),
    }
}

/// Whether a POST response confirms `order_id`.
///
/// `Ok(false)` for replies the service uses to decline an order it will not
/// (re)process, e.g. one already analyzed. Fails with `Protocol` when an `ok`
/// reply carries no order id, or when the order endpoint itself answered 404.
pub fn check_post_response(response: &ApiResponse, order_id: &str) -> Result<bool> {
    let ApiResponse::Reply { envelope, .. } = response else {
        return Err(KondutoError::Protocol("endpoint not found".to_string()));
    };
    if envelope.status != ResponseStatus::Ok {
        return Ok(false);
    }
    let order = envelope
        .order
        .as_ref()
        .ok_or_else(|| KondutoError::Protocol("ok response without 'order'".to_string()))?;
    match order.get("id") {
        Some(Value::String(id)) => Ok(id == order_id),
        Some(Value::Number(id)) => Ok(id.to_string() == order_id),
        _ => Err(KondutoError::Protocol("response order has no 'id'".to_string())),
    }
}

/// Fail with `OrderNotFound` when the response is the not-found marker.
pub fn ensure_order_found(response: &ApiResponse, order_id: &str) -> Result<()> {
    match response {
        ApiResponse::NotFound => Err(KondutoError::OrderNotFound(order_id.to_string())),
        ApiResponse::Reply { .. } => Ok(()),
    }
}
