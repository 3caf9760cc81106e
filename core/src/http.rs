//! HTTP transport types and the blocking transport used by default.
//!
//! # Design
//! Requests and responses are plain data. `ApiControl` builds an
//! `HttpRequest`, hands it to a `Transport`, and parses the `HttpResponse`
//! that comes back, so everything except the round trip itself is
//! deterministic and testable without a network. `UreqTransport` performs
//! exactly one attempt per request; non-2xx statuses are returned as data and
//! interpreted by the caller, never treated as transport failures.

use std::fmt;
use std::time::Duration;

use crate::error::{KondutoError, Result};

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes one HTTP round trip.
///
/// Implementations must not retry: orders are not idempotent on the server.
/// Only failures to complete the exchange (DNS, connect, timeout, I/O) are
/// errors; any status code is a successful `HttpResponse`.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        (**self).execute(request)
    }
}

/// Blocking transport backed by a `ureq` agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn send(
    builder: ureq::RequestBuilder<ureq::typestate::WithBody>,
    body: Option<&str>,
) -> std::result::Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let url = request.url.as_str();
        let headers = request.headers.as_slice();
        let body = request.body.as_deref();

        let result = match request.method {
            HttpMethod::Get => with_headers(self.agent.get(url), headers).call(),
            HttpMethod::Post => send(with_headers(self.agent.post(url), headers), body),
            HttpMethod::Put => send(with_headers(self.agent.put(url), headers), body),
        };
        let mut response = result.map_err(|e| KondutoError::Transport(Box::new(e)))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| KondutoError::Transport(Box::new(e)))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
