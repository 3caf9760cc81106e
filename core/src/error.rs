//! Error types for the Konduto client.
//!
//! # Design
//! Input problems (`InvalidApiKey`, `InvalidVersion`, `InvalidOrder`) are
//! raised locally before any request leaves the process. `OrderNotFound` is
//! only produced after the service answered with its not-found marker.
//! `Protocol` covers responses that arrived but do not match the wire
//! contract; `Transport` keeps the underlying I/O error as its source.

use std::fmt;

use thiserror::Error;

use crate::validation::FieldError;

/// Result alias used throughout the crate.
pub type Result<T, E = KondutoError> = std::result::Result<T, E>;

/// Errors returned by `Konduto` operations and configuration setters.
#[derive(Debug, Error)]
pub enum KondutoError {
    /// The API key is not a 21-character `T…`/`P…` string.
    #[error("invalid API key: expected 21 characters starting with 'T' or 'P'")]
    InvalidApiKey,

    /// The version is not one of `ApiVersion::ALL`.
    #[error("invalid API version: {0}")]
    InvalidVersion(String),

    /// An environment setting other than key or version is malformed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An order or an order argument failed validation.
    #[error("invalid order: {0}")]
    InvalidOrder(InvalidOrder),

    /// The service reported that no order exists with this id.
    #[error("order not found: {0}")]
    OrderNotFound(String),

    /// The response was readable but lacks something the operation requires.
    #[error("unexpected response from Konduto: {0}")]
    Protocol(String),

    /// Non-2xx status whose body is not a Konduto envelope.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request did not complete: DNS, connect, timeout or I/O.
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// An outbound body could not be encoded as JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// Why an order (or an order-related argument) was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidOrder {
    /// A single argument failed validation, e.g. `"id"` or `"status"`.
    Field(String),
    /// The order's own validation produced these errors.
    Errors(Vec<FieldError>),
}

impl InvalidOrder {
    pub fn field(name: &str) -> Self {
        InvalidOrder::Field(name.to_string())
    }
}

impl fmt::Display for InvalidOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidOrder::Field(name) => write!(f, "invalid field '{name}'"),
            InvalidOrder::Errors(errors) => {
                let joined: Vec<String> = errors.iter().map(ToString::to_string).collect();
                write!(f, "{}", joined.join("; "))
            }
        }
    }
}

impl From<InvalidOrder> for KondutoError {
    fn from(err: InvalidOrder) -> Self {
        KondutoError::InvalidOrder(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_rejected_input() {
        let err = KondutoError::InvalidVersion("v2".to_string());
        assert_eq!(err.to_string(), "invalid API version: v2");

        let err = KondutoError::Config("bad timeout".to_string());
        assert_eq!(err.to_string(), "invalid configuration: bad timeout");

        let err = KondutoError::from(InvalidOrder::field("status"));
        assert_eq!(err.to_string(), "invalid order: invalid field 'status'");
    }

    #[test]
    fn invalid_order_joins_field_errors() {
        let reason = InvalidOrder::Errors(vec![
            FieldError::missing("customer.id"),
            FieldError::invalid("payment[0].bin"),
        ]);
        assert_eq!(
            reason.to_string(),
            "customer.id: missing required field; payment[0].bin: invalid value"
        );
    }

    #[test]
    fn transport_keeps_its_source() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err = KondutoError::Transport(Box::new(io));
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "timed out");
        assert_eq!(err.to_string(), "transport error: timed out");
    }
}
