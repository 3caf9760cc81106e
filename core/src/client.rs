//! Public entry point: fetch, submit, analyze and review orders.
//!
//! # Design
//! `Konduto` pairs an [`ApiControl`] (configuration, request building,
//! response decoding) with a [`Transport`] that performs the round trip.
//! Every argument and order is validated before a request is built, so a
//! rejected input never reaches the network. Each operation makes at most one
//! request and nothing is retried.

use serde_json::{json, Value};

use crate::config::Config;
use crate::control::{
    check_post_response, ensure_order_found, ApiControl, ApiResponse, ResponseStatus,
};
use crate::error::{InvalidOrder, KondutoError, Result};
use crate::http::{HttpMethod, Transport, UreqTransport};
use crate::order::{Order, Submission};
use crate::types::OrderStatus;
use crate::validation::{validate_field, Entity};

/// Synchronous client for the Konduto order API.
pub struct Konduto<T = UreqTransport> {
    control: ApiControl,
    transport: T,
}

impl Konduto<UreqTransport> {
    /// Client using a blocking `ureq` transport with the configured timeout.
    pub fn new(config: Config) -> Self {
        let transport = UreqTransport::new(config.timeout());
        Self::with_transport(config, transport)
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::new(Config::from_env()?))
    }
}

impl<T: Transport> Konduto<T> {
    pub fn with_transport(config: Config, transport: T) -> Self {
        Self {
            control: ApiControl::new(config),
            transport,
        }
    }

    pub fn config(&self) -> &Config {
        self.control.config()
    }

    /// Replace the API key. On error the current key is kept.
    pub fn set_api_key(&mut self, key: &str) -> Result<()> {
        self.control.config_mut().set_api_key(key)
    }

    /// Switch API version. On error the current version is kept.
    pub fn set_version(&mut self, version: &str) -> Result<()> {
        self.control.config_mut().set_version(version)
    }

    /// Fetch an order by id.
    pub fn get_order(&self, id: &str) -> Result<Order> {
        ensure_valid_id(id)?;

        let response = self.send(HttpMethod::Get, &order_path(id), None)?;
        ensure_order_found(&response, id)?;

        if let ApiResponse::Reply {
            http_status,
            envelope,
        } = &response
        {
            if envelope.status != ResponseStatus::Ok {
                let message = envelope.message.as_ref();
                return Err(KondutoError::Http {
                    status: *http_status,
                    body: message.map(Value::to_string).unwrap_or_default(),
                });
            }
        }
        let order = response
            .into_envelope()
            .and_then(|e| e.order)
            .ok_or_else(|| KondutoError::Protocol("response has no 'order'".to_string()))?;
        Order::from_map(order)
    }

    /// Submit an order and ask for an immediate risk analysis.
    pub fn analyze(&self, order: &Order) -> Result<Submission> {
        self.submit(order, true)
    }

    /// Submit an order for storage only; the service does not score it.
    pub fn send_order(&self, order: &Order) -> Result<Submission> {
        self.submit(order, false)
    }

    /// Post `order`, optionally requesting analysis.
    ///
    /// Succeeds whenever the exchange completes, even if the service declined
    /// the order (`Submission::confirmed` is then false). The analyzed
    /// snapshot is only produced for confirmed, analyzed submissions.
    pub fn submit(&self, order: &Order, analyze: bool) -> Result<Submission> {
        order.validate()?;

        let mut body = order.to_map()?;
        if !analyze {
            body.insert("analyze".to_string(), Value::Bool(false));
        }
        let response = self.send(HttpMethod::Post, "/orders", Some(&Value::Object(body)))?;

        let confirmed = check_post_response(&response, &order.id)?;
        if !confirmed {
            tracing::warn!(order_id = %order.id, "Konduto did not confirm the submitted order");
        }

        let analyzed = match response.into_envelope().and_then(|e| e.order) {
            Some(update) if confirmed && analyze => Some(order.merged_with(&update)?),
            _ => None,
        };
        if let Some(recommendation) = analyzed.as_ref().and_then(|o| o.recommendation) {
            tracing::debug!(order_id = %order.id, ?recommendation, "order analyzed");
        }

        Ok(Submission {
            sent: order.clone(),
            analyzed,
            confirmed,
        })
    }

    /// Report the final review outcome of an order.
    ///
    /// `status` must be one of `approved`, `declined`, `fraud`, `canceled`
    /// or `not_authorized`. Returns whether the service accepted the update.
    pub fn update_order_status(
        &self,
        order_id: &str,
        status: &str,
        comments: Option<&str>,
    ) -> Result<bool> {
        let status = status
            .parse::<OrderStatus>()
            .ok()
            .filter(|s| s.is_updatable())
            .ok_or_else(|| InvalidOrder::field("status"))?;
        ensure_valid_id(order_id)?;

        let body = json!({
            "status": status,
            "comments": comments.unwrap_or_default(),
        });
        let response = self.send(HttpMethod::Put, &order_path(order_id), Some(&body))?;
        ensure_order_found(&response, order_id)?;
        Ok(response.is_ok())
    }

    fn send(&self, method: HttpMethod, path: &str, body: Option<&Value>) -> Result<ApiResponse> {
        self.control
            .send_request(&self.transport, method, path, body)
    }
}

fn ensure_valid_id(id: &str) -> Result<()> {
    if validate_field(Entity::Order, "id", &Value::String(id.to_string())) {
        Ok(())
    } else {
        Err(InvalidOrder::field("id").into())
    }
}

fn order_path(id: &str) -> String {
    format!("/orders/{id}")
}
