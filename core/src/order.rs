//! The order submitted for fraud analysis.
//!
//! # Design
//! `Order` is plain data owned by the caller. The client never mutates it:
//! analysis produces a new snapshot (see [`Submission`]) built by overlaying
//! the fields the service returned onto the order that was sent. Fields the
//! service echoes but this crate does not model are kept in `extra`, so an
//! order fetched and re-serialized loses nothing.

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{InvalidOrder, KondutoError, Result};
use crate::types::{Address, Customer, Item, OrderStatus, Payment, Recommendation, Seller};
use crate::validation::{validate_entity, Entity, FieldError};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Order {
    /// Client-chosen identifier, unique per store. The service may echo a
    /// numeric id; it is kept as its decimal text.
    #[serde(deserialize_with = "string_or_integer")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visitor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installments: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchased_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<Customer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payment: Vec<Payment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping: Option<Address>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shopping_cart: Vec<Item>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller: Option<Seller>,

    // Assigned by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<Recommendation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,

    /// Echoed fields without a typed counterpart (device, navigation, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Order {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Check the order and its nested entities against the validation schema.
    pub fn validate(&self) -> Result<(), InvalidOrder> {
        let errors = self.field_errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(InvalidOrder::Errors(errors))
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    fn field_errors(&self) -> Vec<FieldError> {
        let map = match self.to_map() {
            Ok(map) => map,
            Err(_) => return vec![FieldError::invalid("order")],
        };

        let mut errors = validate_entity(Entity::Order, "", &map);
        if let Some(Value::Object(customer)) = map.get("customer") {
            errors.extend(validate_entity(Entity::Customer, "customer", customer));
        }
        for (key, entity) in [
            ("billing", Entity::Address),
            ("shipping", Entity::Address),
            ("seller", Entity::Seller),
        ] {
            if let Some(Value::Object(object)) = map.get(key) {
                errors.extend(validate_entity(entity, key, object));
            }
        }
        for (key, entity) in [
            ("payment", Entity::Payment),
            ("shopping_cart", Entity::Item),
        ] {
            if let Some(Value::Array(list)) = map.get(key) {
                for (i, value) in list.iter().enumerate() {
                    let path = format!("{key}[{i}]");
                    match value {
                        Value::Object(object) => {
                            errors.extend(validate_entity(entity, &path, object))
                        }
                        _ => errors.push(FieldError::invalid(path)),
                    }
                }
            }
        }
        errors
    }

    /// Serialize into the JSON object sent on the wire.
    pub(crate) fn to_map(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(KondutoError::Serialization(format!(
                "order serialized to non-object {other}"
            ))),
            Err(e) => Err(KondutoError::Serialization(e.to_string())),
        }
    }

    /// Decode an order from the `order` object of a response.
    pub(crate) fn from_map(map: Map<String, Value>) -> Result<Self> {
        serde_json::from_value(Value::Object(map))
            .map_err(|e| KondutoError::Protocol(format!("malformed order in response: {e}")))
    }

    /// A copy of this order with every key present in `update` overwritten.
    pub(crate) fn merged_with(&self, update: &Map<String, Value>) -> Result<Self> {
        let mut map = self.to_map()?;
        for (key, value) in update {
            map.insert(key.clone(), value.clone());
        }
        Self::from_map(map)
    }
}

fn string_or_integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) if id.is_u64() => Ok(id.to_string()),
        other => Err(de::Error::custom(format!(
            "order id must be a string or a non-negative integer, got {other}"
        ))),
    }
}

/// Outcome of posting an order.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    /// The order exactly as it was sent.
    pub sent: Order,
    /// The sent order updated with the analysis, when analysis was requested
    /// and the service confirmed the order.
    pub analyzed: Option<Order>,
    /// Whether the response acknowledged this order id with an `ok` status.
    pub confirmed: bool,
}

impl Submission {
    /// The most recent snapshot of the order.
    pub fn order(&self) -> &Order {
        self.analyzed.as_ref().unwrap_or(&self.sent)
    }

    pub fn recommendation(&self) -> Option<Recommendation> {
        self.analyzed.as_ref().and_then(|o| o.recommendation)
    }
}
