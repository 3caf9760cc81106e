//! Domain DTOs nested inside a Konduto order.
//!
//! # Design
//! Almost every field is optional: the service accepts partial orders and
//! echoes back whatever it stored. Required-ness and formats are enforced by
//! `validation`, not by the type system, so an order fetched from the service
//! always decodes even when it would not pass outbound validation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The buyer placing the order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vip: Option<bool>,
}

impl Customer {
    /// A customer with the three fields every order requires.
    pub fn new(id: &str, name: &str, email: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    Credit,
    Boleto,
    Debit,
    Transfer,
    Voucher,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Approved,
    Declined,
    Pending,
}

/// A payment attempt attached to the order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    #[serde(rename = "type")]
    pub kind: PaymentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PaymentStatus>,
    /// First six digits of the card number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last4: Option<String>,
    /// `MMYYYY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
}

impl Payment {
    pub fn new(kind: PaymentType) -> Self {
        Self {
            kind,
            status: None,
            bin: None,
            last4: None,
            expiration_date: None,
        }
    }
}

/// Billing or shipping address.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    /// ISO 3166-1 alpha-2.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// A shopping cart line.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Item {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Marketplace seller, for orders placed through a marketplace.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Seller {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// The risk verdict returned after analysis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Approve,
    Review,
    Decline,
    None,
}

/// Order status as tracked by the service.
///
/// Only the statuses in [`OrderStatus::UPDATABLE`] may be sent in a status
/// update; `Pending` and `NotAnalyzed` are assigned by the service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    NotAnalyzed,
    Approved,
    Declined,
    Fraud,
    Canceled,
    NotAuthorized,
}

impl OrderStatus {
    pub const UPDATABLE: [OrderStatus; 5] = [
        OrderStatus::Approved,
        OrderStatus::Declined,
        OrderStatus::Fraud,
        OrderStatus::Canceled,
        OrderStatus::NotAuthorized,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::NotAnalyzed => "not_analyzed",
            OrderStatus::Approved => "approved",
            OrderStatus::Declined => "declined",
            OrderStatus::Fraud => "fraud",
            OrderStatus::Canceled => "canceled",
            OrderStatus::NotAuthorized => "not_authorized",
        }
    }

    pub fn is_updatable(self) -> bool {
        Self::UPDATABLE.contains(&self)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a string that names no known order status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "not_analyzed" => Ok(OrderStatus::NotAnalyzed),
            "approved" => Ok(OrderStatus::Approved),
            "declined" => Ok(OrderStatus::Declined),
            "fraud" => Ok(OrderStatus::Fraud),
            "canceled" => Ok(OrderStatus::Canceled),
            "not_authorized" => Ok(OrderStatus::NotAuthorized),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}
