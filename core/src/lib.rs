//! Synchronous client for the Konduto fraud-analysis API.
//!
//! # Overview
//! Submits commerce orders for risk analysis, fetches them back, and reports
//! their final review status. Requests are authenticated with a per-client
//! API key; responses are decoded into typed orders and a small error
//! taxonomy.
//!
//! # Design
//! - `Konduto` owns its `Config`; there is no process-wide state.
//! - Inputs are validated against a static schema before any I/O.
//! - Requests and responses are plain data (`HttpRequest`/`HttpResponse`);
//!   the round trip goes through the `Transport` trait, with a blocking
//!   `ureq` implementation by default and fakes in tests.
//! - One request per operation, no retries: posting an order has side
//!   effects on the service.
//!
//! ```no_run
//! use konduto::{Config, Konduto, Order};
//!
//! # fn main() -> Result<(), konduto::KondutoError> {
//! let konduto = Konduto::new(Config::new("T01234567890123456789")?);
//! let order: Order = konduto.get_order("ORD-1029")?;
//! println!("{:?}", order.recommendation);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod control;
pub mod error;
pub mod http;
pub mod order;
pub mod types;
pub mod validation;

pub use client::Konduto;
pub use config::{ApiKey, ApiVersion, Config, Environment};
pub use control::{ApiControl, ApiResponse, Envelope, ResponseStatus};
pub use error::{InvalidOrder, KondutoError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use order::{Order, Submission};
pub use types::{
    Address, Customer, Item, OrderStatus, Payment, PaymentStatus, PaymentType, Recommendation,
    Seller,
};
pub use validation::{validate_field, Entity, FieldError, FieldErrorKind};
