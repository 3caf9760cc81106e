//! In-memory stand-in for the Konduto order API.
//!
//! Serves `POST /v1/orders`, `GET /v1/orders/{id}` and `PUT /v1/orders/{id}`
//! with the same envelopes as the real service. Scores are deterministic:
//! they depend only on `total_amount`.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub type Db = Arc<RwLock<HashMap<String, Map<String, Value>>>>;

type Reply = (StatusCode, Json<Value>);

const UPDATABLE_STATUSES: [&str; 5] = [
    "approved",
    "declined",
    "fraud",
    "canceled",
    "not_authorized",
];

#[derive(Deserialize)]
pub struct UpdateStatus {
    pub status: String,
    #[serde(default)]
    pub comments: String,
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/v1/orders", post(create_order))
        .route("/v1/orders/{id}", get(get_order).put(update_order))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Score and recommendation for an order total.
pub fn score(total_amount: f64) -> (f64, &'static str) {
    if total_amount <= 100.0 {
        (0.05, "approve")
    } else if total_amount <= 1000.0 {
        (0.48, "review")
    } else {
        (0.93, "decline")
    }
}

/// Whether the request carries `Basic base64("<key>:")` with a well-formed key.
pub fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Basic "))
        .and_then(|encoded| STANDARD.decode(encoded).ok())
        .and_then(|raw| String::from_utf8(raw).ok())
        .and_then(|credentials| credentials.strip_suffix(':').map(is_api_key))
        .unwrap_or(false)
}

fn is_api_key(key: &str) -> bool {
    key.chars().count() == 21 && (key.starts_with('T') || key.starts_with('P'))
}

fn error(status: StatusCode, location: &str, why: &str) -> Reply {
    (
        status,
        Json(json!({ "status": "error", "message": { "where": location, "why": why } })),
    )
}

fn unauthorized() -> Reply {
    error(StatusCode::UNAUTHORIZED, "/", "Unauthorized")
}

async fn create_order(State(db): State<Db>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    if !authorized(&headers) {
        return unauthorized();
    }
    let Value::Object(mut order) = body else {
        return error(StatusCode::BAD_REQUEST, "/", "order must be a JSON object");
    };
    let Some(id) = order.get("id").and_then(Value::as_str).map(str::to_string) else {
        return error(StatusCode::BAD_REQUEST, "/id", "missing order id");
    };
    let analyze = order.remove("analyze");
    let analyze = analyze.and_then(|v| v.as_bool()).unwrap_or(true);

    let mut orders = db.write().await;
    if orders.contains_key(&id) {
        return error(StatusCode::CONFLICT, "/id", "Order already exists");
    }

    let mut reply = Map::new();
    reply.insert("id".to_string(), Value::String(id.clone()));
    if analyze {
        let total = order.get("total_amount").and_then(Value::as_f64);
        let (score, recommendation) = score(total.unwrap_or(0.0));
        for (key, value) in [
            ("score", json!(score)),
            ("recommendation", json!(recommendation)),
            ("status", json!("pending")),
        ] {
            order.insert(key.to_string(), value.clone());
            reply.insert(key.to_string(), value);
        }
    } else {
        order.insert("status".to_string(), json!("not_analyzed"));
        reply.insert("status".to_string(), json!("not_analyzed"));
    }

    tracing::info!(%id, analyze, "order stored");
    orders.insert(id, order);
    (StatusCode::OK, Json(json!({ "status": "ok", "order": reply })))
}

async fn get_order(State(db): State<Db>, headers: HeaderMap, Path(id): Path<String>) -> Reply {
    if !authorized(&headers) {
        return unauthorized();
    }
    let orders = db.read().await;
    match orders.get(&id) {
        Some(order) => (StatusCode::OK, Json(json!({ "status": "ok", "order": order }))),
        None => error(StatusCode::NOT_FOUND, &format!("/orders/{id}"), "Order not found"),
    }
}

async fn update_order(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<UpdateStatus>,
) -> Reply {
    if !authorized(&headers) {
        return unauthorized();
    }
    if !UPDATABLE_STATUSES.contains(&input.status.as_str()) {
        return error(StatusCode::BAD_REQUEST, "/status", "invalid status");
    }
    let mut orders = db.write().await;
    let Some(order) = orders.get_mut(&id) else {
        return error(StatusCode::NOT_FOUND, &format!("/orders/{id}"), "Order not found");
    };

    let old_status = order.insert("status".to_string(), json!(input.status));
    let old_status = old_status.unwrap_or(Value::Null);
    order.insert("comments".to_string(), json!(input.comments));
    tracing::info!(%id, new_status = %input.status, "order status updated");
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "order": { "old_status": old_status, "new_status": input.status }
        })),
    )
}
