use axum::http::{self, Request, StatusCode};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use http_body_util::BodyExt;
use mock_server::app;
use serde_json::{json, Value};
use tower::ServiceExt;

const KEY: &str = "T00000000000000000042";

fn auth() -> String {
    format!("Basic {}", STANDARD.encode(format!("{KEY}:")))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, auth())
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn get_request(uri: &str) -> Request<String> {
    Request::builder()
        .uri(uri)
        .header(http::header::AUTHORIZATION, auth())
        .body(String::new())
        .unwrap()
}

fn order(id: &str, total_amount: f64) -> Value {
    json!({
        "id": id,
        "total_amount": total_amount,
        "customer": { "id": "c-1", "name": "Ana", "email": "ana@example.com" }
    })
}

// --- auth ---

#[tokio::test]
async fn missing_credentials_returns_401() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/v1/orders/ORD-1")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_bytes(resp).await;
    assert!(String::from_utf8_lossy(&body).contains("Unauthorized"));
}

// --- create ---

#[tokio::test]
async fn analyze_scores_order() {
    let resp = app()
        .oneshot(json_request("POST", "/v1/orders", &order("ORD-1", 2500.0)))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["order"]["id"], "ORD-1");
    assert_eq!(body["order"]["recommendation"], "decline");
    assert_eq!(body["order"]["status"], "pending");
}

#[tokio::test]
async fn persist_only_skips_scoring() {
    let mut input = order("ORD-2", 10.0);
    input["analyze"] = json!(false);
    let resp = app()
        .oneshot(json_request("POST", "/v1/orders", &input))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["order"]["status"], "not_analyzed");
    assert!(body["order"].get("recommendation").is_none());
}

#[tokio::test]
async fn create_without_id_returns_400() {
    let resp = app()
        .oneshot(json_request("POST", "/v1/orders", &json!({ "total_amount": 1.0 })))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["status"], "error");
}

// --- get ---

#[tokio::test]
async fn get_unknown_order_returns_404() {
    let resp = app()
        .oneshot(get_request("/v1/orders/ORD-404"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- update ---

#[tokio::test]
async fn update_unknown_order_returns_404() {
    let resp = app()
        .oneshot(json_request(
            "PUT",
            "/v1/orders/ORD-404",
            &json!({ "status": "fraud", "comments": "" }),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_with_unknown_status_returns_400() {
    let resp = app()
        .oneshot(json_request(
            "PUT",
            "/v1/orders/ORD-1",
            &json!({ "status": "pending" }),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- full lifecycle ---

#[tokio::test]
async fn order_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // analyze
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/v1/orders", &order("ORD-9", 50.0)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let created = body_json(resp).await;
    assert_eq!(created["order"]["recommendation"], "approve");

    // posting the same id again is refused
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/v1/orders", &order("ORD-9", 50.0)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let refused = body_json(resp).await;
    assert_eq!(refused["status"], "error");

    // get
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get_request("/v1/orders/ORD-9"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched = body_json(resp).await;
    assert_eq!(fetched["order"]["customer"]["email"], "ana@example.com");
    assert_eq!(fetched["order"]["score"], 0.05);

    // update
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "PUT",
            "/v1/orders/ORD-9",
            &json!({ "status": "approved", "comments": "manual review" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated = body_json(resp).await;
    assert_eq!(updated["order"]["old_status"], "pending");
    assert_eq!(updated["order"]["new_status"], "approved");

    // get reflects the new status
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get_request("/v1/orders/ORD-9"))
        .await
        .unwrap();
    let fetched = body_json(resp).await;
    assert_eq!(fetched["order"]["status"], "approved");
    assert_eq!(fetched["order"]["comments"], "manual review");
}
