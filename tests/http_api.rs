use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use product_catalog::{
    build_app, unique_code, AppState, MemoryProductStore, ProductGenerator, TEST_CATEGORY,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> (Router, Arc<MemoryProductStore>) {
    let store = Arc::new(MemoryProductStore::new());
    (build_app(AppState::new(store.clone())), store)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    dispatch(app, request).await
}

async fn dispatch(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn widget(price: Value) -> Value {
    json!({
        "name": "Widget",
        "code": "ABC123",
        "description": "x",
        "category": "tools",
        "price": price,
        "created_at": "2024-05-01T12:00:00Z"
    })
}

#[tokio::test]
async fn widget_scenario_over_http() {
    let (app, _) = app();

    let (status, body) =
        send(&app, Method::POST, "/api/v1/products", Some(widget(json!(19.99)))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["id"], json!(1));
    assert_eq!(body["data"]["name"], json!("Widget"));
    assert_eq!(body["data"]["price"], json!("19.99"));

    let (status, body) = send(&app, Method::GET, "/api/v1/products/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], json!(1));
    assert_eq!(body["data"]["name"], json!("Widget"));
    assert_eq!(body["data"]["code"], json!("ABC123"));
    assert_eq!(body["data"]["price"], json!("19.99"));

    let (status, body) =
        send(&app, Method::PUT, "/api/v1/products/1", Some(widget(json!("29.99")))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], json!(1));
    let (_, body) = send(&app, Method::GET, "/api/v1/products/1", None).await;
    assert_eq!(body["data"]["price"], json!("29.99"));

    let (status, _) = send(&app, Method::DELETE, "/api/v1/products/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = send(&app, Method::GET, "/api/v1/products/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], json!("not_found"));
}

#[tokio::test]
async fn empty_list_is_an_empty_array() {
    let (app, _) = app();
    let (status, body) = send(&app, Method::GET, "/api/v1/products", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
    assert_eq!(body["meta"]["count"], json!(0));
}

#[tokio::test]
async fn update_and_delete_of_unknown_id_are_not_found() {
    let (app, store) = app();
    let (status, _) =
        send(&app, Method::PUT, "/api/v1/products/42", Some(widget(json!(1)))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(store.is_empty());
    let (status, _) = send(&app, Method::DELETE, "/api/v1/products/42", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_fields_are_bad_requests_naming_the_field() {
    let (app, store) = app();
    let (status, body) =
        send(&app, Method::POST, "/api/v1/products", Some(widget(json!(-5)))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!("validation_error"));
    assert_eq!(body["error"]["details"]["field"], json!("price"));

    let mut missing_name = widget(json!(1));
    missing_name.as_object_mut().unwrap().remove("name");
    let (status, body) = send(&app, Method::POST, "/api/v1/products", Some(missing_name)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"]["field"], json!("name"));
    assert!(store.is_empty());
}

#[tokio::test]
async fn sub_cent_number_price_is_rejected_not_rounded() {
    let (app, store) = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/products")
        .header("content-type", "application/json")
        .body(Body::from(
            r#"{"name":"Widget","code":"ABC123","description":"x","category":"tools",
                "price":19.9999999999999999}"#,
        ))
        .unwrap();
    let (status, body) = dispatch(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"]["field"], json!("price"));
    assert!(store.is_empty());
}

#[tokio::test]
async fn unparseable_body_uses_error_envelope() {
    let (app, store) = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/products")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = dispatch(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!("invalid_body"));

    let request = Request::builder()
        .method(Method::PUT)
        .uri("/api/v1/products/1")
        .body(Body::from(widget(json!(1)).to_string()))
        .unwrap();
    let (status, body) = dispatch(&app, request).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["error"]["code"], json!("invalid_body"));
    assert!(store.is_empty());
}

#[tokio::test]
async fn random_product_is_synthesized_and_stored() {
    let store = Arc::new(MemoryProductStore::new());
    let state = AppState::with_generator(store.clone(), ProductGenerator::seeded(7));
    let app = build_app(state);

    let (status, body) = send(&app, Method::POST, "/api/v1/products/random", None).await;
    assert_eq!(status, StatusCode::CREATED);
    let data = &body["data"];
    assert_eq!(data["id"], json!(1));
    assert_eq!(data["category"], json!(TEST_CATEGORY));
    let name = data["name"].as_str().unwrap();
    assert_eq!(data["code"], json!(unique_code(name, TEST_CATEGORY)));
    assert_eq!(store.len(), 1);

    let (_, listed) = send(&app, Method::GET, "/api/v1/products", None).await;
    assert_eq!(listed["data"][0], *data);

    let mut expected = ProductGenerator::seeded(7);
    assert_eq!(name, expected.synthesize_product().name);
}

#[tokio::test]
async fn malformed_id_is_a_bad_request() {
    let (app, _) = app();
    let (status, body) = send(&app, Method::GET, "/api/v1/products/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!("bad_request"));
}

#[tokio::test]
async fn lost_store_maps_to_service_unavailable() {
    let (app, store) = app();
    store.set_available(false);
    let (status, body) = send(&app, Method::GET, "/api/v1/products", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], json!("connection_error"));

    let (status, body) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], json!("degraded"));
}

#[tokio::test]
async fn health_ready_and_version() {
    let (app, _) = app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("ok"));

    let (status, body) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["version"].as_str().unwrap().starts_with("in-memory"));

    let (_, body) = send(&app, Method::GET, "/version", None).await;
    assert_eq!(body["name"], json!("product-catalog"));
}

#[tokio::test]
async fn cors_preflight_is_allowed() {
    let (app, _) = app();
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/products")
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("access-control-allow-origin"));
}
