use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, ORIGIN};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use darkside::proxy::{AppState, ProxyConfig, router};
use engine::poll::PollPolicy;
use serde_json::{Value, json};
use tower::ServiceExt;

const KEY: &str = "test-key";

#[derive(Clone, Default)]
struct Upstream {
    last_create: Arc<Mutex<Option<Value>>>,
    status_calls: Arc<AtomicU32>,
}

async fn upstream_create(
    State(up): State<Upstream>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let auth = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    if auth != Some("Bearer test-key") {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "Unauthorized"}))).into_response();
    }
    let prompt = body["prompt"].as_str().unwrap_or_default().to_string();
    *up.last_create.lock().unwrap() = Some(body);

    if prompt.contains("quota") {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({"error": "rate limited"})),
        )
            .into_response();
    }
    let id = if prompt.contains("Stuck") {
        "stuck"
    } else if prompt.contains("Broken") {
        "broken"
    } else {
        "gen-1"
    };
    Json(json!({"sdGenerationJob": {"generationId": id}})).into_response()
}

async fn upstream_status(State(up): State<Upstream>, Path(id): Path<String>) -> Json<Value> {
    let n = up.status_calls.fetch_add(1, Ordering::SeqCst) + 1;
    let (status, images) = match id.as_str() {
        "broken" => ("FAILED", json!([])),
        "gen-1" if n >= 2 => (
            "COMPLETE",
            json!([{"id": "img-1", "url": "https://cdn.example/img-1.png"}]),
        ),
        _ => ("PENDING", json!([])),
    };
    Json(json!({"generations_by_pk": {"status": status, "generated_images": images}}))
}

async fn spawn_upstream() -> (String, Upstream) {
    let upstream = Upstream::default();
    let app = Router::new()
        .route("/v1/generations", post(upstream_create))
        .route("/v1/generations/:id", get(upstream_status))
        .with_state(upstream.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/v1"), upstream)
}

fn proxy(base: &str, key: Option<&str>) -> Router {
    let config = ProxyConfig {
        api_key: key.map(str::to_string),
        api_base: base.to_string(),
        poll: PollPolicy::new(3, Duration::from_millis(5)),
        call_delay: Duration::from_millis(1),
        ..ProxyConfig::default()
    };
    router(AppState::new(config).unwrap())
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn health_is_ok_without_a_key() {
    let app = proxy("http://127.0.0.1:9", None);
    let req = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), 64).await.unwrap();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn generate_forwards_with_defaults_and_returns_job_id() {
    let (base, upstream) = spawn_upstream().await;
    let (status, body) = call(
        proxy(&base, Some(KEY)),
        post_json("/api/leonardo/generate", json!({"prompt": "a linebacker", "height": 768})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "generationId": "gen-1"}));

    let sent = upstream.last_create.lock().unwrap().clone().unwrap();
    assert_eq!(sent["prompt"], "a linebacker");
    assert_eq!(sent["modelId"], darkside::proxy::DEFAULT_MODEL_ID);
    assert_eq!(sent["width"], 512);
    assert_eq!(sent["height"], 768);
    assert_eq!(sent["num_images"], 1);
}

#[tokio::test]
async fn missing_prompt_is_a_400() {
    let (status, body) = call(
        proxy("http://127.0.0.1:9", Some(KEY)),
        post_json("/api/leonardo/generate", json!({"negativePrompt": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "prompt is required");
}

#[tokio::test]
async fn malformed_json_is_a_400() {
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/leonardo/generate")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = call(proxy("http://127.0.0.1:9", Some(KEY)), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn missing_key_is_a_500_with_fixed_message() {
    let (status, body) = call(
        proxy("http://127.0.0.1:9", None),
        post_json("/api/leonardo/generate", json!({"prompt": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"success": false, "error": "LEONARDO_API_KEY not configured"})
    );
}

#[tokio::test]
async fn upstream_status_is_passed_through() {
    let (base, _) = spawn_upstream().await;
    let (status, body) = call(
        proxy(&base, Some(KEY)),
        post_json("/api/leonardo/generate", json!({"prompt": "over quota"})),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "rate limited");

    let (status, _) = call(
        proxy(&base, Some("wrong")),
        post_json("/api/leonardo/generate", json!({"prompt": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unreachable_upstream_is_a_generic_500() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (status, body) = call(
        proxy(&format!("http://{addr}/v1"), Some(KEY)),
        post_json("/api/leonardo/generate", json!({"prompt": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Image generation request failed");
}

#[tokio::test]
async fn status_endpoint_reports_progress() {
    let (base, _) = spawn_upstream().await;
    let app = proxy(&base, Some(KEY));
    let get = |uri: &str| Request::builder().uri(uri).body(Body::empty()).unwrap();

    let (status, body) = call(app.clone(), get("/api/leonardo/status/gen-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"success": true, "status": "PENDING", "complete": false, "images": []})
    );

    let (_, body) = call(app.clone(), get("/api/leonardo/status/gen-1")).await;
    assert_eq!(body["complete"], true);
    assert_eq!(body["images"][0]["url"], "https://cdn.example/img-1.png");

    let (status, _) = call(app, get("/api/leonardo/status/bad%20id")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn player_portrait_polls_until_complete() {
    let (base, upstream) = spawn_upstream().await;
    let (status, body) = call(
        proxy(&base, Some(KEY)),
        post_json(
            "/api/players/generate",
            json!({"name": "Vader", "position": "Linebacker", "jerseyNumber": 66}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["generationId"], "gen-1");
    assert_eq!(body["complete"], true);
    assert_eq!(body["images"].as_array().map(Vec::len), Some(1));
    assert_eq!(upstream.status_calls.load(Ordering::SeqCst), 2);

    let sent = upstream.last_create.lock().unwrap().clone().unwrap();
    assert!(sent["prompt"].as_str().unwrap().contains("jersey number 66"));
    assert_eq!(sent["height"], 768);
    assert!(sent["negative_prompt"].is_string());
}

#[tokio::test]
async fn player_portrait_requires_name_and_position() {
    let (status, body) = call(
        proxy("http://127.0.0.1:9", Some(KEY)),
        post_json("/api/players/generate", json!({"name": "Vader"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "name and position are required");
}

#[tokio::test]
async fn player_portrait_times_out_after_poll_budget() {
    let (base, upstream) = spawn_upstream().await;
    let (status, body) = call(
        proxy(&base, Some(KEY)),
        post_json("/api/players/generate", json!({"name": "Stuck", "position": "Safety"})),
    )
    .await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["success"], false);
    assert_eq!(upstream.status_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn failed_generation_is_a_bad_gateway() {
    let (base, _) = spawn_upstream().await;
    let (status, _) = call(
        proxy(&base, Some(KEY)),
        post_json("/api/players/generate", json!({"name": "Broken", "position": "Safety"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn sprite_returns_job_id_without_polling() {
    let (base, upstream) = spawn_upstream().await;
    let (status, body) = call(
        proxy(&base, Some(KEY)),
        post_json("/api/sprites/generate", json!({"subject": "cornerback", "pose": "backpedal"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "generationId": "gen-1"}));
    assert_eq!(upstream.status_calls.load(Ordering::SeqCst), 0);
    let sent = upstream.last_create.lock().unwrap().clone().unwrap();
    assert!(sent["prompt"].as_str().unwrap().contains("cornerback, backpedal"));
}

#[tokio::test]
async fn responses_carry_cors_headers() {
    let req = Request::builder()
        .uri("/api/health")
        .header(ORIGIN, "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let resp = proxy("http://127.0.0.1:9", None).oneshot(req).await.unwrap();
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}
