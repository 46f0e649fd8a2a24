//! Integration Tests for API Endpoints
//!
//! Tests the full request/response cycle against a local stand-in upstream.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Path, RawQuery, State},
    http::{Request, StatusCode},
    routing::get,
    Json, Router,
};
use readthrough_cache::{
    api::{create_router, AppState},
    upstream::UpstreamClient,
    ReadThroughCache,
};
use serde_json::{json, Value};
use tower::ServiceExt;

// == Helper Functions ==

/// Spawns an upstream that answers `/markets/:id` after a delay and counts requests.
/// `/echo` returns the raw query string it received.
async fn spawn_upstream(delay: Duration) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));

    async fn market(
        State((hits, delay)): State<(Arc<AtomicUsize>, Duration)>,
        Path(id): Path<String>,
    ) -> Result<Json<Value>, StatusCode> {
        hits.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(delay).await;
        if id == "missing" {
            return Err(StatusCode::NOT_FOUND);
        }
        Ok(Json(json!({ "id": id, "price": 0.42 })))
    }

    async fn echo(RawQuery(query): RawQuery) -> Json<Value> {
        Json(json!({ "query": query }))
    }

    let app = Router::new()
        .route("/markets/:id", get(market))
        .route("/echo", get(echo))
        .with_state((hits.clone(), delay));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), hits)
}

fn create_test_app(base_url: &str) -> Router {
    let upstream = UpstreamClient::new(base_url, Duration::from_secs(5)).unwrap();
    let state = AppState::new(ReadThroughCache::new(100), upstream, Duration::from_secs(60));
    create_router(state)
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// == Proxy Endpoint Tests ==

#[tokio::test]
async fn test_proxy_fetches_then_serves_from_cache() {
    let (base_url, hits) = spawn_upstream(Duration::ZERO).await;
    let app = create_test_app(&base_url);

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(get_request("/proxy/markets/abc"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_to_json(response.into_body()).await;
        assert_eq!(json["id"], "abc");
    }

    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_proxy_coalesces_concurrent_requests() {
    let (base_url, hits) = spawn_upstream(Duration::from_millis(200)).await;
    let app = create_test_app(&base_url);

    let requests = (0..5).map(|_| {
        let app = app.clone();
        tokio::spawn(async move { app.oneshot(get_request("/proxy/markets/hot")).await.unwrap() })
    });
    let responses = futures::future::join_all(requests).await;

    for response in responses {
        let response = response.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_to_json(response.into_body()).await;
        assert_eq!(json["id"], "hot");
    }
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_proxy_query_order_shares_cache_entry() {
    let (base_url, hits) = spawn_upstream(Duration::ZERO).await;
    let app = create_test_app(&base_url);

    let first = app
        .clone()
        .oneshot(get_request("/proxy/markets/q?limit=5&active=true"))
        .await
        .unwrap();
    let second = app
        .oneshot(get_request("/proxy/markets/q?active=true&limit=5"))
        .await
        .unwrap();

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_proxy_forwards_query_as_received() {
    let (base_url, _hits) = spawn_upstream(Duration::ZERO).await;
    let app = create_test_app(&base_url);

    let response = app
        .clone()
        .oneshot(get_request("/proxy/echo?id=2&id=1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["query"], "id=2&id=1");

    // The normalized form is still what the entry is stored under
    let response = app
        .oneshot(get_request("/cache/status?key=echo%3Fid%3D1%26id%3D2"))
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["present"], true);
}

#[tokio::test]
async fn test_proxy_upstream_not_found_is_not_cached() {
    let (base_url, hits) = spawn_upstream(Duration::ZERO).await;
    let app = create_test_app(&base_url);

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(get_request("/proxy/markets/missing"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_to_json(response.into_body()).await;
        assert!(json["error"].as_str().unwrap().contains("404"));
    }

    // Failures are never cached, so each request went upstream
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_proxy_unreachable_upstream_is_bad_gateway() {
    let app = create_test_app("http://127.0.0.1:9");

    let response = app
        .oneshot(get_request("/proxy/markets/abc"))
        .await
        .unwrap();

    assert!(
        response.status() == StatusCode::BAD_GATEWAY
            || response.status() == StatusCode::GATEWAY_TIMEOUT
    );
}

// == Cache Management Tests ==

#[tokio::test]
async fn test_status_reflects_cached_key() {
    let (base_url, _hits) = spawn_upstream(Duration::ZERO).await;
    let app = create_test_app(&base_url);

    let response = app
        .clone()
        .oneshot(get_request("/cache/status?key=markets/abc"))
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["present"], false);
    assert_eq!(json["stale"], true);

    app.clone()
        .oneshot(get_request("/proxy/markets/abc"))
        .await
        .unwrap();

    let response = app
        .oneshot(get_request("/cache/status?key=markets/abc"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["key"], "markets/abc");
    assert_eq!(json["present"], true);
    assert_eq!(json["stale"], false);
    assert_eq!(json["fetching"], false);
}

#[tokio::test]
async fn test_clear_forces_refetch() {
    let (base_url, hits) = spawn_upstream(Duration::ZERO).await;
    let app = create_test_app(&base_url);

    app.clone()
        .oneshot(get_request("/proxy/markets/abc"))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/cache")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["cleared"], 1);

    app.oneshot(get_request("/proxy/markets/abc"))
        .await
        .unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_stats_endpoint_reports_activity() {
    let (base_url, _hits) = spawn_upstream(Duration::ZERO).await;
    let app = create_test_app(&base_url);

    for _ in 0..2 {
        app.clone()
            .oneshot(get_request("/proxy/markets/abc"))
            .await
            .unwrap();
    }

    let response = app.oneshot(get_request("/stats")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["coordinator"]["fetches"], 1);
    assert_eq!(json["coordinator"]["hits"], 1);
    assert_eq!(json["coordinator"]["in_flight"], 0);
    assert_eq!(json["store"]["total_entries"], 1);
    assert!(json["hit_rate"].as_f64().is_some());
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app("http://127.0.0.1:9");

    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}

#[tokio::test]
async fn test_unknown_route_not_found() {
    let app = create_test_app("http://127.0.0.1:9");

    let response = app.oneshot(get_request("/nope")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
