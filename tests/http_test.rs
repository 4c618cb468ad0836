mod common;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use common::{FlakyStore, running_limiter};
use hit_limiter::{AppState, Limiter, LimiterConfig, MemoryStore, handlers};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn app(limiter: &Limiter) -> Router {
    handlers::router(Arc::new(AppState::new(limiter.clone())))
}

async fn get(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

fn hit_from(ip: &str) -> Request<Body> {
    Request::builder()
        .uri("/hit")
        .header("X-Real-Ip", ip)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn hit_renders_rate_then_error() {
    let limiter = running_limiter(Duration::from_secs(60), 2).await;
    let app = app(&limiter);

    assert_eq!(get(&app, hit_from("1.1.1.1")).await, (StatusCode::OK, "1\n".to_string()));
    assert_eq!(get(&app, hit_from("1.1.1.1")).await, (StatusCode::OK, "2\n".to_string()));
    assert_eq!(
        get(&app, hit_from("1.1.1.1")).await,
        (StatusCode::TOO_MANY_REQUESTS, "Error\n".to_string())
    );
    // other clients are unaffected
    assert_eq!(get(&app, hit_from("2.2.2.2")).await, (StatusCode::OK, "1\n".to_string()));
    limiter.shutdown().await;
}

#[tokio::test]
async fn falls_back_to_peer_address() {
    let limiter = running_limiter(Duration::from_secs(60), 5).await;
    let app = app(&limiter);

    for expected in ["1\n", "2\n"] {
        let mut request = Request::builder().uri("/hit").body(Body::empty()).unwrap();
        let peer: SocketAddr = "172.16.0.4:40001".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(peer));
        assert_eq!(get(&app, request).await, (StatusCode::OK, expected.to_string()));
    }

    assert_eq!(limiter.rate("172.16.0.4").await.unwrap(), 2);
    limiter.shutdown().await;
}

#[tokio::test]
async fn forwarded_for_is_used_without_real_ip() {
    let limiter = running_limiter(Duration::from_secs(60), 5).await;
    let app = app(&limiter);

    let request = Request::builder()
        .uri("/hit")
        .header("X-Forwarded-For", "8.8.8.8")
        .body(Body::empty())
        .unwrap();
    assert_eq!(get(&app, request).await.0, StatusCode::OK);
    assert_eq!(limiter.rate("8.8.8.8").await.unwrap(), 1);
    limiter.shutdown().await;
}

#[tokio::test]
async fn store_failure_is_service_unavailable() {
    let limiter = Limiter::new(
        LimiterConfig::new(Duration::from_secs(60), 5),
        Arc::new(FlakyStore::failing_inserts()),
    )
    .unwrap();
    limiter.init().await.unwrap();
    let app = app(&limiter);

    assert_eq!(
        get(&app, hit_from("3.3.3.3")).await,
        (StatusCode::SERVICE_UNAVAILABLE, "Error\n".to_string())
    );
    limiter.shutdown().await;
}

#[tokio::test]
async fn rate_endpoint_reads_without_hitting() {
    let limiter = running_limiter(Duration::from_secs(60), 5).await;
    let app = app(&limiter);
    get(&app, hit_from("4.4.4.4")).await;

    let rate = || {
        Request::builder()
            .uri("/rate")
            .header("X-Real-Ip", "4.4.4.4")
            .body(Body::empty())
            .unwrap()
    };
    assert_eq!(get(&app, rate()).await, (StatusCode::OK, "1\n".to_string()));
    assert_eq!(get(&app, rate()).await, (StatusCode::OK, "1\n".to_string()));
    limiter.shutdown().await;
}

#[tokio::test]
async fn health_reflects_lifecycle() {
    let limiter = Limiter::new(LimiterConfig::default(), Arc::new(MemoryStore::new())).unwrap();
    let app = app(&limiter);
    let health = || Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, body) = get(&app, health()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["limiter"], "uninitialized");

    limiter.init().await.unwrap();
    let (status, body) = get(&app, health()).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["limiter"], "running");
    assert_eq!(json["limit"], 60);
    limiter.shutdown().await;
}

#[tokio::test]
async fn metrics_are_exposed() {
    let limiter = running_limiter(Duration::from_secs(60), 5).await;
    let app = app(&limiter);
    get(&app, hit_from("5.5.5.5")).await;

    let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let (status, body) = get(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("limiter_hits_total"));
    limiter.shutdown().await;
}
