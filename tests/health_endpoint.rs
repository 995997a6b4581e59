use axum::{
    Router,
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode, header},
    response::Response,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceExt;

use site_status::config::{DEFAULT_SLUG, EndpointConfig, hash_slug};
use site_status::error::RATE_LIMIT_MESSAGE;
use site_status::state::AppState;

const OK_BODY: &str = r#"{"status":"OK","message":"Site is up and running."}"#;

fn router(config: EndpointConfig, metrics: bool) -> Router {
    site_status::app(Arc::new(AppState::in_memory(config)), metrics)
}

fn request(path: &str, peer: &str) -> Request<Body> {
    let addr: SocketAddr = peer.parse().unwrap();
    let mut req = Request::builder().uri(path).body(Body::empty()).unwrap();
    req.extensions_mut().insert(ConnectInfo(addr));
    req
}

async fn send(app: &Router, path: &str, peer: &str) -> Response {
    app.clone().oneshot(request(path, peer)).await.unwrap()
}

async fn body_string(res: Response) -> String {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn default_slug_serves_status_json() {
    let app = router(EndpointConfig::default(), false);
    let res = send(&app, &format!("/{DEFAULT_SLUG}"), "10.0.0.1:5000").await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::CONTENT_TYPE], "application/json");
    assert_eq!(body_string(res).await, OK_BODY);
}

#[tokio::test]
async fn trailing_slash_and_query_still_match() {
    let app = router(EndpointConfig::default(), false);
    let res = send(&app, &format!("/{DEFAULT_SLUG}/?x=1"), "10.0.0.1:5000").await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn sixth_request_in_window_is_rate_limited() {
    let app = router(EndpointConfig::new(None, false, 5, 60), false);
    let path = format!("/{DEFAULT_SLUG}");

    for _ in 0..5 {
        let res = send(&app, &path, "10.0.0.1:5000").await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_string(res).await, OK_BODY);
    }

    // source port differs, client is the same
    let res = send(&app, &path, "10.0.0.1:6000").await;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        res.headers()[header::CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );
    assert_eq!(res.headers()[header::RETRY_AFTER], "60");
    let body = body_string(res).await;
    assert_eq!(body, RATE_LIMIT_MESSAGE);
    assert!(!body.contains("Site is up"));
}

#[tokio::test]
async fn blocked_client_does_not_affect_others() {
    let app = router(EndpointConfig::new(None, false, 1, 60), false);
    let path = format!("/{DEFAULT_SLUG}");

    assert_eq!(send(&app, &path, "10.0.0.1:1").await.status(), StatusCode::OK);
    assert_eq!(
        send(&app, &path, "10.0.0.1:1").await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(send(&app, &path, "10.0.0.2:1").await.status(), StatusCode::OK);
    assert_eq!(send(&app, &path, "[::1]:1").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn other_paths_pass_through_without_counting() {
    let app = router(EndpointConfig::new(None, false, 1, 60), false);

    let nested = format!("/{DEFAULT_SLUG}/extra");
    for path in ["/", "/health", nested.as_str()] {
        let res = send(&app, path, "10.0.0.1:1").await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert!(!body_string(res).await.contains("Site is up"));
    }

    // the limiter was never touched
    let res = send(&app, &format!("/{DEFAULT_SLUG}"), "10.0.0.1:1").await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn hashed_slug_replaces_literal_path() {
    let config = EndpointConfig::new(Some("custom-health"), true, 5, 60);
    let app = router(config, false);

    let hashed = send(&app, &format!("/{}", hash_slug("custom-health")), "10.0.0.1:1").await;
    assert_eq!(hashed.status(), StatusCode::OK);
    assert_eq!(body_string(hashed).await, OK_BODY);

    let literal = send(&app, "/custom-health", "10.0.0.1:1").await;
    assert_eq!(literal.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn any_method_on_slug_is_health_check() {
    let app = router(EndpointConfig::default(), false);
    let mut req = request(&format!("/{DEFAULT_SLUG}"), "10.0.0.1:1");
    *req.method_mut() = axum::http::Method::HEAD;
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn metrics_route_is_opt_in() {
    let hidden = router(EndpointConfig::default(), false);
    assert_eq!(
        send(&hidden, "/metrics", "10.0.0.1:1").await.status(),
        StatusCode::NOT_FOUND
    );

    let exposed = router(EndpointConfig::new(None, false, 1, 60), true);
    send(&exposed, &format!("/{DEFAULT_SLUG}"), "10.0.0.9:1").await;
    for _ in 0..3 {
        let res = send(&exposed, "/metrics", "10.0.0.9:1").await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(body_string(res).await.contains("site_status_requests_total"));
    }
}

#[tokio::test]
async fn missing_peer_address_uses_shared_key() {
    let app = router(EndpointConfig::new(None, false, 1, 60), false);
    let req = || {
        Request::builder()
            .uri(format!("/{DEFAULT_SLUG}"))
            .body(Body::empty())
            .unwrap()
    };

    assert_eq!(app.clone().oneshot(req()).await.unwrap().status(), StatusCode::OK);
    assert_eq!(
        app.clone().oneshot(req()).await.unwrap().status(),
        StatusCode::TOO_MANY_REQUESTS
    );
}
