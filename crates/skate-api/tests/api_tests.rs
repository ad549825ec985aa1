//! API integration tests.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use skate_api::{create_router, ApiConfig, AppState, ScoringBackend, ScoringService};
use skate_leaderboard::LeaderboardStore;
use skate_scoring::ReferenceProfileStore;

const BOUNDARY: &str = "skate-test-boundary";

struct TestApp {
    router: Router,
    _upload_dir: tempfile::TempDir,
}

async fn create_test_app() -> TestApp {
    let upload_dir = tempfile::tempdir().unwrap();
    let config = ApiConfig {
        database_url: "sqlite::memory:".to_string(),
        scoring_backend: ScoringBackend::Stub,
        upload_dir: upload_dir.path().to_path_buf(),
        metrics_enabled: false,
        ..ApiConfig::default()
    };

    let leaderboard = LeaderboardStore::connect(&config.database_url).await.unwrap();
    let scoring = ScoringService::stub(
        Arc::new(ReferenceProfileStore::builtin()),
        config.stub_score,
        Duration::from_secs(5),
    );
    let state = AppState::from_parts(config, leaderboard, scoring);

    TestApp {
        router: create_router(state, None),
        _upload_dir: upload_dir,
    }
}

fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"video_file\"; filename=\"{}\"\r\nContent-Type: video/quicktime\r\n\r\n",
                BOUNDARY, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn submit_request(name: &str, trick: &str, file_name: &str) -> Request<Body> {
    let body = multipart_body(
        &[("name", name), ("trick_name", trick)],
        Some((file_name, b"not really a video")),
    );
    Request::builder()
        .method("POST")
        .uri("/submit_run")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Test health endpoint.
#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app().await;

    let response = app.router.clone().oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("X-Content-Type-Options").unwrap(),
        "nosniff"
    );
    assert!(response.headers().contains_key("X-Request-ID"));

    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_ready_endpoint() {
    let app = create_test_app().await;

    let response = app.router.clone().oneshot(get("/ready")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["scoring_backend"], "stub");
    assert_eq!(body["checks"]["database"]["status"], "ok");
}

/// Metrics are not routed when disabled.
#[tokio::test]
async fn test_metrics_endpoint_disabled() {
    let app = create_test_app().await;

    let response = app.router.clone().oneshot(get("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_tricks() {
    let app = create_test_app().await;

    let response = app.router.clone().oneshot(get("/tricks")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["tricks"], serde_json::json!(["kickflip", "ollie"]));
}

#[tokio::test]
async fn test_submit_run_then_leaderboard() {
    let app = create_test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(submit_request("tony", "Ollie", "run.MOV"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body[0], "success");
    assert_eq!(body[1]["name"], "tony");
    assert_eq!(body[1]["trick_name"], "ollie");
    assert_eq!(body[1]["score"], 7.5);
    assert_eq!(body[1]["personal_best"], true);
    assert_eq!(
        body[1]["message"],
        "Run for tony, ollie submitted successfully!"
    );
    // stub engine has no breakdown
    assert!(body[1].get("breakdown").is_none());

    let response = app
        .router
        .clone()
        .oneshot(get("/leaderboard"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let rows = body["leaderboard"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["user"], "tony");
    assert_eq!(rows[0]["file_name"], "run.MOV");
    assert_eq!(rows[0]["trick_name"], "ollie");
}

#[tokio::test]
async fn test_resubmission_is_not_personal_best() {
    let app = create_test_app().await;

    for expected in [true, false] {
        let response = app
            .router
            .clone()
            .oneshot(submit_request("tony", "kickflip", "run.mov"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body[1]["personal_best"], expected);
    }
}

#[tokio::test]
async fn test_submit_rejects_wrong_extension() {
    let app = create_test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(submit_request("tony", "ollie", "run.mp4"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["detail"], "Only .mov files are allowed.");
}

#[tokio::test]
async fn test_submit_rejects_unknown_trick() {
    let app = create_test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(submit_request("tony", "heelflip", "run.mov"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["detail"].as_str().unwrap().contains("heelflip"));
}

#[tokio::test]
async fn test_submit_rejects_blank_name() {
    let app = create_test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(submit_request("   ", "ollie", "run.mov"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_submit_requires_video_file() {
    let app = create_test_app().await;

    let body = multipart_body(&[("name", "tony"), ("trick_name", "ollie")], None);
    let request = Request::builder()
        .method("POST")
        .uri("/submit_run")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["detail"], "video_file is required");
}

#[tokio::test]
async fn test_user_scores() {
    let app = create_test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(get("/user/tony"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    for trick in ["ollie", "kickflip"] {
        let response = app
            .router
            .clone()
            .oneshot(submit_request("tony", trick, "run.mov"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .router
        .clone()
        .oneshot(get("/user/tony"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["user"], "tony");
    assert_eq!(body["scores"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_leaderboard_limit() {
    let app = create_test_app().await;

    for name in ["a", "b", "c"] {
        let response = app
            .router
            .clone()
            .oneshot(submit_request(name, "ollie", "run.mov"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .router
        .clone()
        .oneshot(get("/leaderboard?limit=2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["leaderboard"].as_array().unwrap().len(), 2);

    // zero is clamped up to one row
    let response = app
        .router
        .clone()
        .oneshot(get("/leaderboard?limit=0"))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["leaderboard"].as_array().unwrap().len(), 1);
}
