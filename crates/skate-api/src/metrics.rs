//! Prometheus metrics.
//!
//! Every name carries the `skate_` prefix. Path labels are sanitized so user
//! names never become label values.

use std::sync::LazyLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use regex_lite::Regex;

/// `/user/<name>` prefix, compiled once.
static USER_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/user/[^/]+").expect("valid user path pattern"));

/// Install the global recorder. Panics if one is already installed.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            metrics_exporter_prometheus::Matcher::Full(names::RUN_SCORE.to_string()),
            &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0],
        )
        .and_then(|builder| builder.install_recorder())
        .expect("Failed to install Prometheus recorder")
}

pub mod names {
    pub const HTTP_REQUESTS_TOTAL: &str = "skate_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "skate_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "skate_http_requests_in_flight";

    pub const SCORING_DURATION_SECONDS: &str = "skate_scoring_duration_seconds";
    pub const RUN_SCORE: &str = "skate_run_score";
    pub const SUBMISSIONS_TOTAL: &str = "skate_submissions_total";
    pub const NO_DETECTIONS_TOTAL: &str = "skate_no_detections_total";
    pub const SCORING_TIMEOUTS_TOTAL: &str = "skate_scoring_timeouts_total";

    pub const RATE_LIMIT_HITS_TOTAL: &str = "skate_rate_limit_hits_total";
}

fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record how long one video took to score.
pub fn record_scoring_duration(backend: &str, duration_secs: f64) {
    let labels = [("backend", backend.to_string())];
    histogram!(names::SCORING_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a stored submission and its score.
pub fn record_submission(trick: &str, score: f64) {
    let labels = [("trick", trick.to_string())];
    counter!(names::SUBMISSIONS_TOTAL, &labels).increment(1);
    histogram!(names::RUN_SCORE, &labels).record(score);
}

/// Record a video where nothing could be scored.
pub fn record_no_detections(trick: &str) {
    let labels = [("trick", trick.to_string())];
    counter!(names::NO_DETECTIONS_TOTAL, &labels).increment(1);
}

/// Record a scoring run that hit the wall-clock budget.
pub fn record_scoring_timeout() {
    counter!(names::SCORING_TIMEOUTS_TOTAL).increment(1);
}

/// Record a request rejected by the rate limiter.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", sanitize_path(endpoint))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Collapse `/user/<name>` to `/user/:username`.
fn sanitize_path(path: &str) -> String {
    USER_PATH.replace(path, "/user/:username").into_owned()
}

/// Decrements the in-flight gauge on drop, so cancelled requests are counted out.
struct InFlight;

impl InFlight {
    fn enter() -> Self {
        gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
        InFlight
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);
    }
}

/// Count and time every request.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().as_str().to_owned();
    let path = request.uri().path().to_owned();
    let _in_flight = InFlight::enter();
    let started = Instant::now();

    let response = next.run(request).await;

    record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    );
    response
}
