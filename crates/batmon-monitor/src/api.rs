//! HTTP API

use crate::tracker::SharedTracker;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::sync::PoisonError;

/// Build the API router
pub fn router(tracker: SharedTracker) -> Router {
    Router::new()
        .route("/api/battery", get(battery_status))
        .with_state(tracker)
}

/// `GET /api/battery`: latest report, or 503 before the first sample
pub async fn battery_status(State(tracker): State<SharedTracker>) -> Response {
    let report = tracker
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .report();

    match report {
        Some(report) => Json(report).into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "No data yet" })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::RateTracker;
    use std::time::Instant;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_no_data_yet() {
        let tracker = RateTracker::shared(10, 0.05);

        let response = battery_status(State(tracker)).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await, json!({ "error": "No data yet" }));
    }

    #[tokio::test]
    async fn test_report_after_sample() {
        let tracker = RateTracker::shared(10, 0.05);
        tracker.write().unwrap().record(55.556, 3.9876, Instant::now());

        let response = battery_status(State(tracker)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["available"], true);
        assert_eq!(body["percent"], 55.56);
        assert_eq!(body["voltage"], 3.988);
        assert_eq!(body["status"], "idle");
        assert_eq!(body["rate_per_hour"], "still calculating");
        assert_eq!(body["eta_hours"], "still calculating");
    }
}
