//! HTTP router construction.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api;
use crate::state::AppState;

/// Build the application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route(
            "/v1/algos/skyline/{algo}",
            get(api::skyline_get).post(api::skyline_post),
        )
        .route(
            "/v1/algos/outliers/tukey",
            get(api::tukey_get).post(api::tukey_post),
        )
        .route("/v1/backends", get(api::list_backends))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::util::ServiceExt;

    use vigil_backend::Registry;

    fn app() -> Router {
        let registry = Registry::with_defaults(reqwest::Client::new());
        build_router(Arc::new(AppState::new(registry)))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(path: &str, payload: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn backends_endpoint_lists_registered_adapters() {
        let response = app()
            .oneshot(Request::get("/v1/backends").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let mut names: Vec<String> =
            serde_json::from_value(body_json(response).await).unwrap();
        names.sort();
        assert_eq!(names, vec!["graphite", "influxdb"]);
    }

    #[tokio::test]
    async fn inline_mad_blind_spot_series_returns_false() {
        let request = post_json(
            "/v1/algos/skyline/medianabsolutedeviation",
            "[[1,10],[2,10],[3,10],[4,10],[5,100]]",
        );
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!(false));
    }

    #[tokio::test]
    async fn inline_mad_flags_spike_with_noisy_baseline() {
        let request = post_json(
            "/v1/algos/skyline/medianabsolutedeviation",
            "[[1,10],[2,12],[3,8],[4,11],[5,9],[6,10],[7,13],[8,9],[9,40]]",
        );
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(body_json(response).await, serde_json::json!(true));
    }

    #[tokio::test]
    async fn inline_msgpack_body_is_accepted() {
        let records = vec![vec![1.0, 10.0], vec![2.0, 10.0], vec![3.0, 10.0]];
        let request = Request::builder()
            .method("POST")
            .uri("/v1/algos/skyline/medianabsolutedeviation")
            .header("content-type", "application/msgpack")
            .body(Body::from(rmp_serde::to_vec(&records).unwrap()))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!(false));
    }

    #[tokio::test]
    async fn index_overrides_apply_to_inline_bodies() {
        // Value column first, graphite-style, flagged via vidx=0/tidx=1.
        let request = post_json(
            "/v1/algos/skyline/meansubtractioncumulation?tidx=1&vidx=0",
            "[[10,1],[12,2],[8,3],[11,4],[9,5],[30,6]]",
        );
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(body_json(response).await, serde_json::json!(true));
    }

    #[tokio::test]
    async fn tukey_returns_outlying_records() {
        let request = post_json(
            "/v1/algos/outliers/tukey",
            "[[1,10],[2,11],[3,9],[4,10.5],[5,9.5],[6,10],[7,11.5],[8,8.5],[9,55]]",
        );
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!([[9.0, 55.0]])
        );
    }

    #[tokio::test]
    async fn get_without_backend_parameter_is_a_bad_request() {
        let response = app()
            .oneshot(
                Request::get("/v1/algos/skyline/grubbs")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_backend_name_is_a_bad_request() {
        let response = app()
            .oneshot(
                Request::get("/v1/algos/skyline/grubbs?backend=prometheus")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_algorithm_is_not_found() {
        let request = post_json("/v1/algos/skyline/holtwinters", "[[1,10]]");
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn non_sequence_payload_is_a_bad_request() {
        let request = post_json("/v1/algos/skyline/grubbs", r#"{"series":[]}"#);
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("malformed payload"));
    }

    #[tokio::test]
    async fn unparseable_tunable_is_a_bad_request() {
        let request = post_json(
            "/v1/algos/skyline/medianabsolutedeviation?deviation_threshold=abc",
            "[[1,10],[2,10]]",
        );
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn histogram_bins_reports_bin_membership() {
        // 30 points at 100 with a rare minimum at the tail.
        let mut rows: Vec<String> = (1..=30).map(|i| format!("[{},100]", i)).collect();
        rows.extend([31, 32, 33].map(|i| format!("[{},0]", i)));
        let payload = format!("[{}]", rows.join(","));
        let request = post_json("/v1/algos/skyline/histogrambins", &payload);
        let response = app().oneshot(request).await.unwrap();
        let body = body_json(response).await;
        assert_eq!(body["anomalous"], serde_json::json!(true));
        assert_eq!(body["bin"], serde_json::json!(0));
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }
}
