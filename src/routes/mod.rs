mod body;
mod crop_recommendation;
mod disease_detect;
mod disease_from_image;
mod error;
mod health;
mod market_price;
mod metrics;

use crate::{predictor::PredictorError, server::SharedState};
use axum::{
    routing::{get, post},
    Router,
};
use serde_json::Value;
use std::{future::Future, time::Instant};

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/health", get(health::healthcheck))
        .route("/metrics", get(metrics::metrics_handler))
        .route(
            crop_recommendation::ROUTE,
            post(crop_recommendation::recommend_crop),
        )
        .route(disease_detect::ROUTE, post(disease_detect::detect_disease))
        .route(market_price::ROUTE, post(market_price::predict_price))
        .route(
            disease_from_image::ROUTE,
            post(disease_from_image::detect_disease_from_image),
        )
}

/// Awaits a predictor call while recording request, latency and failure
/// metrics for `route`.
async fn observe<F>(
    state: &SharedState,
    route: &'static str,
    prediction: F,
) -> Result<Value, PredictorError>
where
    F: Future<Output = Result<Value, PredictorError>>,
{
    state.metrics.record_request(route);
    let started = Instant::now();

    let result = prediction.await;

    let elapsed_ms = started.elapsed().as_millis() as u64;
    state.metrics.record_prediction_duration(elapsed_ms, route);
    if let Err(e) = &result {
        let kind = if e.is_invocation_failure() {
            "invocation"
        } else {
            "output"
        };
        state.metrics.record_prediction_failure(route, kind);
    }

    result
}
