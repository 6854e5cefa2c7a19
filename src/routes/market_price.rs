use super::{body::JsonBody, error::ApiError, observe};
use crate::server::SharedState;
use axum::{extract::State, Json};
use serde_json::{Map, Value};
use tracing::instrument;

pub const ROUTE: &str = "/api/ml/market-price";
const FALLBACK: &str = "Market price prediction failed";

/// The price script's fields are not fixed, so any JSON object it prints is
/// returned as is.
#[instrument(skip(state, request))]
pub async fn predict_price(
    State(state): State<SharedState>,
    JsonBody(request): JsonBody,
) -> Result<Json<Map<String, Value>>, ApiError> {
    let predictor = state.predictors.market_price.clone();
    let output = observe(&state, ROUTE, predictor.predict(&request))
        .await
        .map_err(|e| ApiError::from_predictor(e, FALLBACK))?;

    match output {
        Value::Object(prediction) => Ok(Json(prediction)),
        other => Err(ApiError::unexpected(
            FALLBACK,
            anyhow::anyhow!("expected a JSON object, got {}", other),
        )),
    }
}
