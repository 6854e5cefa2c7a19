use super::{body::JsonBody, error::ApiError, observe};
use crate::{prediction::CropRecommendation, server::SharedState};
use axum::{extract::State, Json};
use tracing::instrument;

pub const ROUTE: &str = "/api/ml/crop-recommendation";
const FALLBACK: &str = "Crop prediction failed";

/// Forwards the whole body to the crop script and returns the four
/// recommendation fields it printed.
#[instrument(skip(state, request))]
pub async fn recommend_crop(
    State(state): State<SharedState>,
    JsonBody(request): JsonBody,
) -> Result<Json<CropRecommendation>, ApiError> {
    let predictor = state.predictors.crop_recommendation.clone();
    let output = observe(&state, ROUTE, predictor.predict(&request))
        .await
        .map_err(|e| ApiError::from_predictor(e, FALLBACK))?;

    let recommendation: CropRecommendation =
        serde_json::from_value(output).map_err(|e| ApiError::unexpected(FALLBACK, e))?;

    tracing::debug!(
        "Recommended {} with confidence {}",
        recommendation.crop,
        recommendation.confidence
    );

    Ok(Json(recommendation))
}
