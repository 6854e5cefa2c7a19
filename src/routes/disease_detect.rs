use super::{body::JsonBody, error::ApiError, observe};
use crate::{prediction::DiseaseDiagnosis, server::SharedState};
use axum::{extract::State, Json};
use tracing::instrument;

pub const ROUTE: &str = "/api/ml/disease-detect";
const FALLBACK: &str = "Disease prediction failed";

#[instrument(skip(state, request))]
pub async fn detect_disease(
    State(state): State<SharedState>,
    JsonBody(request): JsonBody,
) -> Result<Json<DiseaseDiagnosis>, ApiError> {
    let predictor = state.predictors.disease_detection.clone();
    let output = observe(&state, ROUTE, predictor.predict(&request))
        .await
        .map_err(|e| ApiError::from_predictor(e, FALLBACK))?;

    let diagnosis: DiseaseDiagnosis =
        serde_json::from_value(output).map_err(|e| ApiError::unexpected(FALLBACK, e))?;

    Ok(Json(diagnosis))
}
