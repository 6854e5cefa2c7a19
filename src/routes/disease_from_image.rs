use super::{body::JsonBody, error::ApiError, observe};
use crate::{prediction::ImageDiagnosis, server::SharedState};
use axum::{extract::State, Json};
use tracing::instrument;

pub const ROUTE: &str = "/api/ml/disease-from-image";
const FALLBACK: &str = "Image disease detection failed";

#[instrument(skip(state, request))]
pub async fn detect_disease_from_image(
    State(state): State<SharedState>,
    JsonBody(request): JsonBody,
) -> Result<Json<ImageDiagnosis>, ApiError> {
    tracing::debug!(
        filename = ?request.get("filename"),
        "Diagnosing uploaded image"
    );

    let predictor = state.predictors.image_diagnosis.clone();
    let output = observe(&state, ROUTE, predictor.predict(&request))
        .await
        .map_err(|e| ApiError::from_predictor(e, FALLBACK))?;

    let diagnosis: ImageDiagnosis =
        serde_json::from_value(output).map_err(|e| ApiError::unexpected(FALLBACK, e))?;

    Ok(Json(diagnosis))
}
