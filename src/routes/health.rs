use axum::{response::IntoResponse, response::Json};
use serde::{Deserialize, Serialize};

const STATUS: &str = "ML service running";

#[derive(Serialize, Deserialize)]
pub struct Status {
    status: String,
}

pub async fn healthcheck() -> impl IntoResponse {
    Json(Status {
        status: STATUS.into(),
    })
}
