use crate::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub transcoder: String,
    pub transcoder_status: String,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "System health status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let transcoder = state.conversion_service.transcoder();
    let (status, transcoder_status) = if transcoder.health_check().await {
        ("ok", "available")
    } else {
        ("degraded", "unavailable")
    };

    Json(HealthResponse {
        status: status.to_string(),
        transcoder: transcoder.name().to_string(),
        transcoder_status: transcoder_status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
