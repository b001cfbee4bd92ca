use axum::extract::State;

use crate::api::dto::HealthData;
use crate::api::response::ApiResponse;
use crate::api::AppState;

use super::upload::DEFAULT_OWNER;

/// `GET /health`
///
/// Liveness plus a cheap database round trip. Always returns 200; the
/// `database` field reports the backend state.
pub async fn health(State(state): State<AppState>) -> ApiResponse<HealthData> {
    let database = match state.store.count_notes(DEFAULT_OWNER).await {
        Ok(_) => "ok",
        Err(error) => {
            tracing::warn!(error = %error, "health check database probe failed");
            "unavailable"
        }
    };

    ApiResponse::success(HealthData {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        database,
        llm_model: state.generator.as_ref().map(|g| g.model().to_string()),
    })
}
