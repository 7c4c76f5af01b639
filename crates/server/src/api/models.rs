use crate::auth::Authorized;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use docchat_llm::{list_models, ModelInfo};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
}

/// GET /api/models: models whose provider credential is configured.
pub async fn models(_auth: Authorized, State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: list_models(&state.credentials),
    })
}
