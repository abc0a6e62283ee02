use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "status": "El motor de SÍNTESIS de contexto PDOT está en línea."
    }))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let Some(engine) = state.engine() else {
        return Ok(Json(json!({
            "status": "starting",
            "initialized": false,
            "entities": {}
        })));
    };

    let entities = engine.indexed_entities().await?;
    Ok(Json(json!({
        "status": "ok",
        "initialized": true,
        "started_at": state.started_at.to_rfc3339(),
        "entities": entities
    })))
}
