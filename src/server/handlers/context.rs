use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;
use crate::rag::normalize_label;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ContextRequest {
    pub pregunta: String,
    /// Entity label sent by the client, e.g. "paltas".
    pub entidad: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContextResponse {
    pub contexto: String,
}

pub async fn extract_context(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ContextRequest>,
) -> Result<Json<ContextResponse>, ApiError> {
    let entity = normalize_label(&request.entidad);
    tracing::info!(
        "Context request: entity='{}', question='{}'",
        entity,
        request.pregunta
    );

    let engine = state.engine().ok_or(ApiError::ServiceUnavailable)?;

    if entity.is_empty() {
        return Err(ApiError::BadRequest(
            "Error: El campo 'entidad' no puede estar vacío.".to_string(),
        ));
    }

    let contexto = engine.extract_context(&request.pregunta, &entity).await?;
    Ok(Json(ContextResponse { contexto }))
}
