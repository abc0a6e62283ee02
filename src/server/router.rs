use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::handlers::{context, health};
use crate::state::AppState;

/// Creates the application router.
///
/// - `GET /` static status payload
/// - `GET /health` readiness and indexed entities
/// - `POST /extraer-contexto-pdot` entity-scoped question answering
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = build_cors_layer(&state);
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/extraer-contexto-pdot", post(context::extract_context))
        .with_state(state)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer(state: &Arc<AppState>) -> CorsLayer {
    let allowed_origins = resolve_allowed_origins(&state.settings.server.cors_allowed_origins)
        .into_iter()
        .filter_map(|origin| HeaderValue::from_str(&origin).ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
}

fn resolve_allowed_origins(configured: &[String]) -> Vec<String> {
    let origins = configured
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(|item| item.to_string())
        .collect::<Vec<_>>();

    if origins.is_empty() {
        return default_local_origins();
    }

    origins
}

fn default_local_origins() -> Vec<String> {
    vec![
        "http://localhost".to_string(),
        "http://localhost:8000".to_string(),
        "http://127.0.0.1".to_string(),
        "http://127.0.0.1:8000".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::defaults::default_config;
    use crate::core::config::Settings;
    use crate::rag::context_builder::no_context_message;
    use crate::rag::engine::testing::{letter_vector, LetterEmbeddings, RecordingGenerator};
    use crate::rag::{ContextEngine, SqliteVectorStore, StoredChunk, VectorStore};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct Harness {
        _tmp: tempfile::TempDir,
        app: Router,
        generator: Arc<RecordingGenerator>,
    }

    async fn harness_with(generator: RecordingGenerator) -> Harness {
        let tmp = tempfile::tempdir().unwrap();
        let store = SqliteVectorStore::create_fresh(&tmp.path().join("db_pdot"))
            .await
            .unwrap();
        let content = "La cobertura de agua potable en Paltas es del 80%";
        store
            .insert_batch(vec![(
                StoredChunk {
                    chunk_id: "p1".to_string(),
                    content: content.to_string(),
                    entity: "paltas".to_string(),
                    source_file: "PDOT_Paltas.pdf".to_string(),
                    page: 12,
                    chunk_index: 0,
                    metadata: None,
                },
                letter_vector(content),
            )])
            .await
            .unwrap();

        let generator = Arc::new(generator);
        let engine = ContextEngine::new(
            Arc::new(store),
            Arc::new(LetterEmbeddings::default()),
            generator.clone(),
        );
        let app = router(Arc::new(test_state(Some(engine))));
        Harness {
            _tmp: tmp,
            app,
            generator,
        }
    }

    fn test_state(engine: Option<ContextEngine>) -> AppState {
        let settings = Settings::from_value(default_config()).unwrap();
        AppState::with_engine(settings, engine)
    }

    fn post_json(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/extraer-contexto-pdot")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn root_reports_status() {
        let app = router(Arc::new(test_state(None)));
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert!(body["status"].as_str().unwrap().contains("PDOT"));
    }

    #[tokio::test]
    async fn uninitialized_service_returns_503() {
        let app = router(Arc::new(test_state(None)));
        let response = app
            .oneshot(post_json(json!({"pregunta": "¿agua?", "entidad": "paltas"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn empty_entity_returns_400() {
        let harness = harness_with(RecordingGenerator::default()).await;
        for entidad in ["", "   "] {
            let response = harness
                .app
                .clone()
                .oneshot(post_json(json!({"pregunta": "¿agua?", "entidad": entidad})))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
        assert_eq!(harness.generator.prompt_count(), 0);
    }

    #[tokio::test]
    async fn unknown_entity_gets_fixed_message() {
        let harness = harness_with(RecordingGenerator::default()).await;
        let response = harness
            .app
            .clone()
            .oneshot(post_json(json!({"pregunta": "¿agua?", "entidad": "Pindal"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["contexto"], no_context_message("pindal"));
        assert_eq!(harness.generator.prompt_count(), 0);
    }

    #[tokio::test]
    async fn known_entity_is_answered_from_its_chunks() {
        let harness = harness_with(RecordingGenerator::default()).await;
        let response = harness
            .app
            .clone()
            .oneshot(post_json(json!({"pregunta": "¿Cobertura de agua?", "entidad": " PALTAS "})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["contexto"], "respuesta sintetizada");

        let prompt = harness.generator.last_prompt().unwrap();
        assert!(prompt.contains("agua potable en Paltas es del 80%"));
        assert!(prompt.contains("¿Cobertura de agua?"));
    }

    #[tokio::test]
    async fn failures_return_500_without_internal_details() {
        let harness = harness_with(RecordingGenerator::failing()).await;
        let response = harness
            .app
            .clone()
            .oneshot(post_json(json!({"pregunta": "¿agua?", "entidad": "paltas"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = read_json(response).await;
        let detail = body["detail"].as_str().unwrap();
        assert!(!detail.contains("sk-live"));
        assert!(!detail.contains("quota"));
    }

    #[tokio::test]
    async fn health_lists_indexed_entities() {
        let harness = harness_with(RecordingGenerator::default()).await;
        let response = harness
            .app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["initialized"], true);
        assert_eq!(body["entities"]["paltas"], 1);
    }

    #[tokio::test]
    async fn health_before_initialization() {
        let app = router(Arc::new(test_state(None)));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = read_json(response).await;
        assert_eq!(body["initialized"], false);
    }

    #[test]
    fn configured_origins_replace_local_defaults() {
        assert_eq!(
            resolve_allowed_origins(&[" https://example.org ".to_string(), "".to_string()]),
            vec!["https://example.org".to_string()]
        );
        assert_eq!(resolve_allowed_origins(&[]), default_local_origins());
    }
}
