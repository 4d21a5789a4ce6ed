use std::path::PathBuf;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::spawn;
use tracing::{error, info};

use crate::{
    app_state::{lock, AppState, Status},
    errors::{ResearchError, StoreError},
    ingest,
    models::{IntentAnalysis, Metadata, ResearchDepth, ResearchRecord},
};

type ApiError = (StatusCode, Json<serde_json::Value>);

// --- Payloads y Respuestas de la API ---

#[derive(Deserialize)]
pub struct ResearchPayload {
    question: String,
    depth: Option<ResearchDepth>,
}

#[derive(Serialize)]
pub struct ResearchResponse {
    #[serde(flatten)]
    record: ResearchRecord,
    intent_analysis: IntentAnalysis,
}

#[derive(Deserialize)]
pub struct DocumentsPayload {
    texts: Vec<String>,
    metadatas: Option<Vec<Metadata>>,
    ids: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct IngestPayload {
    paths: Vec<PathBuf>,
}

// --- Router ---

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/research", post(research_handler))
        .route("/api/history", get(history_handler).delete(clear_history_handler))
        .route("/api/history/export", get(export_handler))
        .route("/api/stats", get(stats_handler))
        .route("/api/documents", post(add_documents_handler))
        .route("/api/ingest", post(ingest_handler))
        .route("/api/status", get(status_handler))
        .route("/api/shutdown", post(shutdown_handler))
        .with_state(app_state)
}

fn store_error(e: StoreError) -> ApiError {
    error!("Error en la base de conocimiento: {e}");
    let status = match e {
        StoreError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({"error": e.to_string()})))
}

// --- Handlers ---

#[axum::debug_handler]
async fn research_handler(
    State(state): State<AppState>,
    Json(payload): Json<ResearchPayload>,
) -> Result<Json<ResearchResponse>, ApiError> {
    let result = match payload.depth {
        Some(depth) => state.agent.process_query_with_depth(&payload.question, depth).await,
        None => state.agent.process_query(&payload.question).await,
    };
    let response = result.map_err(|e| match e {
        ResearchError::EmptyQuestion => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Please enter a research question."})),
        ),
        other => {
            error!("Error de investigación: {other}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": format!("Research failed: {other}")})),
            )
        }
    })?;

    // Sólo las investigaciones completadas entran en el historial.
    let depth = payload.depth.unwrap_or_default();
    let record = lock(&state.history).record(payload.question.trim(), &response, depth);
    Ok(Json(ResearchResponse {
        record,
        intent_analysis: response.intent_analysis,
    }))
}

#[axum::debug_handler]
async fn history_handler(State(state): State<AppState>) -> Json<Vec<ResearchRecord>> {
    Json(lock(&state.history).records().to_vec())
}

#[axum::debug_handler]
async fn clear_history_handler(State(state): State<AppState>) -> impl IntoResponse {
    lock(&state.history).clear();
    (StatusCode::OK, Json(json!({ "message": "Conversation cleared." })))
}

#[axum::debug_handler]
async fn export_handler(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let info = state.agent.agent_info().await.map_err(store_error)?;
    Ok(Json(lock(&state.history).export(&info)))
}

#[axum::debug_handler]
async fn stats_handler(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let info = state.agent.agent_info().await.map_err(store_error)?;
    let history = lock(&state.history);
    let stats = history.stats();
    Ok(Json(json!({
        "research_count": history.research_count(),
        "total": stats.total,
        "web": stats.web,
        "internal": stats.internal,
        "llm_model": state.config.llm_chat_model,
        "agent": info,
    })))
}

#[axum::debug_handler]
async fn add_documents_handler(
    State(state): State<AppState>,
    Json(payload): Json<DocumentsPayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let ids = state
        .agent
        .store()
        .add_documents(
            &payload.texts,
            payload.metadatas.as_deref(),
            payload.ids.as_deref(),
        )
        .await
        .map_err(store_error)?;
    info!("Añadidos {} documentos a la base de conocimiento.", ids.len());
    Ok(Json(json!({ "ids": ids })))
}

#[axum::debug_handler]
async fn ingest_handler(
    State(state): State<AppState>,
    Json(payload): Json<IngestPayload>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.paths.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Debe indicar al menos una ruta."})),
        ));
    }
    {
        let mut status = lock(&state.status);
        if status.is_busy {
            return Err((
                StatusCode::CONFLICT,
                Json(json!({"error": "Ya hay una ingesta en curso."})),
            ));
        }
        status.is_busy = true;
        status.message = "Iniciando ingesta...".to_string();
        status.progress = 0.0;
    }

    spawn(async move {
        let store = state.agent.store();
        let summary = ingest::ingest_paths(store.as_ref(), &payload.paths, state.status.clone()).await;

        let mut status = lock(&state.status);
        status.is_busy = false;
        status.progress = 0.0;
        status.message = format!("¡Ingesta completada! {}", summary);
        info!("{summary}");
    });

    Ok(StatusCode::ACCEPTED)
}

#[axum::debug_handler]
async fn status_handler(State(state): State<AppState>) -> Json<Status> {
    Json(lock(&state.status).clone())
}

// --- Handler de Apagado ---

#[axum::debug_handler]
async fn shutdown_handler(State(state): State<AppState>) -> impl IntoResponse {
    info!("Petición de apagado recibida.");
    if let Some(sender) = lock(&state.shutdown_sender).take() {
        let _ = sender.send(());
    }
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tokio::sync::oneshot;
    use tower::ServiceExt;

    use super::*;
    use crate::agent::tests::UnavailableStore;
    use crate::agent::ContextualAgent;
    use crate::config::AppConfig;
    use crate::embeddings::HashEmbedder;
    use crate::llm::LlmManager;
    use crate::sample_data::seed_sample_data;
    use crate::vector_store::InMemoryKnowledgeStore;
    use crate::web_search::MockSearch;

    async fn test_state() -> (AppState, oneshot::Receiver<()>) {
        let config = AppConfig::from_lookup(|name| match name {
            "KNOWLEDGE_STORE" => Some("memory".to_string()),
            _ => None,
        })
        .unwrap();
        let store = InMemoryKnowledgeStore::new(Arc::new(HashEmbedder::default()));
        seed_sample_data(&store).await.unwrap();
        let agent = ContextualAgent::new(Arc::new(MockSearch), Arc::new(store), LlmManager::offline());
        let (tx, rx) = oneshot::channel();
        (AppState::new(config, agent, tx), rx)
    }

    async fn call(app: Router, method: &str, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(v) => Body::from(v.to_string()),
                None => Body::empty(),
            })
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn research_records_history_and_stats() {
        let (state, _rx) = test_state().await;
        let app = create_router(state.clone());

        let (status, body) = call(
            app.clone(),
            "POST",
            "/api/research",
            Some(json!({"question": "Latest AI regulations and our compliance", "depth": "Quick"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["research_id"], "res_0001");
        assert_eq!(body["depth"], "Quick");
        assert_eq!(body["sources"], json!({"web": true, "internal": true}));
        assert!(body["intent_analysis"]["needs_web"].as_bool().unwrap());
        assert!(body["answer"].as_str().unwrap().contains("Comprehensive Research Report"));

        let (_, history) = call(app.clone(), "GET", "/api/history", None).await;
        assert_eq!(history.as_array().unwrap().len(), 1);

        let (_, stats) = call(app.clone(), "GET", "/api/stats", None).await;
        assert_eq!(stats["total"], 1);
        assert_eq!(stats["internal"], 1);
        assert_eq!(stats["agent"]["knowledge_base_docs"], 25);
        assert_eq!(stats["llm_model"], "gemini-2.0-flash");

        let (status, _) = call(app.clone(), "DELETE", "/api/history", None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, export) = call(app, "GET", "/api/history/export", None).await;
        assert!(export["conversations"].as_array().unwrap().is_empty());
        assert_eq!(export["system_status"]["search_capability"], "Mock Data");
    }

    #[tokio::test]
    async fn empty_question_is_bad_request_and_not_recorded() {
        let (state, _rx) = test_state().await;
        let app = create_router(state.clone());

        let (status, body) = call(app, "POST", "/api/research", Some(json!({"question": "  "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
        assert!(lock(&state.history).records().is_empty());
    }

    #[tokio::test]
    async fn store_failure_is_500_and_history_untouched() {
        let (mut state, _rx) = test_state().await;
        state.agent = Arc::new(ContextualAgent::new(
            Arc::new(MockSearch),
            Arc::new(UnavailableStore),
            LlmManager::offline(),
        ));
        let app = create_router(state.clone());

        let (status, body) = call(
            app,
            "POST",
            "/api/research",
            Some(json!({"question": "Status of our internal projects"})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().starts_with("Research failed:"));
        assert!(lock(&state.history).records().is_empty());
        assert_eq!(lock(&state.history).research_count(), 0);
    }

    #[tokio::test]
    async fn documents_endpoint_adds_and_validates() {
        let (state, _rx) = test_state().await;
        let app = create_router(state.clone());

        let (status, body) = call(
            app.clone(),
            "POST",
            "/api/documents",
            Some(json!({"texts": ["Project Nova: hydrogen storage pilot."], "ids": ["nova_1"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ids"], json!(["nova_1"]));
        assert_eq!(state.agent.store().count().await.unwrap(), 26);

        let (status, _) = call(
            app,
            "POST",
            "/api/documents",
            Some(json!({"texts": ["a", "b"], "ids": ["only_one"]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn ingest_is_rejected_while_another_runs() {
        let (state, _rx) = test_state().await;
        lock(&state.status).is_busy = true;

        let (status, body) = call(
            create_router(state.clone()),
            "POST",
            "/api/ingest",
            Some(json!({"paths": ["/tmp"]})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].is_string());
        assert!(lock(&state.status).is_busy);
    }

    #[tokio::test]
    async fn ingest_runs_in_background_and_releases_the_flag() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("memo.txt"), "Hydrogen pilot budget approved.").unwrap();
        let (state, _rx) = test_state().await;

        let (status, _) = call(
            create_router(state.clone()),
            "POST",
            "/api/ingest",
            Some(json!({"paths": [dir.path()]})),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);

        for _ in 0..200 {
            if !lock(&state.status).is_busy {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(!lock(&state.status).is_busy);
        assert_eq!(state.agent.store().count().await.unwrap(), 26);
    }

    #[tokio::test]
    async fn shutdown_fires_the_channel() {
        let (state, rx) = test_state().await;
        let (status, _) = call(create_router(state), "POST", "/api/shutdown", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(rx.await.is_ok());
    }
}
