//! HTTP routes for the execution service.

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use executor::{ExecError, ExecutionRequest, ExecutionResult, Orchestrator, check_recipe};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

/// Application state shared across handlers.
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    /// Toolchain availability is resolved once here; `/languages` serves
    /// this list without searching `PATH` per request.
    pub languages: Vec<LanguageInfo>,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        let languages = orchestrator
            .registry()
            .recipes()
            .map(|recipe| {
                let status = check_recipe(recipe);
                LanguageInfo {
                    id: recipe.id,
                    name: recipe.name,
                    extension: recipe.extension,
                    compiled: recipe.is_compiled(),
                    aliases: recipe.aliases,
                    available: status.is_available(),
                    missing: status.missing,
                }
            })
            .collect();
        Self {
            orchestrator,
            languages,
        }
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/execute", post(execute_handler))
        .route("/health", get(health_handler))
        .route("/languages", get(languages_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct ExecuteBody {
    pub code: String,
    pub language: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    pub output: String,
    pub status: &'static str,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    pub duration_ms: u64,
}

impl From<&ExecutionResult> for ExecuteResponse {
    fn from(result: &ExecutionResult) -> Self {
        Self {
            output: result.output(),
            status: result.outcome.as_str(),
            exit_code: result.exit_code,
            timed_out: result.timed_out(),
            duration_ms: result.duration_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LanguageInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub extension: &'static str,
    pub compiled: bool,
    pub aliases: &'static [&'static str],
    pub available: bool,
    /// Programs not found on `PATH` at startup.
    #[serde(skip)]
    pub missing: Vec<&'static str>,
}

fn failure(status: StatusCode, output: &str) -> Response {
    (status, Json(serde_json::json!({ "output": output }))).into_response()
}

/// Map the errors that stop a request before anything runs.
fn error_response(err: &ExecError) -> Response {
    match err {
        ExecError::UnsupportedLanguage(_) => {
            failure(StatusCode::BAD_REQUEST, "Unsupported language")
        }
        ExecError::WorkspaceWrite { .. } => {
            failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to write file")
        }
        _ => failure(StatusCode::INTERNAL_SERVER_ERROR, "Internal error"),
    }
}

/// Run one submission.
///
/// The pipeline runs on its own task so a client that disconnects does not
/// cancel it halfway: it still finishes and cleans its workspace.
async fn execute_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ExecuteBody>,
) -> Response {
    let request = ExecutionRequest::new(body.code, body.language);
    let orchestrator = Arc::clone(&state.orchestrator);
    let task = tokio::spawn(async move { orchestrator.execute(&request).await });

    match task.await {
        Ok(Ok(result)) => Json(ExecuteResponse::from(&result)).into_response(),
        Ok(Err(e)) => {
            if !matches!(e, ExecError::UnsupportedLanguage(_)) {
                error!(error = %e, "execution failed");
            }
            error_response(&e)
        }
        Err(e) => {
            error!(error = %e, "execution task failed");
            failure(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn languages_handler(State(state): State<Arc<AppState>>) -> Json<Vec<LanguageInfo>> {
    Json(state.languages.clone())
}
