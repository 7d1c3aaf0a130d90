//! HTTP API server for integration with other systems.
//!
//! Exposes the analysis pipeline as a single JSON endpoint.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::SiftError;
use crate::fact_check::Verdict;
use crate::orchestrator::{Orchestrator, Request, SourceInfo};
use crate::report::render_markdown;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
}

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(&settings, Operation::Serve) {
        Output::error(&format!("{}", e));
        Output::info("Run 'sift doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);

    let orchestrator = Orchestrator::new(settings)?;
    let fact_check_available = orchestrator.can_fact_check();
    let app = router(orchestrator);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Sift API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Analyze", "POST /analyze");
    if !fact_check_available {
        Output::warning("Search API key not set; fact-check requests will be rejected.");
    }
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(orchestrator: Orchestrator) -> Router {
    let state = Arc::new(AppState { orchestrator });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/analyze", post(analyze))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct AnalyzeRequest {
    url: String,
    #[serde(default)]
    fact_check: bool,
}

#[derive(Serialize)]
struct AnalyzeResponse {
    source: SourceInfo,
    summary: Vec<String>,
    verdicts: Vec<Verdict>,
    /// Markdown rendering of the result.
    report: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// HTTP status for a failed analysis.
fn status_for(error: &SiftError) -> StatusCode {
    match error {
        SiftError::InvalidInput(_) | SiftError::UnsupportedSource(_) => StatusCode::BAD_REQUEST,
        SiftError::TranscriptUnavailable(_) | SiftError::Fetch(_) | SiftError::Summarization(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        SiftError::SearchProvider(_) | SiftError::Llm(_) | SiftError::Http(_) => StatusCode::BAD_GATEWAY,
        SiftError::Config(_) | SiftError::ToolNotFound(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: SiftError) -> axum::response::Response {
    warn!("Analysis failed: {}", error);
    (
        status_for(&error),
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> impl IntoResponse {
    let request = match Request::new(&req.url, req.fact_check) {
        Ok(request) => request,
        Err(e) => return error_response(e),
    };

    match state.orchestrator.handle(&request).await {
        Ok(response) => {
            let report = render_markdown(&response);
            Json(AnalyzeResponse {
                source: response.source,
                summary: response.summary,
                verdicts: response.verdicts,
                report,
            })
            .into_response()
        }
        Err(e) => error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content_source::{ContentKind, ContentSource, RetrievedContent};
    use crate::llm::ScriptedModel;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct FixedPage;

    #[async_trait]
    impl ContentSource for FixedPage {
        fn kind(&self) -> ContentKind {
            ContentKind::WebPage
        }

        fn can_handle(&self, input: &str) -> bool {
            input.starts_with("https://")
        }

        async fn fetch(&self, input: &str) -> crate::error::Result<RetrievedContent> {
            if input.contains("missing") {
                return Err(SiftError::Fetch("HTTP 404".to_string()));
            }
            Ok(RetrievedContent {
                kind: ContentKind::WebPage,
                url: input.to_string(),
                title: Some("Fixed".to_string()),
                text: "Body".to_string(),
                metadata: Vec::new(),
                truncated: false,
            })
        }
    }

    async fn spawn(model: ScriptedModel) -> String {
        let orchestrator = Orchestrator::with_components(
            Settings::default(),
            vec![Arc::new(FixedPage)],
            Arc::new(model),
            None,
        )
        .unwrap();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(orchestrator)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&SiftError::InvalidInput("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&SiftError::UnsupportedSource("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&SiftError::Fetch("x".into())), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status_for(&SiftError::Summarization("x".into())), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status_for(&SiftError::Llm("x".into())), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_health() {
        let base = spawn(ScriptedModel::new()).await;
        let body: Value = reqwest::get(format!("{}/health", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_analyze_success() {
        let base = spawn(ScriptedModel::new().reply("- A\n- B\n- C")).await;
        let response = reqwest::Client::new()
            .post(format!("{}/analyze", base))
            .json(&json!({"url": "https://example.com/post"}))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["summary"], json!(["A", "B", "C"]));
        assert_eq!(body["verdicts"], json!([]));
        assert_eq!(body["source"]["kind"], "webpage");
        assert!(body["report"].as_str().unwrap().starts_with("## Summary"));
    }

    #[tokio::test]
    async fn test_analyze_errors() {
        let base = spawn(ScriptedModel::new()).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{}/analyze", base))
            .json(&json!({"url": "   "}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

        let response = client
            .post(format!("{}/analyze", base))
            .json(&json!({"url": "https://example.com/missing"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("HTTP 404"));
    }
}
