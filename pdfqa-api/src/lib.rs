pub mod config;
pub mod error;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartRejection},
    response::{Html, Json},
    routing::{get, post},
};
use pdfqa_common::Pipelines;
use pdfqa_docs::{DocumentQa, DocumentRepository};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;

pub use config::ServerConfig;
pub use error::ApiError;

const INDEX_HTML: &str = include_str!("../static/index.html");

#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<DocumentRepository>,
    pub pipelines: Pipelines,
}

impl AppState {
    pub fn new(repository: DocumentRepository, pipelines: Pipelines) -> Self {
        Self {
            repository: Arc::new(repository),
            pipelines,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub summary: String,
    pub pdf_path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub pdf_path: String,
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub answer: String,
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route(
            "/upload",
            post(upload).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/answer", post(answer))
        .with_state(state)
}

/// リスナーをバインドし、Ctrl-C まで待ち受ける
pub async fn serve(config: ServerConfig) -> Result<()> {
    let repository = DocumentRepository::new(&config.upload_dir)?;
    let pipelines = Pipelines::bert(config.summary_length, config.device);
    let app = router(AppState::new(repository, pipelines), config.max_upload_bytes);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, device = %config.device, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

// GET /
async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

// POST /upload
async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    // multipart でないリクエストは file フィールドなしと同じ扱い
    let Ok(mut multipart) = multipart else {
        return Err(ApiError::NoFilePart);
    };

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        // filename のないパートはファイルではなくフォーム値
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field.bytes().await?;
        upload = Some((file_name, bytes));
        break;
    }

    let (file_name, bytes) = upload.ok_or(ApiError::NoFilePart)?;
    if file_name.is_empty() {
        return Err(ApiError::NoSelectedFile);
    }

    let stored = state.repository.save(&file_name, &bytes)?;
    tracing::info!(pdf_path = %stored.key, bytes = bytes.len(), "upload stored");

    let pipelines = state.pipelines.clone();
    let path = stored.path.clone();
    let summary = run_blocking(move || DocumentQa::open(&path, pipelines)?.summary()).await?;

    Ok(Json(UploadResponse {
        summary,
        pdf_path: stored.key.to_string(),
    }))
}

// POST /answer
async fn answer(
    State(state): State<AppState>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, ApiError> {
    let stored = state.repository.resolve(&request.pdf_path)?;
    tracing::info!(pdf_path = %stored.key, "answering question");

    let pipelines = state.pipelines.clone();
    let question = request.question;
    let answer =
        run_blocking(move || DocumentQa::open(&stored.path, pipelines)?.answer(&question)).await?;

    Ok(Json(AnswerResponse {
        answer: answer.text,
    }))
}

/// PDF 解析とモデル推論はブロッキング処理なので専用スレッドで実行する
async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::task::spawn_blocking(work)
        .await
        .context("Blocking task failed")?;
    Ok(result?)
}
