//! HTTP API server for integration with other systems.
//!
//! Provides REST endpoints for processing videos, listing them, fetching
//! per-video metrics, and asking questions.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::TubelensError;
use crate::pipeline::Pipeline;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Shared application state.
struct AppState {
    pipeline: Pipeline,
}

/// Run the HTTP API server.
pub async fn run_serve(
    host: Option<&str>,
    port: Option<u16>,
    settings: Settings,
) -> anyhow::Result<()> {
    let host = host.unwrap_or(&settings.server.host).to_string();
    let port = port.unwrap_or(settings.server.port);

    let pipeline = Pipeline::new(settings)?;
    let state = Arc::new(AppState { pipeline });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router(state).layer(cors);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Tubelens API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Process Video", "POST /videos");
    Output::kv("List Videos", "GET  /videos");
    Output::kv("Video Metrics", "GET  /videos/:video_id/metrics");
    Output::kv("Chat (RAG)", "POST /videos/:video_id/chat");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/videos", post(process_video).get(list_videos))
        .route("/videos/{video_id}/metrics", get(video_metrics))
        .route("/videos/{video_id}/chat", post(chat))
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct ProcessRequest {
    /// YouTube URL or bare video ID
    locator: String,
}

#[derive(Serialize)]
struct ProcessResponse {
    video_id: String,
    youtube_id: String,
    title: Option<String>,
    chunks_indexed: usize,
    summary: String,
    sentiment: SentimentInfo,
}

#[derive(Serialize)]
struct SentimentInfo {
    label: String,
    score: f32,
}

#[derive(Serialize)]
struct VideoListResponse {
    videos: Vec<VideoInfo>,
    total: usize,
}

#[derive(Serialize)]
struct VideoInfo {
    video_id: String,
    youtube_id: String,
    title: Option<String>,
    uploader: Option<String>,
    duration_seconds: Option<u64>,
    view_count: Option<u64>,
}

#[derive(Serialize)]
struct MetricsResponse {
    video_id: String,
    title: Option<String>,
    uploader: Option<String>,
    duration_seconds: Option<u64>,
    view_count: Option<u64>,
    like_count: Option<u64>,
    transcript_word_count: usize,
    transcript_char_count: usize,
    chunk_count: usize,
    summary: String,
    sentiment: SentimentInfo,
    sentiment_breakdown: SentimentBreakdown,
}

/// Per-class scores for the dashboard chart: the confidence lands under the
/// class matching the label, the other classes read 0.0.
#[derive(Serialize)]
struct SentimentBreakdown {
    positive: f32,
    neutral: f32,
    negative: f32,
}

impl SentimentBreakdown {
    fn from_label(label: &str, score: f32) -> Self {
        let label = label.to_uppercase();
        Self {
            positive: if label == "POSITIVE" { score } else { 0.0 },
            neutral: if label == "NEUTRAL" { score } else { 0.0 },
            negative: if label == "NEGATIVE" { score } else { 0.0 },
        }
    }
}

#[derive(Deserialize)]
struct ChatRequest {
    question: String,
    top_k: Option<usize>,
}

#[derive(Serialize)]
struct ChatResponse {
    answer: String,
    sources: Vec<SourceInfo>,
}

#[derive(Serialize)]
struct SourceInfo {
    score: f32,
    content: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Map a pipeline error to an HTTP status code.
fn error_status(err: &TubelensError) -> StatusCode {
    match err {
        TubelensError::InvalidLocator(_)
        | TubelensError::EmptyQuestion
        | TubelensError::EmptyTranscript(_)
        | TubelensError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        TubelensError::VideoNotFound(_) | TubelensError::IndexNotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: TubelensError) -> axum::response::Response {
    (
        error_status(&err),
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn process_video(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProcessRequest>,
) -> impl IntoResponse {
    match state.pipeline.process_video(&req.locator).await {
        Ok(outcome) => Json(ProcessResponse {
            video_id: outcome.video_id,
            youtube_id: outcome.youtube_id,
            title: outcome.title,
            chunks_indexed: outcome.chunks_indexed,
            summary: outcome.summary,
            sentiment: SentimentInfo {
                label: outcome.sentiment.label,
                score: outcome.sentiment.score,
            },
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn list_videos(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.pipeline.list_videos().await {
        Ok(videos) => Json(VideoListResponse {
            total: videos.len(),
            videos: videos
                .into_iter()
                .map(|v| VideoInfo {
                    video_id: v.video_id,
                    youtube_id: v.youtube_id,
                    title: v.title,
                    uploader: v.uploader,
                    duration_seconds: v.duration_seconds,
                    view_count: v.view_count,
                })
                .collect(),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn video_metrics(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
) -> impl IntoResponse {
    let record = match state.pipeline.get_video(&video_id).await {
        Ok(Some(record)) => record,
        Ok(None) => return error_response(TubelensError::VideoNotFound(video_id)),
        Err(e) => return error_response(e),
    };

    let chunk_count = match state.pipeline.chunk_count(&video_id).await {
        Ok(count) => count,
        Err(e) => return error_response(e),
    };

    Json(metrics_response(record, chunk_count)).into_response()
}

fn metrics_response(record: crate::record::VideoRecord, chunk_count: usize) -> MetricsResponse {
    MetricsResponse {
        video_id: record.video_id,
        title: record.title,
        uploader: record.uploader,
        duration_seconds: record.duration_seconds,
        view_count: record.view_count,
        like_count: record.like_count,
        transcript_word_count: record.transcript_text.split_whitespace().count(),
        transcript_char_count: record.transcript_text.chars().count(),
        chunk_count,
        summary: record.summary,
        sentiment_breakdown: SentimentBreakdown::from_label(
            &record.sentiment.label,
            record.sentiment.score,
        ),
        sentiment: SentimentInfo {
            label: record.sentiment.label,
            score: record.sentiment.score,
        },
    }
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
    Json(req): Json<ChatRequest>,
) -> impl IntoResponse {
    match state
        .pipeline
        .answer(&video_id, &req.question, req.top_k)
        .await
    {
        Ok(answer) => Json(ChatResponse {
            answer: answer.text,
            sources: answer
                .sources
                .into_iter()
                .map(|s| SourceInfo {
                    score: s.score,
                    content: s.text,
                })
                .collect(),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}
