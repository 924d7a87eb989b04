use crate::assistant::Assistant;
use crate::models::api::{ GenerateRequest, RefactorRequest, ReviewSummaryRequest, TranscriptionResponse };
use crate::models::log::PromptLog;
use crate::models::settings::UserSettings;
use crate::server::auth::{ self, IdentityResolver };
use crate::server::error::ApiError;
use crate::sse;

use std::convert::Infallible;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{ Duration, Instant };

use axum::{
    Json,
    Router,
    body::{ Body, Bytes },
    extract::{ Multipart, State },
    http::{ HeaderMap, StatusCode, header },
    response::{ IntoResponse, Response },
    routing::{ get, post },
};
use futures_util::StreamExt;
use governor::{ RateLimiter, Quota, state::{ InMemoryState, NotKeyed }, clock::DefaultClock };
use lazy_static::lazy_static;
use log::{ error, info };
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{ Any, CorsLayer };

const GENERATION_TIMEOUT: Duration = Duration::from_secs(300);

lazy_static! {
    static ref GENERATE_LIMITER: RateLimiter<NotKeyed, InMemoryState, DefaultClock> =
        RateLimiter::direct(Quota::per_second(NonZeroU32::new(10).unwrap()));
}

#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<Assistant>,
    pub resolver: Arc<dyn IdentityResolver>,
}

impl AppState {
    pub fn new(assistant: Arc<Assistant>, resolver: Arc<dyn IdentityResolver>) -> Self {
        Self { assistant, resolver }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/generate", post(generate_handler))
        .route("/refactor", post(refactor_handler))
        .route("/settings", get(get_settings_handler).post(update_settings_handler))
        .route("/ai/review-summary", post(review_summary_handler))
        .route("/github/prs", get(github_prs_handler))
        .route("/voice/transcribe", post(transcribe_handler))
        .route("/analytics", get(analytics_handler))
        .layer(cors)
        .with_state(state)
}

async fn resolve_identity(state: &AppState, headers: &HeaderMap) -> Result<String, ApiError> {
    let token = auth::bearer_token(headers);
    match state.resolver.resolve(token).await {
        Ok(Some(user_id)) => Ok(user_id),
        Ok(None) => Err(ApiError::Unauthenticated),
        Err(e) => Err(ApiError::Internal(e.to_string())),
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Streams one generation end-to-end: provider fragments are re-emitted as
/// self-delimiting content frames, the full text is accumulated, and a
/// PromptLog is written once the provider stream has drained. Failures after
/// the response has opened close the body without the terminal sentinel.
async fn generate_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<GenerateRequest>
) -> Result<Response, ApiError> {
    if GENERATE_LIMITER.check().is_err() {
        return Err(ApiError::RateLimited);
    }

    let user_id = resolve_identity(&state, &headers).await?;

    let prompt = match req.prompt {
        Some(p) if !p.is_empty() => p,
        _ => {
            return Err(ApiError::InvalidInput("Prompt is required".to_string()));
        }
    };

    let started = Instant::now();
    let mut fragments = state.assistant
        .stream_generation(&prompt).await
        .map_err(|e| ApiError::Provider(e.to_string()))?;

    let store = state.assistant.store();
    let (tx, rx) = mpsc::channel::<Result<Bytes, Infallible>>(32);

    tokio::spawn(async move {
        let pump = async {
            let mut response_text = String::new();

            while let Some(fragment) = fragments.next().await {
                match fragment {
                    Ok(content) => {
                        if content.is_empty() {
                            continue;
                        }
                        response_text.push_str(&content);
                        let frame = sse::content_frame(&content);
                        if tx.send(Ok(Bytes::from(frame))).await.is_err() {
                            // Client went away: stop pulling fragments and do
                            // not log the incomplete generation.
                            info!("Client disconnected mid-generation, dropping partial response");
                            return None;
                        }
                    }
                    Err(e) => {
                        // The status line is long gone; the missing sentinel
                        // is the failure signal.
                        error!("Provider stream failed mid-generation: {}", e);
                        return None;
                    }
                }
            }

            Some(response_text)
        };

        let response_text = match tokio::time::timeout(GENERATION_TIMEOUT, pump).await {
            Ok(Some(text)) => text,
            Ok(None) => {
                return;
            }
            Err(_) => {
                error!(
                    "Generation exceeded {}s, closing stream without sentinel",
                    GENERATION_TIMEOUT.as_secs()
                );
                return;
            }
        };

        let prompt_log = PromptLog::new(
            &user_id,
            &prompt,
            &response_text,
            started.elapsed().as_millis() as u64
        );
        if let Err(e) = store.record_prompt(&prompt_log).await {
            error!("Failed to record prompt log: {}", e);
        }

        let _ = tx.send(Ok(Bytes::from_static(sse::DONE_FRAME.as_bytes()))).await;
    });

    let body = Body::from_stream(ReceiverStream::new(rx));
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(body)
        .map_err(|e| ApiError::Internal(e.to_string()))
}

async fn refactor_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RefactorRequest>
) -> Result<Response, ApiError> {
    resolve_identity(&state, &headers).await?;

    let (code, instructions) = match (req.code, req.instructions) {
        (Some(code), Some(instructions)) if !code.is_empty() && !instructions.is_empty() => {
            (code, instructions)
        }
        _ => {
            return Err(ApiError::InvalidInput("Code and instructions are required".to_string()));
        }
    };

    let outcome = state.assistant
        .refactor(&code, &instructions).await
        .map_err(|e| ApiError::Provider(e.to_string()))?;

    Ok(Json(outcome).into_response())
}

async fn get_settings_handler(
    State(state): State<AppState>,
    headers: HeaderMap
) -> Result<Response, ApiError> {
    let user_id = resolve_identity(&state, &headers).await?;

    let settings = state.assistant
        .store()
        .get_settings(&user_id).await
        .map_err(|e| ApiError::Persistence(e.to_string()))?
        .unwrap_or_default();

    Ok(Json(settings).into_response())
}

async fn update_settings_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(settings): Json<UserSettings>
) -> Result<Response, ApiError> {
    let user_id = resolve_identity(&state, &headers).await?;

    let validated = settings.normalized();
    state.assistant
        .store()
        .put_settings(&user_id, &validated).await
        .map_err(|e| ApiError::Persistence(e.to_string()))?;

    Ok(Json(json!({ "success": true })).into_response())
}

async fn review_summary_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ReviewSummaryRequest>
) -> Result<Response, ApiError> {
    let user_id = resolve_identity(&state, &headers).await?;

    let (repo, pr_number) = match (req.repo, req.pr_number) {
        (Some(repo), Some(pr_number)) if !repo.is_empty() => (repo, pr_number),
        _ => {
            return Err(
                ApiError::InvalidInput("PR number and repository are required".to_string())
            );
        }
    };

    let outcome = state.assistant
        .review_summary(&user_id, &repo, pr_number).await
        .map_err(|e| ApiError::Provider(e.to_string()))?;

    Ok(Json(outcome).into_response())
}

async fn github_prs_handler(
    State(state): State<AppState>,
    headers: HeaderMap
) -> Result<Response, ApiError> {
    resolve_identity(&state, &headers).await?;

    let github = state.assistant.github().ok_or(ApiError::GitHubNotConfigured)?;
    let prs = github.list_open_prs().await.map_err(|e| ApiError::Provider(e.to_string()))?;

    Ok(Json(prs).into_response())
}

async fn transcribe_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart
) -> Result<Response, ApiError> {
    resolve_identity(&state, &headers).await?;

    let mut audio: Option<(Vec<u8>, String, String)> = None;
    while
        let Some(field) = multipart
            .next_field().await
            .map_err(|e| ApiError::InvalidInput(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() == Some("audio") {
            let file_name = field
                .file_name()
                .unwrap_or("recording.webm")
                .to_string();
            let mime_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes().await
                .map_err(|e| ApiError::InvalidInput(format!("Malformed multipart body: {}", e)))?;
            audio = Some((data.to_vec(), file_name, mime_type));
            break;
        }
    }

    let (data, file_name, mime_type) = audio.ok_or_else(||
        ApiError::InvalidInput("Audio file is required".to_string())
    )?;

    let transcription = state.assistant
        .transcribe(data, &file_name, &mime_type).await
        .map_err(|e| ApiError::Provider(e.to_string()))?;

    Ok(Json(TranscriptionResponse { transcription }).into_response())
}

async fn analytics_handler(
    State(state): State<AppState>,
    headers: HeaderMap
) -> Result<Response, ApiError> {
    let user_id = resolve_identity(&state, &headers).await?;

    let report = state.assistant
        .analytics(&user_id).await
        .map_err(|e| ApiError::Persistence(e.to_string()))?;

    Ok(Json(report).into_response())
}
