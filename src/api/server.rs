//! HTTP server implementation for the API

use anyhow::Result;
use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, QueryRejection},
        Multipart, Path, Query, State,
    },
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use super::handlers;
use super::models::{
    BatchVideoRequest, CommentQuery, CommentRequest, CsvQuery, ErrorResponse, LanguageQuery,
    SubtitleRequest, VideoRequest,
};
use crate::config::Config;
use crate::error::ExtractError;
use crate::extractor::VideoExtractor;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<VideoExtractor>,
    pub config: Arc<Config>,
}

/// Build the router with all routes and middleware
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/extract", post(extract_handler))
        .route("/transcript", post(batch_handler))
        .route("/transcript/csv", post(csv_handler))
        .route("/transcript/csv-save", post(csv_save_handler))
        .route("/comments", post(comments_handler))
        .route("/subtitles", post(subtitles_handler))
        .route("/test/:video_id", get(test_video_handler))
        .route("/test-comments/:video_id", get(test_comments_handler))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

/// Configure and start the HTTP server
pub async fn start_http_server(extractor: Arc<VideoExtractor>, config: Arc<Config>) -> Result<()> {
    let address = format!("{}:{}", config.server.host, config.server.port);
    let app = router(AppState { extractor, config });

    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("🌐 API server listening on http://{}", address);

    axum::serve(listener, app).await?;
    Ok(())
}

fn error_response(e: &ExtractError) -> Response {
    let status = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!("Request failed: {}", e);
    } else {
        info!("Request rejected ({}): {}", status, e);
    }
    (status, Json(ErrorResponse::from(e))).into_response()
}

/// Extractor rejections (bad body, bad query, wrong content type) become `invalid_input` errors
fn rejected(rejection: impl std::fmt::Display) -> ExtractError {
    ExtractError::InvalidInput(rejection.to_string())
}

fn respond<T: Serialize>(result: crate::error::Result<T>) -> Response {
    match result {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// Read the `file` part of a multipart upload
async fn read_upload(mut multipart: Multipart) -> crate::error::Result<Vec<u8>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ExtractError::InvalidInput(format!("invalid multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ExtractError::InvalidInput(format!("failed to read upload: {}", e)))?;
            return Ok(bytes.to_vec());
        }
    }
    Err(ExtractError::InvalidInput("multipart field 'file' is required".to_string()))
}

async fn root_handler() -> impl IntoResponse {
    Json(handlers::root())
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(handlers::health_check()))
}

async fn extract_handler(
    State(state): State<AppState>,
    request: Result<Json<VideoRequest>, JsonRejection>,
) -> Response {
    respond(
        async {
            let Json(request) = request.map_err(rejected)?;
            handlers::extract_video(&state, request).await
        }
        .await,
    )
}

async fn batch_handler(
    State(state): State<AppState>,
    request: Result<Json<BatchVideoRequest>, JsonRejection>,
) -> Response {
    respond(
        async {
            let Json(request) = request.map_err(rejected)?;
            handlers::extract_batch(&state, request).await
        }
        .await,
    )
}

async fn csv_handler(
    State(state): State<AppState>,
    query: Result<Query<CsvQuery>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    respond(
        async {
            let Query(query) = query.map_err(rejected)?;
            let csv = read_upload(multipart.map_err(rejected)?).await?;
            handlers::extract_csv(&state, &csv, query).await
        }
        .await,
    )
}

async fn csv_save_handler(
    State(state): State<AppState>,
    query: Result<Query<CsvQuery>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let file = async {
        let Query(query) = query.map_err(rejected)?;
        let csv = read_upload(multipart.map_err(rejected)?).await?;
        handlers::extract_csv_to_file(&state, &csv, query).await
    }
    .await;

    match file {
        Ok(file) => {
            let disposition = format!("attachment; filename=\"{}\"", file.filename);
            let mut response = (StatusCode::OK, file.bytes).into_response();
            let headers = response.headers_mut();
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(file.content_type));
            if let Ok(value) = HeaderValue::from_str(&disposition) {
                headers.insert(header::CONTENT_DISPOSITION, value);
            }
            response
        }
        Err(e) => error_response(&e),
    }
}

async fn comments_handler(
    State(state): State<AppState>,
    request: Result<Json<CommentRequest>, JsonRejection>,
) -> Response {
    respond(
        async {
            let Json(request) = request.map_err(rejected)?;
            handlers::comments(&state, request).await
        }
        .await,
    )
}

async fn subtitles_handler(
    State(state): State<AppState>,
    request: Result<Json<SubtitleRequest>, JsonRejection>,
) -> Response {
    respond(
        async {
            let Json(request) = request.map_err(rejected)?;
            handlers::subtitles(&state, request).await
        }
        .await,
    )
}

async fn test_video_handler(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    query: Result<Query<LanguageQuery>, QueryRejection>,
) -> Response {
    respond(
        async {
            let Query(query) = query.map_err(rejected)?;
            handlers::test_video(&state, &video_id, query.languages.as_deref()).await
        }
        .await,
    )
}

async fn test_comments_handler(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    query: Result<Query<CommentQuery>, QueryRejection>,
) -> Response {
    respond(
        async {
            let Query(query) = query.map_err(rejected)?;
            handlers::test_comments(&state, &video_id, query.max_comments).await
        }
        .await,
    )
}
