use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::controller::{SubmissionState, UploadController};
use crate::error::{SubmitError, ValidationError};
use crate::gateway::InferenceGateway;
use crate::share::ShareMessage;
use crate::submission::ImageSubmission;

const INDEX_HTML: &str = include_str!("../assets/index.html");

/// Form field the page posts the photo under.
pub const IMAGE_FIELD: &str = "image";

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn InferenceGateway>,
    pub max_upload_bytes: usize,
}

#[derive(Serialize, Debug)]
pub struct AnalyzeResponse {
    pub body_text: String,
    pub subject_name: Option<String>,
    pub image_search_url: Option<String>,
    pub share: Option<ShareMessage>,
}

#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Error, Debug)]
pub enum WebError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Gateway(String),
    #[error(transparent)]
    Upload(#[from] MultipartError),
}

impl From<SubmitError> for WebError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Validation(v) => WebError::Validation(v),
            SubmitError::Busy => WebError::Gateway(SubmitError::Busy.to_string()),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            WebError::Validation(v) => (StatusCode::BAD_REQUEST, v.user_message()),
            WebError::Gateway(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            WebError::Upload(e) => (e.status(), e.body_text()),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    let limit = state.max_upload_bytes;
    Router::new()
        .route("/", get(index))
        .route("/analyze", post(analyze))
        .layer(DefaultBodyLimit::max(limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, WebError> {
    let mut controller = UploadController::new();

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let declared = field.content_type().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let data = field.bytes().await?;

        let image =
            ImageSubmission::from_upload(data.to_vec(), declared.as_deref(), file_name.as_deref())
                .inspect_err(|e| warn!("Upload rejected: {e}"))?;
        info!(
            file = image.file_name().unwrap_or("-"),
            bytes = image.len(),
            "Photo received"
        );
        controller.select_file(image);
        break;
    }

    controller.submit(state.gateway.as_ref()).await?;

    match controller.state() {
        SubmissionState::Succeeded(result) => Ok(Json(AnalyzeResponse {
            body_text: result.body_text.clone(),
            subject_name: result.subject_name.clone(),
            image_search_url: result.image_search_url(),
            share: ShareMessage::compose(result),
        })),
        SubmissionState::Failed(message) => Err(WebError::Gateway(message.clone())),
        other => Err(WebError::Gateway(format!(
            "unexpected submission state: {other:?}"
        ))),
    }
}
