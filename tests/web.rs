use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use lookalike::error::GatewayError;
use lookalike::gateway::InferenceGateway;
use lookalike::web::{router, AppState};
use lookalike::ImageSubmission;

const BOUNDARY: &str = "lookalike-boundary";
const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

struct StubGateway {
    reply: Option<&'static str>,
    calls: AtomicUsize,
    last_media_type: std::sync::Mutex<Option<String>>,
}

impl StubGateway {
    fn new(reply: Option<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
            last_media_type: std::sync::Mutex::new(None),
        })
    }
}

#[async_trait]
impl InferenceGateway for StubGateway {
    async fn infer(&self, image: &ImageSubmission) -> Result<String, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_media_type.lock().unwrap() = Some(image.media_type().to_string());
        match self.reply {
            Some(text) => Ok(text.to_string()),
            None => Err(GatewayError::Upstream {
                status: 503,
                body: "unavailable".into(),
            }),
        }
    }
}

fn app(gateway: Arc<StubGateway>, max_upload_bytes: usize) -> Router {
    router(AppState {
        gateway,
        max_upload_bytes,
    })
}

fn multipart_request(field: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"face.png\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/analyze")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn index_serves_the_page() {
    let response = app(StubGateway::new(None), 1024)
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("AI 관상 놀이터"));
    assert!(html.contains("/analyze"));
}

#[tokio::test]
async fn analyze_returns_parsed_result() {
    let gateway = StubGateway::new(Some("Hello.\n!!!닮은꼴:손흥민!!!"));
    let response = app(gateway.clone(), 1024 * 1024)
        .oneshot(multipart_request("image", "image/png", PNG_MAGIC))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["body_text"], "Hello.\n");
    assert_eq!(body["subject_name"], "손흥민");
    assert!(body["image_search_url"]
        .as_str()
        .unwrap()
        .starts_with("https://www.google.com/search?q="));
    assert!(body["share"]["text"].as_str().unwrap().contains("손흥민"));
    assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        gateway.last_media_type.lock().unwrap().as_deref(),
        Some("image/png")
    );
}

#[tokio::test]
async fn answer_without_marker_has_no_name() {
    let gateway = StubGateway::new(Some("그냥 설명만 있어요."));
    let response = app(gateway, 1024 * 1024)
        .oneshot(multipart_request("image", "image/png", PNG_MAGIC))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["body_text"], "그냥 설명만 있어요.");
    assert!(body["subject_name"].is_null());
    assert!(body["share"].is_null());
}

#[tokio::test]
async fn empty_file_is_rejected_before_the_gateway() {
    let gateway = StubGateway::new(Some("unused"));
    let response = app(gateway.clone(), 1024)
        .oneshot(multipart_request("image", "application/octet-stream", b""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(!body["error"].as_str().unwrap().is_empty());
    assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_image_field_is_rejected() {
    let gateway = StubGateway::new(Some("unused"));
    let response = app(gateway.clone(), 1024)
        .oneshot(multipart_request("other", "image/png", PNG_MAGIC))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn non_image_upload_is_rejected() {
    let gateway = StubGateway::new(Some("unused"));
    let response = app(gateway.clone(), 1024)
        .oneshot(multipart_request("image", "text/plain", b"not a photo"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn gateway_failure_maps_to_bad_gateway() {
    let response = app(StubGateway::new(None), 1024 * 1024)
        .oneshot(multipart_request("image", "image/png", PNG_MAGIC))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("분석 중 오류 발생:"));
}

#[tokio::test]
async fn oversized_upload_is_refused() {
    let gateway = StubGateway::new(Some("unused"));
    let big = vec![0u8; 4096];
    let response = app(gateway.clone(), 1024)
        .oneshot(multipart_request("image", "image/png", &big))
        .await
        .unwrap();

    assert!(!response.status().is_success());
    assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
}
