use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use m4a_converter::config::ConverterConfig;
use m4a_converter::services::conversion_service::ConversionService;
use m4a_converter::services::transcoder::{AudioTranscoder, TranscodeError};
use m4a_converter::{AppState, create_app};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

const BOUNDARY: &str = "---------------------------123456789012345678901234567";
const FAKE_MP3: &[u8] = b"\xff\xfb\x90\x44\x00";

/// Records what it was asked to convert and writes a fixed MP3 frame
#[derive(Default)]
struct StubTranscoder {
    inputs: Mutex<Vec<Vec<u8>>>,
    reject: bool,
}

#[async_trait]
impl AudioTranscoder for StubTranscoder {
    async fn transcode(&self, input: &Path, output: &Path) -> Result<(), TranscodeError> {
        let data = tokio::fs::read(input).await?;
        self.inputs.lock().unwrap().push(data);
        if self.reject {
            return Err(TranscodeError::Rejected(
                "Invalid data found when processing input".to_string(),
            ));
        }
        tokio::fs::write(output, FAKE_MP3).await?;
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

fn app_with(transcoder: Arc<StubTranscoder>, max_file_size: usize) -> Router {
    let config = ConverterConfig {
        max_file_size,
        ..ConverterConfig::development()
    };
    let conversion_service = Arc::new(ConversionService::new(transcoder, config.clone()));
    create_app(AppState {
        conversion_service,
        config,
    })
}

fn multipart_body(field: &str, filename: &str, content: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\n\
        Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
        Content-Type: audio/mp4\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn convert_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/convert")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn error_message(response: axum::response::Response) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    json["error"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_convert_returns_mp3_attachment() {
    let transcoder = Arc::new(StubTranscoder::default());
    let app = app_with(transcoder.clone(), 1024 * 1024);

    let response = app
        .oneshot(convert_request(multipart_body(
            "file",
            "voice.m4a",
            b"0123456789",
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers().clone();
    assert_eq!(headers[header::CONTENT_TYPE], "audio/mpeg");
    let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"voice.mp3\""));
    assert!(headers.contains_key("x-request-id"));

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], FAKE_MP3);

    let inputs = transcoder.inputs.lock().unwrap();
    assert_eq!(inputs.len(), 1);
    assert_eq!(inputs[0], b"0123456789");
}

#[tokio::test]
async fn test_convert_ignores_extra_fields() {
    let transcoder = Arc::new(StubTranscoder::default());
    let app = app_with(transcoder.clone(), 1024 * 1024);

    let mut body = format!(
        "--{BOUNDARY}\r\n\
        Content-Disposition: form-data; name=\"note\"\r\n\r\n\
        hello\r\n"
    )
    .into_bytes();
    body.extend(multipart_body("file", "clip.m4a", b"abc"));

    let response = app.oneshot(convert_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(transcoder.inputs.lock().unwrap()[0], b"abc");
}

#[tokio::test]
async fn test_convert_without_file_field() {
    let transcoder = Arc::new(StubTranscoder::default());
    let app = app_with(transcoder.clone(), 1024 * 1024);

    let response = app
        .oneshot(convert_request(multipart_body(
            "audio",
            "voice.m4a",
            b"0123456789",
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(response).await, "No file provided");
    assert!(transcoder.inputs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_convert_empty_file() {
    let transcoder = Arc::new(StubTranscoder::default());
    let app = app_with(transcoder.clone(), 1024 * 1024);

    let response = app
        .oneshot(convert_request(multipart_body("file", "voice.m4a", b"")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(transcoder.inputs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_convert_oversized_file() {
    let transcoder = Arc::new(StubTranscoder::default());
    let app = app_with(transcoder.clone(), 16);

    let response = app
        .oneshot(convert_request(multipart_body(
            "file",
            "voice.m4a",
            &[0u8; 64],
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(transcoder.inputs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_convert_body_over_route_limit_is_413() {
    // The route allows max_file_size plus 1 MiB of multipart overhead
    let big = vec![0u8; 3 * 1024 * 1024];

    let mut extra_field_first = format!(
        "--{BOUNDARY}\r\n\
        Content-Disposition: form-data; name=\"notes\"\r\n\r\n"
    )
    .into_bytes();
    extra_field_first.extend_from_slice(&big);
    extra_field_first.extend_from_slice(b"\r\n");
    let file_part = multipart_body("file", "voice.m4a", b"abc");
    extra_field_first.extend_from_slice(&file_part);

    for body in [multipart_body("file", "voice.m4a", &big), extra_field_first] {
        let transcoder = Arc::new(StubTranscoder::default());
        let app = app_with(transcoder.clone(), 16);

        let response = app.oneshot(convert_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(error_message(response).await.contains("maximum allowed limit"));
        assert!(transcoder.inputs.lock().unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_convert_rejected_input() {
    let transcoder = Arc::new(StubTranscoder {
        reject: true,
        ..Default::default()
    });
    let app = app_with(transcoder, 1024 * 1024);

    let response = app
        .oneshot(convert_request(multipart_body(
            "file",
            "notes.txt",
            b"plain text",
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(error_message(response).await.contains("Could not convert audio"));
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = app_with(Arc::new(StubTranscoder::default()), 1024);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "trace-me-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers()["x-request-id"], "trace-me-42");
}

/// Log sink shared between the subscriber and the test
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_request_span_carries_request_id() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let app = app_with(Arc::new(StubTranscoder::default()), 1024);
    for request_id in [Some("trace-me-42"), None] {
        let mut request = Request::builder().uri("/health");
        if let Some(id) = request_id {
            request = request.header("x-request-id", id);
        }
        let response = app
            .clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let logs = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    assert!(logs.contains("request_id=trace-me-42"), "logs: {}", logs);
    // A minted id is in the span too
    assert!(!logs.contains("request_id=unknown"), "logs: {}", logs);
}

#[tokio::test]
async fn test_health_reports_transcoder() {
    let app = app_with(Arc::new(StubTranscoder::default()), 1024);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["transcoder"], "stub");
    assert_eq!(json["transcoder_status"], "available");
}

#[tokio::test]
async fn test_index_serves_upload_page() {
    let app = app_with(Arc::new(StubTranscoder::default()), 1024);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let html = String::from_utf8_lossy(&body);
    assert!(html.contains("id=\"uploadArea\""));
    assert!(html.contains("id=\"fileInput\""));

    let response = app
        .oneshot(Request::builder().uri("/script.js").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&body).contains("/convert"));
}
