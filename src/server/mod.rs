//! Web server for document intake and labeling.
//!
//! Provides a JSON API with:
//! - Multipart upload that extracts, classifies and registers a document
//! - Listing and label correction of classified documents
//! - Batch export to Google Drive behind an OAuth login

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::classify::{build_classifier, Classifier};
use crate::cloud::{AuthGate, AuthProvider, DriveUploader, GoogleOAuth, StorageUploader};
use crate::config::Settings;
use crate::extraction::{TextExtraction, TextExtractor};
use crate::registry::DocumentRegistry;
use crate::services::{ExportBatchService, IntakePipeline, LabelCorrectionService};

/// HTTP-level limits and policies.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub cors_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<DocumentRegistry>,
    pub intake: Arc<IntakePipeline>,
    pub labels: Arc<LabelCorrectionService>,
    pub export: Arc<ExportBatchService>,
    pub auth: Arc<AuthGate>,
    pub options: Arc<ServerOptions>,
}

impl AppState {
    /// Build state with the configured extraction, classification, Drive and
    /// OAuth collaborators.
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("doclabel/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let extractor = Arc::new(TextExtractor::new(settings.extraction.clone()));
        let classifier = build_classifier(&settings.classifier)?;
        let uploader = Arc::new(DriveUploader::new(settings.drive.clone(), client.clone()));
        let provider = Arc::new(GoogleOAuth::new(settings.oauth.clone(), client));

        Ok(Self::with_collaborators(
            settings, extractor, classifier, uploader, provider,
        ))
    }

    /// Build state around explicit collaborators.
    pub fn with_collaborators(
        settings: &Settings,
        extractor: Arc<dyn TextExtraction>,
        classifier: Arc<dyn Classifier>,
        uploader: Arc<dyn StorageUploader>,
        provider: Arc<dyn AuthProvider>,
    ) -> Self {
        let registry = Arc::new(DocumentRegistry::new());

        Self {
            intake: Arc::new(IntakePipeline::new(
                registry.clone(),
                extractor,
                classifier,
                settings.upload_dir.clone(),
                settings.allowed_extensions.clone(),
            )),
            labels: Arc::new(LabelCorrectionService::new(registry.clone())),
            export: Arc::new(ExportBatchService::new(registry.clone(), uploader)),
            auth: Arc::new(
                AuthGate::new(provider, settings.oauth.login_path.clone()).with_login_timeout(
                    Duration::from_secs(settings.oauth.login_timeout_secs),
                ),
            ),
            options: Arc::new(ServerOptions {
                cors_origins: settings.cors_origins.clone(),
                max_upload_bytes: settings.max_upload_bytes,
            }),
            registry,
        }
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings)?;
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tempfile::{tempdir, TempDir};
    use tower::ServiceExt;

    use crate::classify::{default_taxonomy, KeywordClassifier};
    use crate::models::Label;
    use crate::testing::{state_from, FakeAuthProvider, FakeUploader};

    const BOUNDARY: &str = "doclabel-test-boundary";

    fn setup_test_state(max_upload_bytes: usize) -> (AppState, TempDir) {
        let dir = tempdir().unwrap();
        let mut settings = Settings::with_data_dir(dir.path().to_path_buf());
        settings.max_upload_bytes = max_upload_bytes;

        let state = AppState::with_collaborators(
            &settings,
            Arc::new(TextExtractor::default()),
            Arc::new(KeywordClassifier::new(
                default_taxonomy(),
                Label::new("Other", "General"),
            )),
            Arc::new(FakeUploader::default()),
            Arc::new(FakeAuthProvider),
        );
        (state, dir)
    }

    fn setup_test_app() -> (axum::Router, AppState, TempDir) {
        let (state, dir) = setup_test_state(1024 * 1024);
        (create_router(state.clone()), state, dir)
    }

    fn multipart_request(field: &str, filename: Option<&str>, content: &[u8]) -> Request<Body> {
        let disposition = match filename {
            Some(name) => format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"",
                field, name
            ),
            None => format!("Content-Disposition: form-data; name=\"{}\"", field),
        };

        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n{}\r\n", BOUNDARY, disposition).as_bytes());
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn json_request(uri: &str, json: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    async fn login(state: &AppState) {
        let url = state.auth.begin_login().await.unwrap();
        state.auth.complete_login("ok", &state_from(&url)).await.unwrap();
    }

    #[tokio::test]
    async fn test_upload_and_list() {
        let (app, _state, _dir) = setup_test_app();

        let response = app
            .clone()
            .oneshot(multipart_request(
                "file",
                Some("invoice.txt"),
                b"INVOICE\nAmount due: 12.00",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["message"], "File successfully processed and classified.");
        assert_eq!(json["predictions"]["category"], "Finance");
        assert_eq!(json["predictions"]["subcategory"], "Invoice");

        let response = app
            .oneshot(empty_request("GET", "/classified-documents"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        let docs = json["docs"].as_array().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["name"], "invoice.txt");
        assert_eq!(docs[0]["type"], "TXT");
        assert!(docs[0]["file_path"].as_str().unwrap().ends_with("invoice.txt"));
    }

    #[tokio::test]
    async fn test_upload_validation_errors() {
        let (app, state, _dir) = setup_test_app();

        let cases = [
            (multipart_request("file", Some("tool.exe"), b"MZ"), "Invalid file format."),
            (multipart_request("file", Some(""), b""), "No selected file"),
            (multipart_request("notes", None, b"hello"), "No file part"),
            (multipart_request("file", None, b"hello"), "No file part"),
            (empty_request("POST", "/upload"), "No file part"),
        ];

        for (request, message) in cases {
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(json_body(response).await["message"], message);
        }
        assert!(state.registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_upload_processing_error() {
        let (app, state, _dir) = setup_test_app();

        let response = app
            .oneshot(multipart_request("file", Some("archive.zip"), b"not a zip"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert!(json["message"]
            .as_str()
            .unwrap()
            .starts_with("Error processing file: "));
        assert!(state.registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_upload_too_large() {
        let (state, _dir) = setup_test_state(64);
        let app = create_router(state);

        let response = app
            .oneshot(multipart_request("file", Some("big.txt"), &[b'a'; 4096]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_update_label() {
        let (app, _state, _dir) = setup_test_app();
        app.clone()
            .oneshot(multipart_request("file", Some("lease.txt"), b"this agreement"))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(json_request(
                "/update-label",
                serde_json::json!({"name": "lease.txt", "category": "Legal"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["message"],
            "Missing required fields: name, category, and subcategory."
        );

        let response = app
            .clone()
            .oneshot(json_request(
                "/update-label",
                serde_json::json!({"name": "other.txt", "category": "Legal", "subcategory": "Court"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["message"], "Document not found.");

        let response = app
            .oneshot(json_request(
                "/update_label",
                serde_json::json!({"name": "lease.txt", "category": "Legal", "subcategory": "Court"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["message"], "Document updated successfully.");
        assert_eq!(json["document"]["subcategory"], "Court");
    }

    #[tokio::test]
    async fn test_save_to_drive_requires_documents_then_login() {
        let (app, _state, _dir) = setup_test_app();

        let response = app
            .clone()
            .oneshot(empty_request("POST", "/save-to-drive"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["message"],
            "No classified documents available."
        );

        app.clone()
            .oneshot(multipart_request("file", Some("memo.txt"), b"findings"))
            .await
            .unwrap();

        let response = app
            .oneshot(empty_request("POST", "/save-to-drive"))
            .await
            .unwrap();
        assert!(response.status().is_redirection());
        assert_eq!(response.headers()[header::LOCATION], "/authorize");
    }

    #[tokio::test]
    async fn test_save_to_drive_partial_and_total_failure() {
        let (app, state, _dir) = setup_test_app();
        login(&state).await;

        app.clone()
            .oneshot(multipart_request("file", Some("a.txt"), b"invoice"))
            .await
            .unwrap();
        app.clone()
            .oneshot(multipart_request("file", Some("b.txt"), b"receipt"))
            .await
            .unwrap();
        let listed = state.registry.list_all().await;
        std::fs::remove_file(&listed[0].file_path).unwrap();

        let response = app
            .clone()
            .oneshot(empty_request("POST", "/save-to-drive"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["successful_uploads"][0]["name"], "b.txt");
        assert_eq!(json["successful_uploads"][0]["drive_file_id"], "remote-b.txt");
        assert_eq!(json["failed_uploads"][0]["name"], "a.txt");
        assert_eq!(json["failed_uploads"][0]["error"], "File not found.");

        std::fs::remove_file(&listed[1].file_path).unwrap();
        let response = app
            .oneshot(empty_request("POST", "/save_todrive"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert_eq!(json["message"], "No successful uploads.");
        assert_eq!(json["failed_uploads"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_oauth_flow() {
        let (app, _state, _dir) = setup_test_app();

        let response = app
            .clone()
            .oneshot(empty_request("GET", "/authorize"))
            .await
            .unwrap();
        assert!(response.status().is_redirection());
        let location = response.headers()[header::LOCATION].to_str().unwrap().to_string();
        assert!(location.starts_with("https://consent.example/auth?state="));

        let response = app
            .clone()
            .oneshot(empty_request("GET", "/oauth2callback?code=abc&state=forged"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .clone()
            .oneshot(empty_request("GET", "/oauth2callback?state=x"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let callback = format!("/oauth2callback?code=abc&state={}", state_from(&location));
        let response = app
            .clone()
            .oneshot(empty_request("GET", &callback))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["message"], "Authentication successful!");

        let response = app
            .clone()
            .oneshot(empty_request("GET", "/auth/status"))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["authorized"], true);

        app.clone()
            .oneshot(empty_request("POST", "/logout"))
            .await
            .unwrap();
        let response = app
            .oneshot(empty_request("GET", "/auth/status"))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["authorized"], false);
    }

    #[tokio::test]
    async fn test_failed_token_exchange_is_bad_gateway() {
        let (app, state, _dir) = setup_test_app();
        let url = state.auth.begin_login().await.unwrap();

        let callback = format!("/oauth2callback?code=bad&state={}", state_from(&url));
        let response = app.oneshot(empty_request("GET", &callback)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _state, _dir) = setup_test_app();
        let response = app.oneshot(empty_request("GET", "/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
