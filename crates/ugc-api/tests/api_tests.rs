//! End-to-end API tests against mock backends.
//!
//! The record store, workflow API, asset CDN and object storage are all
//! stubbed with wiremock; presigning happens locally so no real bucket is
//! needed.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ugc_api::auth::{Claims, TokenVerifier};
use ugc_api::{ApiConfig, AppState};
use ugc_storage::{StorageClient, StorageConfig};
use ugc_store::{RetryConfig, StoreClient, StoreConfig};
use ugc_workflow::{WorkflowClient, WorkflowConfig};

const JWT_SECRET: &str = "test-secret";

struct TestBackends {
    store: MockServer,
    workflow: MockServer,
    s3: MockServer,
}

impl TestBackends {
    async fn start() -> Self {
        Self {
            store: MockServer::start().await,
            workflow: MockServer::start().await,
            s3: MockServer::start().await,
        }
    }

    fn router(&self) -> Router {
        let store = StoreClient::new(StoreConfig {
            base_url: self.store.uri(),
            service_key: "service-key".to_string(),
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(1),
            retry: RetryConfig::none(),
        })
        .unwrap();

        let storage = Arc::new(StorageClient::new(StorageConfig {
            endpoint_url: self.s3.uri(),
            access_key_id: "test-access".to_string(),
            secret_access_key: "test-secret".to_string(),
            bucket_name: "user-videos".to_string(),
            region: "auto".to_string(),
        }));

        let workflow = Arc::new(
            WorkflowClient::new(WorkflowConfig {
                base_url: self.workflow.uri(),
                api_key: "wf-key".to_string(),
                workflow_name: "workflows/acme/narrate".to_string(),
                timeout: Duration::from_secs(5),
            })
            .unwrap(),
        );

        let verifier = Arc::new(TokenVerifier::new(JWT_SECRET));
        let state = AppState::with_clients(
            ApiConfig::default(),
            store,
            storage,
            workflow,
            verifier,
        );

        ugc_api::create_router(state, None)
    }
}

fn token_for(uid: &str) -> String {
    let claims = Claims {
        sub: uid.to_string(),
        email: Some(format!("{}@example.com", uid)),
        aud: "authenticated".to_string(),
        exp: chrono::Utc::now().timestamp() + 3600,
        iat: chrono::Utc::now().timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

fn avatar_row() -> Value {
    json!({
        "id": "a1",
        "video_url": "https://cdn.example/base.mp4",
        "name": "Maya"
    })
}

fn video_row(status: &str) -> Value {
    json!({
        "id": "v1",
        "user_id": "u1",
        "avatar_id": "a1",
        "script": "Hello world",
        "voice": "Rachel",
        "status": status,
        "created_at": "2025-01-01T00:00:00Z",
        "updated_at": "2025-01-01T00:00:00Z"
    })
}

fn generate_request(token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/video/generate")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", t));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn unauthenticated_generate_is_rejected() {
    let backends = TestBackends::start().await;
    let app = backends.router();

    let request = generate_request(
        None,
        json!({"avatar_id": "a1", "script": "Hi", "voice": "Rachel"}),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn invalid_voice_rejected_before_any_record() {
    let backends = TestBackends::start().await;
    let app = backends.router();

    // No store mocks mounted: a store call would fail the test loudly
    let request = generate_request(
        Some(&token_for("u1")),
        json!({"avatar_id": "a1", "script": "Hi", "voice": "NotAVoice"}),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Invalid voice");
}

#[tokio::test]
async fn missing_fields_rejected() {
    let backends = TestBackends::start().await;
    let app = backends.router();

    let request = generate_request(
        Some(&token_for("u1")),
        json!({"avatar_id": "a1", "script": "   ", "voice": "Rachel"}),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Missing required fields");
}

#[tokio::test]
async fn absent_field_rejected_like_empty_field() {
    let backends = TestBackends::start().await;
    let app = backends.router();

    // No "voice" key at all; must get the same 400 JSON error as an
    // empty value, not a deserializer rejection
    let request = generate_request(
        Some(&token_for("u1")),
        json!({"avatar_id": "a1", "script": "Hi"}),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Missing required fields");
}

#[tokio::test]
async fn unknown_avatar_rejected() {
    let backends = TestBackends::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/avatar_previews"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&backends.store)
        .await;

    let app = backends.router();
    let request = generate_request(
        Some(&token_for("u1")),
        json!({"avatar_id": "missing", "script": "Hi", "voice": "Rachel"}),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Avatar not found");
}

#[tokio::test]
async fn happy_path_generates_and_signs() {
    let backends = TestBackends::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/avatar_previews"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([avatar_row()])))
        .mount(&backends.store)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/generated_videos"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([video_row("pending")])))
        .expect(1)
        .mount(&backends.store)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/generated_videos"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&backends.store)
        .await;

    // The workflow streams progress, then a terminal result pointing at the
    // "CDN" (the same mock server)
    let asset_url = format!("{}/out.mp4", backends.workflow.uri());
    let sse = format!(
        concat!(
            "data: {{\"type\": \"progress\", \"node_id\": \"tts\", \"message\": \"synthesizing\"}}\n\n",
            "data: {{\"video\": {{\"url\": \"{}\", \"file_size\": 4}}}}\n\n",
        ),
        asset_url
    );
    Mock::given(method("POST"))
        .and(path("/workflows/acme/narrate/stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
        .expect(1)
        .mount(&backends.workflow)
        .await;

    Mock::given(method("GET"))
        .and(path("/out.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"mp4!".to_vec()))
        .expect(1)
        .mount(&backends.workflow)
        .await;

    Mock::given(method("PUT"))
        .and(path("/user-videos/u1/v1/video.mp4"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&backends.s3)
        .await;

    let app = backends.router();
    let request = generate_request(
        Some(&token_for("u1")),
        json!({"avatar_id": "a1", "script": "Hello world", "voice": "Rachel"}),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "completed");
    assert_eq!(body["id"], "v1");

    let video_url = body["video_url"].as_str().unwrap();
    assert!(video_url.contains("/user-videos/u1/v1/video.mp4"));
    assert!(video_url.contains("X-Amz-Signature="));
}

#[tokio::test]
async fn upstream_error_marks_record_failed() {
    let backends = TestBackends::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/avatar_previews"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([avatar_row()])))
        .mount(&backends.store)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/generated_videos"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([video_row("pending")])))
        .mount(&backends.store)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/generated_videos"))
        .and(body_string_contains("processing"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&backends.store)
        .await;

    // The failed patch must carry the structured upstream diagnostic
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/generated_videos"))
        .and(body_string_contains("failed"))
        .and(body_string_contains("upstream"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&backends.store)
        .await;

    let sse = concat!(
        "data: {\"type\": \"error\", \"error\": \"voice model unavailable\", \"node_id\": \"tts\"}\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/workflows/acme/narrate/stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
        .mount(&backends.workflow)
        .await;

    let app = backends.router();
    let request = generate_request(
        Some(&token_for("u1")),
        json!({"avatar_id": "a1", "script": "Hello world", "voice": "Rachel"}),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response_json(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("voice model unavailable"));
}

#[tokio::test]
async fn finalization_failure_is_distinguished() {
    let backends = TestBackends::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/avatar_previews"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([avatar_row()])))
        .mount(&backends.store)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/generated_videos"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([video_row("pending")])))
        .mount(&backends.store)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/generated_videos"))
        .and(body_string_contains("processing"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&backends.store)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/generated_videos"))
        .and(body_string_contains("finalization"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&backends.store)
        .await;

    // Workflow succeeds, but the asset download 404s
    let asset_url = format!("{}/gone.mp4", backends.workflow.uri());
    let sse = format!(
        "data: {{\"video\": {{\"url\": \"{}\"}}}}\n\n",
        asset_url
    );
    Mock::given(method("POST"))
        .and(path("/workflows/acme/narrate/stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
        .mount(&backends.workflow)
        .await;

    Mock::given(method("GET"))
        .and(path("/gone.mp4"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&backends.workflow)
        .await;

    let app = backends.router();
    let request = generate_request(
        Some(&token_for("u1")),
        json!({"avatar_id": "a1", "script": "Hello world", "voice": "Rachel"}),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response_json(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("video generated but download failed"));
}

#[tokio::test]
async fn status_update_failure_marks_record_failed() {
    let backends = TestBackends::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/avatar_previews"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([avatar_row()])))
        .mount(&backends.store)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/generated_videos"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([video_row("pending")])))
        .mount(&backends.store)
        .await;

    // Moving the record to processing fails; the record must still be
    // marked failed rather than left stuck
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/generated_videos"))
        .and(body_string_contains("processing"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&backends.store)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/generated_videos"))
        .and(body_string_contains("failed"))
        .and(body_string_contains("finalization"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&backends.store)
        .await;

    let app = backends.router();
    let request = generate_request(
        Some(&token_for("u1")),
        json!({"avatar_id": "a1", "script": "Hello world", "voice": "Rachel"}),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response_json(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Failed to update video status"));
}

#[tokio::test]
async fn list_videos_returns_owner_records_and_stats() {
    let backends = TestBackends::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/generated_videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            video_row("completed"),
            video_row("failed"),
            video_row("processing"),
        ])))
        .mount(&backends.store)
        .await;

    let app = backends.router();
    let token = token_for("u1");

    let request = Request::builder()
        .method("GET")
        .uri("/api/videos")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 3);

    let request = Request::builder()
        .method("GET")
        .uri("/api/videos?stats=true")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["completed"], 1);
    assert_eq!(body["failed"], 1);
    assert_eq!(body["processing"], 1);
}

#[tokio::test]
async fn avatar_count_endpoint() {
    let backends = TestBackends::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/avatar_previews"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Range", "0-0/7")
                .set_body_json(json!([{"id": "a1"}])),
        )
        .mount(&backends.store)
        .await;

    let app = backends.router();
    let request = Request::builder()
        .method("GET")
        .uri("/api/avatars?count=true")
        .header(header::AUTHORIZATION, format!("Bearer {}", token_for("u1")))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["count"], 7);
}

#[tokio::test]
async fn video_proxy_serves_range_requests() {
    let backends = TestBackends::start().await;

    let mut completed = video_row("completed");
    completed["video_url"] = json!("https://signed.example/v.mp4");
    Mock::given(method("GET"))
        .and(path("/rest/v1/generated_videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([completed])))
        .mount(&backends.store)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/user-videos/u1/v1/video\.mp4$"))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header("Content-Type", "video/mp4")
                .insert_header("Content-Range", "bytes 0-3/1000")
                .set_body_bytes(b"mp4!".to_vec()),
        )
        .mount(&backends.s3)
        .await;

    let app = backends.router();
    let request = Request::builder()
        .method("GET")
        .uri("/api/video/v1")
        .header(header::AUTHORIZATION, format!("Bearer {}", token_for("u1")))
        .header(header::RANGE, "bytes=0-3")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        response.headers().get(header::ACCEPT_RANGES).unwrap(),
        "bytes"
    );
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "public, max-age=3600"
    );
    assert_eq!(
        response.headers().get(header::CONTENT_RANGE).unwrap(),
        "bytes 0-3/1000"
    );
}

#[tokio::test]
async fn video_download_redirects_to_signed_url() {
    let backends = TestBackends::start().await;

    let mut completed = video_row("completed");
    completed["video_url"] = json!("https://signed.example/v.mp4");
    Mock::given(method("GET"))
        .and(path("/rest/v1/generated_videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([completed])))
        .mount(&backends.store)
        .await;

    let app = backends.router();
    let request = Request::builder()
        .method("GET")
        .uri("/api/video/v1?download=true")
        .header(header::AUTHORIZATION, format!("Bearer {}", token_for("u1")))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(location.contains("/user-videos/u1/v1/video.mp4"));
    assert!(location.contains("X-Amz-Signature="));
}

#[tokio::test]
async fn incomplete_video_not_served() {
    let backends = TestBackends::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/generated_videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([video_row("processing")])))
        .mount(&backends.store)
        .await;

    let app = backends.router();
    let request = Request::builder()
        .method("GET")
        .uri("/api/video/v1")
        .header(header::AUTHORIZATION, format!("Bearer {}", token_for("u1")))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Video is not ready");
}

#[tokio::test]
async fn health_is_public() {
    let backends = TestBackends::start().await;
    let app = backends.router();

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "healthy");
}
