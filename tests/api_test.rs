//! End-to-end tests driving the real router over in-memory requests.
//! Each test gets its own temp upload/public directories, so tests are
//! independent and can run in parallel.

use audio_host::{MediaLibrary, create_app};
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::path::PathBuf;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "x-test-boundary-7MA4YWxkTrZu0gW";
const ONE_MIB: usize = 1024 * 1024;

struct TestEnv {
    app: Router,
    upload_dir: PathBuf,
    public_dir: PathBuf,
    // Held so the directories outlive the test body.
    _root: TempDir,
}

fn setup() -> TestEnv {
    setup_with_limit(ONE_MIB)
}

fn setup_with_limit(max_upload_bytes: usize) -> TestEnv {
    let root = tempfile::tempdir().expect("create temp root");
    let upload_dir = root.path().join("uploads");
    let public_dir = root.path().join("public");
    std::fs::create_dir_all(&upload_dir).unwrap();
    std::fs::create_dir_all(&public_dir).unwrap();

    let library = MediaLibrary::new(&upload_dir, &public_dir);
    TestEnv {
        app: create_app(library, max_upload_bytes),
        upload_dir,
        public_dir,
        _root: root,
    }
}

fn multipart_file_body(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; \
             filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_text_body(field: &str, value: &str) -> Vec<u8> {
    format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"\r\n\r\n\
         {value}\r\n--{BOUNDARY}--\r\n"
    )
    .into_bytes()
}

fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn upload_dir_entries(dir: &PathBuf) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Pull the stored filename out of the success fragment's access link.
fn stored_name_from(html: &str) -> String {
    let start = html.find("/uploads/").expect("access link present") + "/uploads/".len();
    let rest = &html[start..];
    let end = rest.find('"').expect("closing quote");
    rest[..end].to_string()
}

#[tokio::test]
async fn upload_and_fetch_round_trip() {
    let env = setup();
    let payload = b"0123456789";

    let response = env
        .app
        .clone()
        .oneshot(upload_request(multipart_file_body(
            "audioFile",
            "clip.wav",
            "audio/wav",
            payload,
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    let stored_name = stored_name_from(&html);
    assert!(stored_name.ends_with("-clip.wav"), "got `{stored_name}`");
    let (prefix, _) = stored_name.split_once('-').unwrap();
    assert!(prefix.chars().all(|c| c.is_ascii_digit()));

    let response = env
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/uploads/{stored_name}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "audio/wav"
    );
    assert_eq!(
        response.headers().get(header::CONTENT_LENGTH).unwrap(),
        &payload.len().to_string()
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(bytes.as_ref(), payload);
}

#[tokio::test]
async fn upload_without_file_field_is_rejected() {
    let env = setup();

    let response = env
        .app
        .clone()
        .oneshot(upload_request(multipart_text_body("note", "not a file")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let html = body_string(response).await;
    assert!(html.contains("No file uploaded"), "got: {html}");
    assert!(upload_dir_entries(&env.upload_dir).is_empty());
}

#[tokio::test]
async fn upload_with_disallowed_extension_persists_nothing() {
    let env = setup();
    let before = upload_dir_entries(&env.upload_dir);

    let response = env
        .app
        .clone()
        .oneshot(upload_request(multipart_file_body(
            "audioFile",
            "script.exe",
            "application/octet-stream",
            b"MZ\x90\x00",
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let html = body_string(response).await;
    assert!(html.contains("Unsupported format"), "got: {html}");
    assert_eq!(upload_dir_entries(&env.upload_dir), before);
}

#[tokio::test]
async fn client_declared_mime_type_is_advisory_only() {
    // A forged audio/mpeg content-type on a .txt file must not get it in.
    let env = setup();

    let response = env
        .app
        .clone()
        .oneshot(upload_request(multipart_file_body(
            "audioFile",
            "lyrics.txt",
            "audio/mpeg",
            b"la la la",
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(upload_dir_entries(&env.upload_dir).is_empty());
}

#[tokio::test]
async fn oversize_upload_is_rejected_without_persisting() {
    let env = setup_with_limit(1024);
    let big = vec![0u8; 4096];

    let response = env
        .app
        .clone()
        .oneshot(upload_request(multipart_file_body(
            "audioFile",
            "big.mp3",
            "audio/mpeg",
            &big,
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(upload_dir_entries(&env.upload_dir).is_empty());
}

#[tokio::test]
async fn file_list_reflects_uploads_and_is_idempotent() {
    let env = setup();

    let response = env
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/file-list")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listing: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(listing, Value::Array(vec![]));

    let response = env
        .app
        .clone()
        .oneshot(upload_request(multipart_file_body(
            "audioFile",
            "song.mp3",
            "audio/mpeg",
            b"ID3\x04",
        )))
        .await
        .unwrap();
    let stored_name = stored_name_from(&body_string(response).await);

    let mut listings = Vec::new();
    for _ in 0..2 {
        let response = env
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/file-list")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let names: Vec<String> = serde_json::from_str(&body_string(response).await).unwrap();
        listings.push(names);
    }
    assert_eq!(listings[0], listings[1]);
    assert_eq!(listings[0], vec![stored_name]);
}

#[tokio::test]
async fn missing_upload_returns_404() {
    let env = setup();

    let response = env
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/uploads/does-not-exist.mp3")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn traversal_attempts_are_rejected() {
    let env = setup();
    std::fs::write(env.public_dir.join("style.css"), "body{}").unwrap();

    for uri in ["/uploads/..%2F..%2Fetc%2Fpasswd", "/uploads/..%5Cboot.ini"] {
        let response = env
            .app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "uri {uri}");
    }

    let response = env
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/public/..%2Fuploads%2Fanything.mp3")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn public_assets_are_served_with_content_type() {
    let env = setup();
    std::fs::write(env.public_dir.join("style.css"), "body { margin: 0 }").unwrap();

    let response = env
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/public/style.css")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/css"
    );

    let response = env
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/public/missing.css")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn index_page_lists_uploads_with_players() {
    let env = setup();

    let response = env
        .app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("name=\"audioFile\""));
    assert!(html.contains("No files uploaded yet"));

    let response = env
        .app
        .clone()
        .oneshot(upload_request(multipart_file_body(
            "audioFile",
            "take.ogg",
            "audio/ogg",
            b"OggS",
        )))
        .await
        .unwrap();
    let stored_name = stored_name_from(&body_string(response).await);

    let response = env
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/index.html")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let html = body_string(response).await;
    assert!(html.contains("<audio controls"));
    assert!(html.contains(&stored_name));
}

#[tokio::test]
async fn unknown_routes_fall_back_to_404() {
    let env = setup();

    for method in ["GET", "POST"] {
        let response = env
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri("/unknown-route")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "method {method}");
    }

    // Matched path, wrong method.
    let response = env
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/upload")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn health_endpoints_respond() {
    let env = setup();

    let response = env
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = env
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/readyz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["status"], "ok");
}
