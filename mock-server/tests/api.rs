use axum::body::Body;
use axum::http::{self, Request, StatusCode};
use base64::Engine as _;
use http_body_util::BodyExt;
use mock_server::{app, CAPABILITIES, DATASETS, LISTALL_BODY};
use sha2::{Digest, Sha256};
use tower::ServiceExt;

const BOUNDARY: &str = "traceix-test-boundary";

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .header("x-api-key", "test-key")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_body(field: &str, filename: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(uri: &str, field: &str, filename: &str, content: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            http::header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header("x-api-key", "test-key")
        .body(Body::from(multipart_body(field, filename, content)))
        .unwrap()
}

// --- auth ---

#[tokio::test]
async fn upload_without_api_key_is_rejected() {
    let app = app();
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/traceix/v1/upload")
                .header(
                    http::header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(multipart_body("file", "a.bin", b"payload")))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let json: serde_json::Value = body_json(resp).await;
    assert_eq!(json["error"], "missing x-api-key header");
}

#[tokio::test]
async fn listall_does_not_require_an_api_key() {
    let app = app();
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/traceix/v1/ipfs/listall")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
}

// --- uploads ---

#[tokio::test]
async fn upload_returns_a_finished_job() {
    let content = b"malware sample bytes";
    let app = app();
    let resp = app
        .oneshot(upload_request(
            "/api/traceix/v1/upload",
            "file",
            "sample.exe",
            content,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json: serde_json::Value = body_json(resp).await;
    assert!(uuid::Uuid::parse_str(json["uuid"].as_str().unwrap()).is_ok());
    assert_eq!(json["sha256"], hex::encode(Sha256::digest(content)));
    assert_eq!(json["status"], "finished");
}

#[tokio::test]
async fn upload_without_a_file_field_is_400() {
    let app = app();
    let resp = app
        .oneshot(upload_request(
            "/api/traceix/v1/capa",
            "data",
            "sample.exe",
            b"payload",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json: serde_json::Value = body_json(resp).await;
    assert_eq!(json["error"], "missing file field");
}

#[tokio::test]
async fn exif_echoes_the_uploaded_bytes() {
    let content = b"not really a jpeg";
    let app = app();
    let resp = app
        .oneshot(upload_request(
            "/api/traceix/v1/exif",
            "file",
            "photo.jpg",
            content,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json: serde_json::Value = body_json(resp).await;
    assert_eq!(json["SourceFile"], "photo.jpg");
    assert_eq!(json["FileSize"], content.len());
    let expected = format!(
        "base64:{}",
        base64::engine::general_purpose::STANDARD.encode(content)
    );
    assert_eq!(json["ThumbnailImage"], expected);
}

// --- status and searches ---

#[tokio::test]
async fn status_for_an_unknown_uuid_is_404() {
    let app = app();
    let resp = app
        .oneshot(json_request(
            "/api/v1/traceix/status",
            r#"{"uuid":"00000000-0000-0000-0000-000000000000"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let json: serde_json::Value = body_json(resp).await;
    assert_eq!(json["error"], "unknown uuid");
}

#[tokio::test]
async fn capa_search_for_an_unknown_hash_is_404() {
    let app = app();
    let resp = app
        .oneshot(json_request(
            "/api/traceix/v1/capa/search",
            r#"{"sha256":"ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let json: serde_json::Value = body_json(resp).await;
    assert_eq!(json["error"], "hash not found");
}

// --- ipfs ---

#[tokio::test]
async fn listall_returns_the_fixed_body() {
    let app = app();
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/traceix/v1/ipfs/listall")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[http::header::CONTENT_TYPE],
        "application/json"
    );
    assert_eq!(body_bytes(resp).await, LISTALL_BODY.as_bytes());
}

#[tokio::test]
async fn ipfs_search_finds_a_known_cid() {
    let (cid, name, entries) = DATASETS[1];
    let app = app();
    let resp = app
        .oneshot(json_request(
            "/api/traceix/v1/ipfs/search",
            &format!(r#"{{"cid":"{cid}"}}"#),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json: serde_json::Value = body_json(resp).await;
    assert_eq!(json["name"], name);
    assert_eq!(json["entries"], entries);
}

#[tokio::test]
async fn ipfs_search_for_an_unknown_cid_is_404() {
    let app = app();
    let resp = app
        .oneshot(json_request(
            "/api/traceix/v1/ipfs/search",
            r#"{"cid":"bafybeinosuchdataset"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let json: serde_json::Value = body_json(resp).await;
    assert_eq!(json["error"], "unknown cid");
}

// --- full analysis lifecycle ---

#[tokio::test]
async fn analysis_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();
    let content = b"lifecycle sample";
    let sha256 = hex::encode(Sha256::digest(content));

    // upload for an AI verdict
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(upload_request(
            "/api/traceix/v1/upload",
            "file",
            "lifecycle.bin",
            content,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let created: serde_json::Value = body_json(resp).await;
    assert_eq!(created["sha256"], sha256.as_str());
    let uuid = created["uuid"].as_str().unwrap().to_string();
    let verdict = created["verdict"].as_str().unwrap().to_string();

    // poll the job by uuid
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "/api/v1/traceix/status",
            &format!(r#"{{"uuid":"{uuid}"}}"#),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let status: serde_json::Value = body_json(resp).await;
    assert_eq!(status["uuid"], uuid.as_str());
    assert_eq!(status["status"], "finished");
    assert_eq!(status["sha256"], sha256.as_str());
    assert_eq!(status["verdict"], verdict.as_str());

    // the upload is now searchable by hash
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "/api/traceix/v1/capa/search",
            &format!(r#"{{"sha256":"{sha256}"}}"#),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let capa: serde_json::Value = body_json(resp).await;
    assert_eq!(capa["capabilities"].as_array().unwrap().len(), CAPABILITIES.len());

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "/api/traceix/v1/exif/search",
            &format!(r#"{{"sha256":"{sha256}"}}"#),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let exif: serde_json::Value = body_json(resp).await;
    assert_eq!(exif["SourceFile"], "lifecycle.bin");
    assert!(exif.get("ThumbnailImage").is_none());

    // and visible to the dataset lookup
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "/api/traceix/v1/ipfs/find",
            &format!(r#"{{"sha_hash":"{sha256}"}}"#),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let found: serde_json::Value = body_json(resp).await;
    assert_eq!(found["found"], true);
    assert_eq!(found["cid"], DATASETS[0].0);
}
