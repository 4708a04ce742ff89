//! In-process double of the Traceix file-analysis service.
//!
//! # Design
//! Implements every route the SDK calls, with just enough state to make the
//! flows meaningful: uploads are digested and indexed by sha256, AI uploads
//! open a job keyed by a fresh uuid, and the search routes answer from that
//! index. Unknown hashes and uuids produce JSON error bodies on non-2xx
//! statuses, which the SDK hands back to callers verbatim. The exif route
//! echoes the uploaded bytes as a base64 blob, so large uploads produce
//! responses well past a megabyte for accumulation tests.
//!
//! Analysis routes require an `x-api-key` header (any non-empty value); the
//! IPFS routes are open, matching the public datasets they serve.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Multipart, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Capability names reported for every sample.
pub const CAPABILITIES: [&str; 3] = [
    "host-interaction/file-system/write",
    "data-manipulation/encoding/xor",
    "anti-analysis/packer/upx",
];

/// Datasets served by the IPFS routes: (cid, name, entries).
pub const DATASETS: [(&str, &str, u64); 2] = [
    (
        "bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi",
        "traceix-samples-2024",
        412,
    ),
    (
        "bafybeihdwdcefgh4dqkjv67uzcmw7ojee6xedzdetojuzjevtenxquvyku",
        "traceix-samples-2025",
        957,
    ),
];

/// Fixed body returned by the listall route, byte for byte.
pub const LISTALL_BODY: &str = r#"{"datasets":[{"cid":"bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi","name":"traceix-samples-2024","entries":412},{"cid":"bafybeihdwdcefgh4dqkjv67uzcmw7ojee6xedzdetojuzjevtenxquvyku","name":"traceix-samples-2025","entries":957}]}"#;

/// A registered upload.
#[derive(Clone, Debug, Serialize)]
pub struct Sample {
    pub sha256: String,
    pub filename: String,
    pub size: usize,
}

#[derive(Clone, Debug)]
struct Job {
    sha256: String,
    verdict: String,
}

#[derive(Default)]
pub struct ServiceState {
    samples: HashMap<String, Sample>,
    jobs: HashMap<String, Job>,
}

pub type Db = Arc<RwLock<ServiceState>>;

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub uuid: String,
    pub sha256: String,
    pub verdict: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct CapaResponse {
    pub sha256: String,
    pub capabilities: Vec<&'static str>,
}

/// Exif report shaped like exiftool JSON output, PascalCase keys included.
/// `ThumbnailImage` carries the uploaded bytes back as a base64 blob.
#[derive(Debug, Serialize)]
pub struct ExifResponse {
    #[serde(rename = "SourceFile")]
    pub source_file: String,
    #[serde(rename = "FileSize")]
    pub file_size: usize,
    #[serde(rename = "SHA256")]
    pub sha256: String,
    #[serde(rename = "ThumbnailImage", skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub uuid: String,
    pub status: String,
    pub sha256: String,
    pub verdict: String,
}

#[derive(Debug, Serialize)]
pub struct DatasetDetail {
    pub cid: String,
    pub name: String,
    pub entries: u64,
    pub pinned: bool,
}

#[derive(Debug, Serialize)]
pub struct FindResponse {
    pub found: bool,
    pub cid: String,
    pub sha_hash: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Deserialize)]
struct StatusQuery {
    uuid: String,
}

#[derive(Deserialize)]
struct HashQuery {
    sha256: String,
}

#[derive(Deserialize)]
struct CidQuery {
    cid: String,
}

#[derive(Deserialize)]
struct DatasetHashQuery {
    sha_hash: String,
}

type ErrorResponse = (StatusCode, Json<ErrorBody>);

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(ServiceState::default()));
    Router::new()
        .route("/api/traceix/v1/upload", post(ai_prediction))
        .route("/api/traceix/v1/capa", post(capa_extraction))
        .route("/api/traceix/v1/exif", post(exif_extraction))
        .route("/api/v1/traceix/status", post(check_status))
        .route("/api/traceix/v1/capa/search", post(capa_search))
        .route("/api/traceix/v1/exif/search", post(exif_search))
        .route("/api/traceix/v1/ipfs/listall", post(ipfs_listall))
        .route("/api/traceix/v1/ipfs/search", post(ipfs_search))
        .route("/api/traceix/v1/ipfs/find", post(ipfs_find))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn error(status: StatusCode, message: &str) -> ErrorResponse {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
}

fn require_api_key(headers: &HeaderMap) -> Result<(), ErrorResponse> {
    match headers.get("x-api-key") {
        Some(value) if !value.is_empty() => Ok(()),
        _ => Err(error(StatusCode::UNAUTHORIZED, "missing x-api-key header")),
    }
}

/// Pull the bytes out of the `file` multipart field.
async fn read_upload(mut multipart: Multipart) -> Result<(String, Vec<u8>), ErrorResponse> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| error(StatusCode::BAD_REQUEST, &format!("broken multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("upload").to_string();
            let bytes = field.bytes().await.map_err(|e| {
                error(StatusCode::BAD_REQUEST, &format!("broken multipart body: {e}"))
            })?;
            return Ok((filename, bytes.to_vec()));
        }
    }
    Err(error(StatusCode::BAD_REQUEST, "missing file field"))
}

async fn register_sample(db: &Db, filename: String, bytes: &[u8]) -> Sample {
    let sha256 = hex::encode(Sha256::digest(bytes));
    let sample = Sample {
        sha256: sha256.clone(),
        filename,
        size: bytes.len(),
    };
    db.write().await.samples.insert(sha256, sample.clone());
    sample
}

/// Deterministic verdict derived from the first hex digit of the digest.
fn verdict_for(sha256_hex: &str) -> &'static str {
    match sha256_hex.as_bytes().first() {
        Some(b) if b % 2 == 0 => "benign",
        _ => "malicious",
    }
}

async fn ai_prediction(
    State(db): State<Db>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<PredictionResponse>, ErrorResponse> {
    require_api_key(&headers)?;
    let (filename, bytes) = read_upload(multipart).await?;
    let sample = register_sample(&db, filename, &bytes).await;
    let verdict = verdict_for(&sample.sha256).to_string();
    let uuid = Uuid::new_v4().to_string();
    db.write().await.jobs.insert(
        uuid.clone(),
        Job {
            sha256: sample.sha256.clone(),
            verdict: verdict.clone(),
        },
    );
    tracing::debug!(%uuid, sha256 = %sample.sha256, "registered analysis job");
    Ok(Json(PredictionResponse {
        uuid,
        sha256: sample.sha256,
        verdict,
        status: "finished".to_string(),
    }))
}

async fn capa_extraction(
    State(db): State<Db>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<CapaResponse>, ErrorResponse> {
    require_api_key(&headers)?;
    let (filename, bytes) = read_upload(multipart).await?;
    let sample = register_sample(&db, filename, &bytes).await;
    Ok(Json(CapaResponse {
        sha256: sample.sha256,
        capabilities: CAPABILITIES.to_vec(),
    }))
}

async fn exif_extraction(
    State(db): State<Db>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<ExifResponse>, ErrorResponse> {
    require_api_key(&headers)?;
    let (filename, bytes) = read_upload(multipart).await?;
    let sample = register_sample(&db, filename, &bytes).await;
    let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
    Ok(Json(ExifResponse {
        source_file: sample.filename,
        file_size: sample.size,
        sha256: sample.sha256,
        thumbnail: Some(format!("base64:{encoded}")),
    }))
}

async fn check_status(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(query): Json<StatusQuery>,
) -> Result<Json<StatusResponse>, ErrorResponse> {
    require_api_key(&headers)?;
    let state = db.read().await;
    match state.jobs.get(&query.uuid) {
        Some(job) => Ok(Json(StatusResponse {
            uuid: query.uuid.clone(),
            status: "finished".to_string(),
            sha256: job.sha256.clone(),
            verdict: job.verdict.clone(),
        })),
        None => Err(error(StatusCode::NOT_FOUND, "unknown uuid")),
    }
}

async fn capa_search(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(query): Json<HashQuery>,
) -> Result<Json<CapaResponse>, ErrorResponse> {
    require_api_key(&headers)?;
    let state = db.read().await;
    match state.samples.get(&query.sha256) {
        Some(sample) => Ok(Json(CapaResponse {
            sha256: sample.sha256.clone(),
            capabilities: CAPABILITIES.to_vec(),
        })),
        None => Err(error(StatusCode::NOT_FOUND, "hash not found")),
    }
}

async fn exif_search(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(query): Json<HashQuery>,
) -> Result<Json<ExifResponse>, ErrorResponse> {
    require_api_key(&headers)?;
    let state = db.read().await;
    match state.samples.get(&query.sha256) {
        Some(sample) => Ok(Json(ExifResponse {
            source_file: sample.filename.clone(),
            file_size: sample.size,
            sha256: sample.sha256.clone(),
            thumbnail: None,
        })),
        None => Err(error(StatusCode::NOT_FOUND, "hash not found")),
    }
}

async fn ipfs_listall() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], LISTALL_BODY)
}

async fn ipfs_search(Json(query): Json<CidQuery>) -> Result<Json<DatasetDetail>, ErrorResponse> {
    match DATASETS.iter().find(|(cid, _, _)| *cid == query.cid) {
        Some((cid, name, entries)) => Ok(Json(DatasetDetail {
            cid: cid.to_string(),
            name: name.to_string(),
            entries: *entries,
            pinned: true,
        })),
        None => Err(error(StatusCode::NOT_FOUND, "unknown cid")),
    }
}

async fn ipfs_find(
    State(db): State<Db>,
    Json(query): Json<DatasetHashQuery>,
) -> Result<Json<FindResponse>, ErrorResponse> {
    let state = db.read().await;
    if state.samples.contains_key(&query.sha_hash) {
        Ok(Json(FindResponse {
            found: true,
            cid: DATASETS[0].0.to_string(),
            sha_hash: query.sha_hash,
        }))
    } else {
        Err(error(StatusCode::NOT_FOUND, "hash not in any dataset"))
    }
}
