//! The Traceix client: one method per remote operation.
//!
//! # Design
//! `TraceixClient` holds an immutable [`ClientConfig`] and one blocking
//! reqwest client constructed up front. Every operation goes through one of
//! three request builders (no body, JSON body, multipart file), and all of
//! them converge on `perform`, which executes the POST and accumulates the
//! response body through a [`ResponseBuffer`].
//!
//! The service reports application-level failures inside the body itself, so
//! any response the transport delivers is returned to the caller verbatim,
//! whatever its status code. Only transport-level and local failures turn
//! into errors, and input validation happens before any I/O.

use std::fs::File;
use std::path::Path;

use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{drain_into, HttpRequest, RequestBody, ResponseBuffer};
use crate::types::{CidQuery, DatasetHashQuery, FullUpload, HashQuery, SearchKind, StatusQuery};

const UPLOAD_FIELD: &str = "file";
const OCTET_STREAM: &str = "application/octet-stream";

/// Blocking client for the Traceix file-analysis service.
///
/// One in-flight request per instance at a time; the configuration is
/// read-only and may be reused across sequential calls.
#[derive(Debug)]
pub struct TraceixClient {
    config: ClientConfig,
    http: reqwest::blocking::Client,
}

impl TraceixClient {
    /// Build a client from `config`.
    ///
    /// The underlying HTTP client carries the configured user agent, no
    /// request timeout, and no redirect following: a 3xx response is handed
    /// back like any other. Deadline and retry policy belong to the caller.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent())
            .timeout(None)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { config, http })
    }

    /// Build a client straight from `TRACEIX_API_KEY` and
    /// `TRACEIX_DISABLE_TELEMETRY`.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Upload a file for an AI verdict. Returns the raw JSON body.
    pub fn ai_prediction(&self, file: impl AsRef<Path>) -> Result<String, ApiError> {
        self.perform(self.build_file_post("/api/traceix/v1/upload", file.as_ref()))
    }

    /// Upload a file for capability extraction.
    pub fn capa_extraction(&self, file: impl AsRef<Path>) -> Result<String, ApiError> {
        self.perform(self.build_file_post("/api/traceix/v1/capa", file.as_ref()))
    }

    /// Upload a file for EXIF metadata extraction.
    pub fn exif_extraction(&self, file: impl AsRef<Path>) -> Result<String, ApiError> {
        self.perform(self.build_file_post("/api/traceix/v1/exif", file.as_ref()))
    }

    /// Poll an async analysis job by uuid.
    ///
    /// An empty uuid fails with [`ApiError::MissingUuid`] before any network
    /// call happens.
    pub fn check_status(&self, uuid: &str) -> Result<String, ApiError> {
        if uuid.is_empty() {
            return Err(ApiError::MissingUuid);
        }
        let request = self.build_json_post("/api/v1/traceix/status", &StatusQuery { uuid })?;
        self.perform(request)
    }

    /// Search previously analyzed samples by sha256, against the capa or
    /// exif index depending on `kind`.
    pub fn hash_search(&self, file_hash: &str, kind: SearchKind) -> Result<String, ApiError> {
        let request = self.build_json_post(kind.search_path(), &HashQuery { sha256: file_hash })?;
        self.perform(request)
    }

    /// List the public IPFS-pinned datasets.
    pub fn list_all_ipfs_datasets(&self) -> Result<String, ApiError> {
        self.perform(self.build_plain_post("/api/traceix/v1/ipfs/listall"))
    }

    /// Look up one public dataset by content identifier.
    pub fn get_public_ipfs_dataset(&self, cid: &str) -> Result<String, ApiError> {
        let request = self.build_json_post("/api/traceix/v1/ipfs/search", &CidQuery { cid })?;
        self.perform(request)
    }

    /// Find the dataset containing a file hash.
    pub fn search_ipfs_dataset_by_hash(&self, file_hash: &str) -> Result<String, ApiError> {
        let request =
            self.build_json_post("/api/traceix/v1/ipfs/find", &DatasetHashQuery { sha_hash: file_hash })?;
        self.perform(request)
    }

    /// Run AI prediction, capability extraction, and EXIF extraction on one
    /// file, in that order.
    ///
    /// All or nothing: the first failing step aborts the sequence, earlier
    /// bodies are dropped, and only the failure is returned.
    pub fn full_upload(&self, file: impl AsRef<Path>) -> Result<FullUpload, ApiError> {
        let file = file.as_ref();
        let ai = self.ai_prediction(file)?;
        let capa = self.capa_extraction(file)?;
        let exif = self.exif_extraction(file)?;
        Ok(FullUpload { ai, capa, exif })
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url(), path)
    }

    fn auth_header(&self) -> (String, String) {
        ("x-api-key".to_string(), self.config.api_key().to_string())
    }

    fn build_plain_post(&self, path: &str) -> HttpRequest {
        HttpRequest {
            url: self.url_for(path),
            headers: vec![self.auth_header()],
            body: RequestBody::Empty,
        }
    }

    fn build_json_post<T: Serialize>(&self, path: &str, payload: &T) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(payload).map_err(|e| ApiError::Internal {
            message: format!("failed to encode request body: {e}"),
        })?;
        Ok(HttpRequest {
            url: self.url_for(path),
            headers: vec![
                self.auth_header(),
                ("content-type".to_string(), "application/json".to_string()),
            ],
            body: RequestBody::Json(body),
        })
    }

    fn build_file_post(&self, path: &str, file: &Path) -> HttpRequest {
        HttpRequest {
            url: self.url_for(path),
            headers: vec![self.auth_header()],
            body: RequestBody::File {
                field: UPLOAD_FIELD.to_string(),
                path: file.to_path_buf(),
            },
        }
    }

    /// Execute a built request and hand back the accumulated body.
    fn perform(&self, request: HttpRequest) -> Result<String, ApiError> {
        tracing::debug!(url = %request.url, "dispatching request");
        let mut builder = self.http.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.body(body),
            RequestBody::File { field, path } => builder.multipart(upload_form(field, &path)?),
        };
        let mut response = builder.send().map_err(|e| {
            tracing::warn!(error = %e, "request failed");
            ApiError::from(e)
        })?;

        let mut buffer = ResponseBuffer::new();
        drain_into(&mut response, &mut buffer)?;
        tracing::debug!(bytes = buffer.len(), "response body accumulated");
        String::from_utf8(buffer.into_bytes()).map_err(|e| ApiError::Transport {
            message: format!("response body is not valid UTF-8: {e}"),
        })
    }
}

/// Build the single-field multipart form for an upload.
///
/// The part carries the file's basename and `application/octet-stream`; the
/// service identifies content by inspection, not extension.
fn upload_form(
    field: String,
    path: &Path,
) -> Result<reqwest::blocking::multipart::Form, ApiError> {
    let file = File::open(path).map_err(|e| ApiError::Transport {
        message: format!("failed to read {}: {e}", path.display()),
    })?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| UPLOAD_FIELD.to_string());
    let part = reqwest::blocking::multipart::Part::reader(file)
        .file_name(file_name)
        .mime_str(OCTET_STREAM)
        .map_err(ApiError::from)?;
    Ok(reqwest::blocking::multipart::Form::new().part(field, part))
}
