use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::BackendConfig;
use crate::error::VoxloopError;
use crate::selection::FileCandidate;

/// Upload endpoint, relative to the base URL
const PROCESS_ENDPOINT: &str = "process_audio";

/// Header that suppresses the interstitial page some tunnelling proxies
/// serve before forwarding a request. Only the upload carries it.
const PROXY_BYPASS_HEADER: &str = "ngrok-skip-browser-warning";

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessResponse {
    /// Path of the synthesized reply, relative to the base URL
    pub response_audio_url: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

/// Trim surrounding whitespace and a single trailing slash. An empty value
/// is a validation error, not a default.
pub fn normalize_base_url(raw: &str) -> Result<String, VoxloopError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(VoxloopError::Validation(
            "Backend URL is not configured. Set backend.base_url or pass --backend-url."
                .to_string(),
        ));
    }
    Ok(trimmed.strip_suffix('/').unwrap_or(trimmed).to_string())
}

/// Message for a non-2xx response: the error body's `detail` when it parses,
/// else a status-coded fallback.
pub fn server_error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .unwrap_or_else(|| format!("Server error: {}", status))
}

pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self, VoxloopError> {
        let base_url = normalize_base_url(&config.base_url)?;

        let mut builder = reqwest::Client::builder();
        if config.request_timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(config.request_timeout_ms));
        }

        let client = builder
            .build()
            .map_err(|e| VoxloopError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of a reply resource. The base is pre-normalized, so the
    /// join never produces a double slash on its side; the relative path is
    /// used verbatim.
    pub fn audio_url(&self, relative: &str) -> String {
        format!("{}/{}", self.base_url, relative)
    }

    /// One multipart POST carrying the staged recording. No retry, no
    /// cancellation; the caller decides what a failure means.
    pub async fn process_audio(
        &self,
        candidate: &FileCandidate,
    ) -> Result<ProcessResponse, VoxloopError> {
        let bytes = tokio::fs::read(&candidate.path).await.map_err(|e| {
            VoxloopError::Validation(format!("Cannot read {}: {}", candidate.path.display(), e))
        })?;

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(candidate.name.clone())
            .mime_str(&candidate.mime)
            .map_err(|e| VoxloopError::Transport(format!("invalid MIME type: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("audio_file", part);

        let url = format!("{}/{}", self.base_url, PROCESS_ENDPOINT);
        info!(
            "Uploading {} ({} bytes) to {}",
            candidate.name, candidate.size, url
        );

        let response = self
            .client
            .post(&url)
            .header(PROXY_BYPASS_HEADER, "true")
            .multipart(form)
            .send()
            .await
            .map_err(|e| VoxloopError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VoxloopError::Server(server_error_message(
                status.as_u16(),
                &body,
            )));
        }

        let body: ProcessResponse = response
            .json()
            .await
            .map_err(|e| VoxloopError::Transport(format!("failed to parse response: {}", e)))?;

        debug!("Backend reply audio at {}", body.response_audio_url);
        Ok(body)
    }

    /// Secondary fetch of the reply audio. Plain GET, no extra headers.
    pub async fn fetch_audio(&self, relative: &str) -> Result<Vec<u8>, VoxloopError> {
        let url = self.audio_url(relative);
        info!("Fetching reply audio from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| VoxloopError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VoxloopError::Server(format!(
                "Server error: {}",
                status.as_u16()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| VoxloopError::Transport(format!("failed to read reply audio: {}", e)))?;

        Ok(bytes.to_vec())
    }
}
