use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::error::RenderError;

/// A reference image attached to a generation request
#[derive(Debug, Clone)]
pub struct ReferenceImage {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
}

/// Everything the video generation service needs for one request
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub prompt: String,
    pub model: String,
    pub duration_seconds: u32,
    pub fps: u32,
    pub reference_images: Vec<ReferenceImage>,
}

/// External collaborator producing a generated video from a prompt
#[async_trait]
pub trait VideoGenerator: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> Result<Vec<u8>, RenderError>;
}

/// Client for a long-running video generation operation
///
/// Polls at a fixed interval with a bounded attempt count; the remote's
/// own completion signal is the only thing that ends the wait early.
pub struct VideoGenClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

#[derive(Deserialize)]
struct OperationHandle {
    name: String,
}

#[derive(Deserialize)]
struct OperationStatus {
    #[serde(default)]
    done: bool,
    error: Option<RemoteError>,
    response: Option<GenerateResponse>,
}

#[derive(Deserialize)]
struct RemoteError {
    message: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(rename = "generatedVideos", alias = "videos", default)]
    generated_videos: Vec<GeneratedVideo>,
}

#[derive(Deserialize)]
struct GeneratedVideo {
    video: Option<VideoPayload>,
}

/// The wire shapes a finished operation may carry its video in
#[derive(Debug, Deserialize)]
pub struct VideoPayload {
    #[serde(rename = "bytesBase64Encoded")]
    bytes_base64: Option<String>,
    #[serde(rename = "file")]
    file_name: Option<String>,
    uri: Option<String>,
}

/// How to retrieve the video from a finished operation
#[derive(Debug, PartialEq, Eq)]
pub enum PayloadSource {
    /// Bytes delivered inline, base64-encoded
    Inline(String),
    /// Downloadable file handle on the service
    File(String),
    /// Remote URI fetchable over HTTP(S)
    HttpUri(String),
    /// Remote URI this client cannot fetch; terminal, non-retriable
    Unfetchable(String),
}

/// Decide the retrieval route for a payload, preferring inline bytes,
/// then the file handle, then a fetchable URI
pub fn payload_source(payload: &VideoPayload) -> Result<PayloadSource, RenderError> {
    if let Some(b64) = &payload.bytes_base64 {
        return Ok(PayloadSource::Inline(b64.clone()));
    }
    if let Some(name) = &payload.file_name {
        return Ok(PayloadSource::File(name.clone()));
    }
    if let Some(uri) = &payload.uri {
        if uri.starts_with("http://") || uri.starts_with("https://") {
            return Ok(PayloadSource::HttpUri(uri.clone()));
        }
        return Ok(PayloadSource::Unfetchable(uri.clone()));
    }
    Err(RenderError::MissingPayload)
}

impl VideoGenClient {
    pub fn new(
        endpoint: String,
        api_key: String,
        poll_interval: Duration,
        max_poll_attempts: u32,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            api_key,
            poll_interval,
            max_poll_attempts,
        }
    }

    async fn start(&self, request: &GenerateRequest) -> Result<OperationHandle, RenderError> {
        let references: Vec<_> = request
            .reference_images
            .iter()
            .map(|reference| {
                json!({
                    "image": {
                        "bytesBase64Encoded": BASE64.encode(&reference.bytes),
                        "mimeType": reference.mime,
                    },
                    "referenceType": "ASSET",
                })
            })
            .collect();

        let body = json!({
            "instances": [{ "prompt": request.prompt }],
            "parameters": {
                "durationSeconds": request.duration_seconds,
                "fps": request.fps,
                "referenceImages": references,
            }
        });

        let handle: OperationHandle = self
            .http
            .post(format!(
                "{}/models/{}:predictLongRunning",
                self.endpoint, request.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(handle)
    }

    async fn poll(&self, handle: &OperationHandle) -> Result<OperationStatus, RenderError> {
        let status: OperationStatus = self
            .http
            .get(format!("{}/{}", self.endpoint, handle.name))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(status)
    }

    async fn wait_for_completion(
        &self,
        handle: &OperationHandle,
    ) -> Result<OperationStatus, RenderError> {
        for attempt in 1..=self.max_poll_attempts {
            tokio::time::sleep(self.poll_interval).await;
            let status = self.poll(handle).await?;
            if status.done {
                debug!("Operation {} finished after {} polls", handle.name, attempt);
                return Ok(status);
            }
            debug!("Operation {} still running (poll {})", handle.name, attempt);
        }
        Err(RenderError::TimedOut {
            attempts: self.max_poll_attempts,
        })
    }

    async fn fetch(&self, payload: &VideoPayload) -> Result<Vec<u8>, RenderError> {
        match payload_source(payload)? {
            PayloadSource::Inline(b64) => BASE64
                .decode(b64)
                .map_err(|e| RenderError::Remote {
                    message: format!("inline video bytes were not valid base64: {e}"),
                }),
            PayloadSource::File(name) => {
                let bytes = self
                    .http
                    .get(format!("{}/{}:download", self.endpoint, name))
                    .header("x-goog-api-key", &self.api_key)
                    .send()
                    .await?
                    .error_for_status()?
                    .bytes()
                    .await?;
                Ok(bytes.to_vec())
            }
            PayloadSource::HttpUri(uri) => {
                let bytes = self
                    .http
                    .get(&uri)
                    .send()
                    .await?
                    .error_for_status()?
                    .bytes()
                    .await?;
                Ok(bytes.to_vec())
            }
            PayloadSource::Unfetchable(uri) => Err(RenderError::UnfetchableUri { uri }),
        }
    }
}

#[async_trait]
impl VideoGenerator for VideoGenClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<Vec<u8>, RenderError> {
        info!(
            "Requesting video generation ({} reference images, this may take several minutes)",
            request.reference_images.len()
        );

        let handle = self.start(request).await?;
        let status = self.wait_for_completion(&handle).await?;

        if let Some(error) = status.error {
            return Err(RenderError::Remote {
                message: error.message,
            });
        }

        let payload = status
            .response
            .and_then(|response| response.generated_videos.into_iter().next())
            .and_then(|video| video.video)
            .ok_or(RenderError::MissingPayload)?;

        self.fetch(&payload).await
    }
}
