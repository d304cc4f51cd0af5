use std::path::Path;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;

use crate::services::media_type;

/// External collaborator returning transformed image bytes
#[async_trait]
pub trait ImageEditor: Send + Sync {
    async fn edit(&self, image: &Path, prompt: &str) -> Result<Vec<u8>>;
}

/// Image edit client against an OpenAI-compatible images endpoint
pub struct EditClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

#[derive(Deserialize)]
struct EditResponse {
    data: Vec<EditDatum>,
}

#[derive(Deserialize)]
struct EditDatum {
    b64_json: Option<String>,
}

impl EditClient {
    pub fn new(endpoint: String, model: String, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            model,
            api_key,
        }
    }
}

#[async_trait]
impl ImageEditor for EditClient {
    async fn edit(&self, image: &Path, prompt: &str) -> Result<Vec<u8>> {
        let bytes = tokio::fs::read(image)
            .await
            .with_context(|| format!("read {}", image.display()))?;

        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "size": "1024x1024",
            "image": format!("data:{};base64,{}", media_type(image), BASE64.encode(bytes)),
        });

        let response = self
            .http
            .post(format!("{}/images/edits", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("send image edit request")?
            .error_for_status()
            .context("image edit request rejected")?;

        let parsed: EditResponse = response.json().await.context("decode edit response")?;

        let b64 = parsed
            .data
            .first()
            .and_then(|datum| datum.b64_json.as_deref())
            .ok_or_else(|| anyhow!("edit response carried no image data"))?;

        let decoded = BASE64.decode(b64).context("decode edited image bytes")?;

        // Reject garbage before it lands in the styled directory
        image::load_from_memory(&decoded).context("edited bytes are not a decodable image")?;

        Ok(decoded)
    }
}
