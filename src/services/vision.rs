use std::path::Path;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;

use crate::services::media_type;

/// Prompt asking for a binary keep/drop verdict on one event photo
const CURATION_PROMPT: &str = "\
Is this a good event photo worth keeping for a highlight video?\n\n\
Answer Yes ONLY if:\n\
- The subject is clear and in focus\n\
- Faces or key event elements are visible\n\
- The moment feels meaningful or memorable\n\
- Lighting and composition are acceptable\n\n\
Answer No if ANY of the following:\n\
- Blurry or out of focus\n\
- Too dark, too bright, or washed out\n\
- Accidental or irrelevant shot (floor, wall, hand, random object)\n\
- Duplicate or near-duplicate\n\
- Poor expressions (eyes closed, awkward pose)\n\n\
Reply with ONLY one word:\n\
Yes or No";

/// External collaborator returning a keep/drop decision per image
#[async_trait]
pub trait ImageClassifier: Send + Sync {
    async fn keep(&self, image: &Path) -> Result<bool>;
}

/// Vision classifier against an OpenAI-compatible chat completions endpoint
pub struct VisionClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl VisionClient {
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
impl ImageClassifier for VisionClient {
    async fn keep(&self, image: &Path) -> Result<bool> {
        let bytes = tokio::fs::read(image)
            .await
            .with_context(|| format!("read {}", image.display()))?;
        let data_url = format!("data:{};base64,{}", media_type(image), BASE64.encode(bytes));

        let body = json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "image_url", "image_url": { "url": data_url } },
                    { "type": "text", "text": CURATION_PROMPT }
                ]
            }],
            "max_tokens": 5
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("send classification request")?
            .error_for_status()
            .context("classification request rejected")?;

        let parsed: ChatResponse = response
            .json()
            .await
            .context("decode classification response")?;

        let text = parsed
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .ok_or_else(|| anyhow!("classification response had no content"))?;

        Ok(parse_verdict(text))
    }
}

/// Interpret a model reply as a keep/drop verdict
///
/// Defaults to drop when the reply is ambiguous; a photo only survives
/// curation on a clear yes.
pub fn parse_verdict(text: &str) -> bool {
    let text = text.trim().to_ascii_lowercase();
    if text.starts_with("yes") {
        return true;
    }
    if text.starts_with("no") {
        return false;
    }
    text.contains("yes") && !text.contains("no")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_verdicts() {
        assert!(parse_verdict("Yes"));
        assert!(parse_verdict("yes."));
        assert!(!parse_verdict("No"));
        assert!(!parse_verdict("  no way"));
    }

    #[test]
    fn test_embedded_verdicts() {
        assert!(parse_verdict("I would say yes"));
        assert!(!parse_verdict("could be yes or no"));
    }

    #[test]
    fn test_ambiguous_reply_drops() {
        assert!(!parse_verdict("maybe"));
        assert!(!parse_verdict(""));
    }
}
