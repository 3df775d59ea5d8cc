use crate::{Label, LabelProvider, ProviderError};
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

/// Label detection through an OpenAI-compatible chat endpoint with vision input.
#[derive(Clone)]
pub struct OpenAiVisionProvider {
    client: Client,
    cfg: Arc<OpenAiConfig>,
}

impl OpenAiVisionProvider {
    pub fn new(cfg: OpenAiConfig) -> Self {
        Self {
            client: Client::new(),
            cfg: Arc::new(cfg),
        }
    }
}

#[derive(Deserialize)]
struct LabelList {
    #[serde(default)]
    labels: Vec<Label>,
}

fn prompt(max_results: usize) -> String {
    format!(
        "List at most {max_results} entities visible in this image, most prominent first. \
         Reply with JSON only: {{\"labels\":[{{\"description\":\"<label>\",\"score\":<0..1>}}]}}"
    )
}

fn sniff_mime(image: &[u8]) -> &'static str {
    if image.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if image.starts_with(b"\x89PNG") {
        "image/png"
    } else {
        "application/octet-stream"
    }
}

/// Parses the assistant reply, tolerating a fenced code block around the JSON.
pub fn labels_from_reply(content: &str, max_results: usize) -> Result<Vec<Label>, ProviderError> {
    let trimmed = content.trim();
    let json = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();
    let parsed: LabelList =
        serde_json::from_str(json).map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
    Ok(parsed
        .labels
        .into_iter()
        .filter(|l| !l.description.trim().is_empty())
        .take(max_results)
        .collect())
}

#[async_trait::async_trait]
impl LabelProvider for OpenAiVisionProvider {
    async fn detect_labels(
        &self,
        image: &[u8],
        max_results: usize,
    ) -> Result<Vec<Label>, ProviderError> {
        #[derive(Deserialize)]
        struct Choice {
            message: ChatMessageResp,
        }
        #[derive(Deserialize)]
        struct ChatMessageResp {
            content: Option<String>,
        }
        #[derive(Deserialize)]
        struct ChatApiResponse {
            choices: Vec<Choice>,
        }

        let data_url = format!("data:{};base64,{}", sniff_mime(image), STANDARD.encode(image));
        let body = serde_json::json!({
            "model": self.cfg.model,
            "response_format": { "type": "json_object" },
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": prompt(max_results) },
                    { "type": "image_url", "image_url": { "url": data_url } }
                ]
            }]
        });

        let resp = self
            .client
            .post(format!("{}/v1/chat/completions", self.cfg.base_url))
            .bearer_auth(&self.cfg.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.without_url().to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatApiResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.without_url().to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::InvalidResponse("empty completion".into()))?;

        labels_from_reply(&content, max_results)
    }
}
