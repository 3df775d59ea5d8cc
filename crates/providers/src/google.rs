//! Google Cloud Vision `images:annotate` adapter (LABEL_DETECTION).

use crate::{Label, LabelProvider, ProviderError};
use base64::{engine::general_purpose::STANDARD, Engine};
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://vision.googleapis.com";

#[derive(Clone)]
pub struct GoogleVisionConfig {
    pub api_key: String,
    pub base_url: String,
}

impl GoogleVisionConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct GoogleVisionProvider {
    client: Client,
    cfg: Arc<GoogleVisionConfig>,
}

impl GoogleVisionProvider {
    pub fn new(cfg: GoogleVisionConfig) -> Self {
        Self {
            client: Client::new(),
            cfg: Arc::new(cfg),
        }
    }
}

#[derive(Serialize)]
struct AnnotateRequest<'a> {
    requests: Vec<AnnotateImageRequest<'a>>,
}

#[derive(Serialize)]
struct AnnotateImageRequest<'a> {
    image: ImageContent,
    features: Vec<Feature<'a>>,
}

#[derive(Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Feature<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
pub struct AnnotateResponse {
    pub responses: Option<Vec<AnnotateImageResponse>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateImageResponse {
    #[serde(default)]
    pub label_annotations: Vec<EntityAnnotation>,
    pub error: Option<Status>,
}

#[derive(Debug, Deserialize)]
pub struct EntityAnnotation {
    pub description: Option<String>,
    pub score: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// Turns an annotate response for a single image into labels.
///
/// A missing `responses` array, or one that does not hold exactly one entry,
/// is treated as "nothing recognised" rather than a failure.
pub fn labels_from_response(resp: AnnotateResponse) -> Result<Vec<Label>, ProviderError> {
    let Some(mut responses) = resp.responses else {
        warn!("No responses found.");
        return Ok(Vec::new());
    };
    if responses.len() != 1 {
        warn!(count = responses.len(), "Unexpected number of responses.");
        return Ok(Vec::new());
    }
    let image = responses.remove(0);
    if let Some(status) = image.error {
        return Err(ProviderError::Api {
            code: status.code,
            message: status.message,
        });
    }
    let labels: Vec<Label> = image
        .label_annotations
        .into_iter()
        .filter_map(|a| {
            a.description
                .map(|d| Label::new(d, a.score.unwrap_or_default()))
        })
        .collect();
    debug!("Number of labels found: {}.", labels.len());
    Ok(labels)
}

#[async_trait::async_trait]
impl LabelProvider for GoogleVisionProvider {
    async fn detect_labels(
        &self,
        image: &[u8],
        max_results: usize,
    ) -> Result<Vec<Label>, ProviderError> {
        let body = AnnotateRequest {
            requests: vec![AnnotateImageRequest {
                image: ImageContent {
                    content: STANDARD.encode(image),
                },
                features: vec![Feature {
                    kind: "LABEL_DETECTION",
                    max_results,
                }],
            }],
        };

        let resp = self
            .client
            .post(format!("{}/v1/images:annotate", self.cfg.base_url))
            .header("x-goog-api-key", self.cfg.api_key.as_str())
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.without_url().to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.bytes().await.unwrap_or(Bytes::from_static(b""));
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        let parsed: AnnotateResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.without_url().to_string()))?;

        labels_from_response(parsed)
    }
}
