//! Provider abstractions for image label detection.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

pub mod google;
pub mod noop;
pub mod openai;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("service error {code}: {message}")]
    Api { code: i64, message: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("missing credentials for provider: {0}")]
    MissingCredentials(String),
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
}

/// A single entity returned by a recognition service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub description: String,
    #[serde(default)]
    pub score: f32,
}

impl Label {
    pub fn new(description: impl Into<String>, score: f32) -> Self {
        Self {
            description: description.into(),
            score,
        }
    }
}

/// Given raw image bytes, return the labels the service recognised.
#[async_trait::async_trait]
pub trait LabelProvider: Send + Sync {
    async fn detect_labels(
        &self,
        image: &[u8],
        max_results: usize,
    ) -> Result<Vec<Label>, ProviderError>;
}

#[derive(Default, Clone)]
pub struct ProviderRegistry {
    labelers: HashMap<String, Arc<dyn LabelProvider>>,
    pub preferred: Option<String>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_labeler(mut self, name: &str, provider: Arc<dyn LabelProvider>) -> Self {
        self.labelers.insert(name.to_string(), provider);
        self
    }

    pub fn set_preferred(mut self, name: &str) -> Self {
        self.preferred = Some(name.to_string());
        self
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.labelers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn label_provider(
        &self,
        name: Option<&str>,
    ) -> Result<Arc<dyn LabelProvider>, ProviderError> {
        let key = name
            .map(str::to_string)
            .or_else(|| self.preferred.clone())
            .ok_or_else(|| ProviderError::UnknownProvider("no label provider configured".into()))?;
        self.labelers
            .get(&key)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownProvider(key))
    }
}
