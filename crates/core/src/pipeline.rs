use crate::config::{AppConfig, ProviderConfig};
use crate::error::LabelerError;
use crate::models::ImagePath;
use crate::output::{RecordSink, ResultWriter};
use crate::{extractor, scanner};
use futures::stream::{self, StreamExt};
use providers::google::{GoogleVisionConfig, GoogleVisionProvider};
use providers::noop::NoopProvider;
use providers::openai::{OpenAiConfig, OpenAiVisionProvider};
use providers::{LabelProvider, ProviderError, ProviderRegistry};
use serde::Serialize;
use std::sync::Arc;
use tokio::task;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub discovered: usize,
    pub written: usize,
    pub failed: usize,
    pub write_failed: usize,
}

enum Outcome {
    Written,
    Failed,
    WriteFailed,
}

/// Scans, labels every image through the configured provider, and writes
/// the results file.
pub async fn run(config: &AppConfig) -> Result<RunSummary, LabelerError> {
    config.validate()?;
    let provider = resolve_provider(&config.provider)?;
    run_with_provider(config, provider).await
}

pub async fn run_with_provider(
    config: &AppConfig,
    provider: Arc<dyn LabelProvider>,
) -> Result<RunSummary, LabelerError> {
    config.validate()?;

    info!("Starting scan phase...");
    let scan_cfg = config.scan.clone();
    let images = task::spawn_blocking(move || scanner::scan(&scan_cfg)).await??;

    let writer = Arc::new(ResultWriter::open(&config.output.path, config.output.append)?);
    info!(
        images = images.len(),
        pool_size = config.workers.pool_size,
        output = %writer.path().display(),
        "Starting labeling phase..."
    );
    let summary = process_images(
        images,
        provider,
        writer,
        config.workers.pool_size,
        config.provider.max_results,
    )
    .await;
    info!(
        written = summary.written,
        failed = summary.failed,
        write_failed = summary.write_failed,
        "Labeling complete."
    );
    Ok(summary)
}

/// Labels `images` with at most `pool_size` provider calls in flight.
/// A failing image is logged and skipped; the rest still run.
pub async fn process_images(
    images: Vec<ImagePath>,
    provider: Arc<dyn LabelProvider>,
    sink: Arc<dyn RecordSink>,
    pool_size: usize,
    max_results: usize,
) -> RunSummary {
    let mut summary = RunSummary {
        discovered: images.len(),
        ..RunSummary::default()
    };

    let outcomes: Vec<Outcome> = stream::iter(images)
        .map(|image| {
            let provider = provider.clone();
            let sink = sink.clone();
            async move {
                match extractor::label_image(&image, provider.as_ref(), max_results, sink).await {
                    Ok(result) => {
                        debug!(file = %image.file_name(), labels = result.labels.len(), "Record written");
                        Outcome::Written
                    }
                    Err(e @ LabelerError::Write { .. }) => {
                        warn!(file = %image.file_name(), error = %e, "Failed to write record");
                        Outcome::WriteFailed
                    }
                    Err(e) => {
                        warn!(file = %image.file_name(), error = %e, "Skipping image");
                        Outcome::Failed
                    }
                }
            }
        })
        .buffer_unordered(pool_size.max(1))
        .collect()
        .await;

    for outcome in outcomes {
        match outcome {
            Outcome::Written => summary.written += 1,
            Outcome::Failed => summary.failed += 1,
            Outcome::WriteFailed => summary.write_failed += 1,
        }
    }
    summary
}

pub fn build_registry(config: &ProviderConfig) -> ProviderRegistry {
    let mut reg = ProviderRegistry::new().with_labeler("noop", Arc::new(NoopProvider));

    if let Some(key) = api_key_for(config, "google", "GOOGLE_API_KEY") {
        let mut cfg = GoogleVisionConfig::new(key);
        if config.name == "google" {
            if let Some(base) = &config.base_url {
                cfg.base_url = base.trim_end_matches('/').to_string();
            }
        }
        reg = reg.with_labeler("google", Arc::new(GoogleVisionProvider::new(cfg)));
    }

    if let Some(key) = api_key_for(config, "openai", "OPENAI_API_KEY") {
        let mut base_url = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| providers::openai::DEFAULT_BASE_URL.to_string());
        let mut model = providers::openai::DEFAULT_MODEL.to_string();
        if config.name == "openai" {
            if let Some(base) = &config.base_url {
                base_url = base.clone();
            }
            if let Some(m) = &config.model {
                model = m.clone();
            }
        }
        let provider = OpenAiVisionProvider::new(OpenAiConfig {
            api_key: key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        });
        reg = reg.with_labeler("openai", Arc::new(provider));
    }

    reg.set_preferred(&config.name)
}

/// Picks the configured provider, reporting absent credentials distinctly
/// from an unknown provider name.
pub fn resolve_provider(config: &ProviderConfig) -> Result<Arc<dyn LabelProvider>, LabelerError> {
    let registry = build_registry(config);
    match registry.label_provider(Some(&config.name)) {
        Ok(p) => Ok(p),
        Err(ProviderError::UnknownProvider(name)) if matches!(name.as_str(), "google" | "openai") => {
            Err(ProviderError::MissingCredentials(name).into())
        }
        Err(e) => Err(e.into()),
    }
}

fn api_key_for(config: &ProviderConfig, name: &str, env_var: &str) -> Option<String> {
    config
        .api_key
        .clone()
        .filter(|_| config.name == name)
        .or_else(|| std::env::var(env_var).ok())
        .filter(|k| !k.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_needs_no_credentials() {
        let cfg = ProviderConfig {
            name: "noop".into(),
            ..ProviderConfig::default()
        };
        assert!(resolve_provider(&cfg).is_ok());
    }

    #[test]
    fn explicit_key_enables_google() {
        let cfg = ProviderConfig {
            name: "google".into(),
            api_key: Some("k".into()),
            ..ProviderConfig::default()
        };
        assert!(build_registry(&cfg).names().contains(&"google".to_string()));
        assert!(resolve_provider(&cfg).is_ok());
    }

    #[test]
    fn unknown_name_is_reported() {
        let cfg = ProviderConfig {
            name: "rekognition".into(),
            ..ProviderConfig::default()
        };
        assert!(matches!(
            resolve_provider(&cfg),
            Err(LabelerError::Service(ProviderError::UnknownProvider(n))) if n == "rekognition"
        ));
    }
}
