use crate::error::LabelerError;
use crate::models::{ImagePath, LabelResult};
use crate::output::RecordSink;
use providers::LabelProvider;
use std::sync::Arc;
use tokio::task;
use tracing::debug;

/// Reads the image and asks the provider for its labels.
pub async fn extract_labels(
    image: &ImagePath,
    provider: &dyn LabelProvider,
    max_results: usize,
) -> Result<LabelResult, LabelerError> {
    let bytes = tokio::fs::read(image.path())
        .await
        .map_err(|source| LabelerError::Read {
            path: image.path().to_path_buf(),
            source,
        })?;
    let labels = provider.detect_labels(&bytes, max_results).await?;
    debug!(file = %image.file_name(), labels = labels.len(), "Labels extracted");
    Ok(LabelResult {
        image: image.clone(),
        labels,
    })
}

/// Extracts labels and appends the image's record to `sink`.
/// Nothing is written when extraction fails.
pub async fn label_image(
    image: &ImagePath,
    provider: &dyn LabelProvider,
    max_results: usize,
    sink: Arc<dyn RecordSink>,
) -> Result<LabelResult, LabelerError> {
    let result = extract_labels(image, provider, max_results).await?;
    let record = result.to_record();
    task::spawn_blocking(move || sink.append(&record)).await??;
    Ok(result)
}
