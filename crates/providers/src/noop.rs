use crate::{Label, LabelProvider, ProviderError};

/// Recognises nothing. Useful for exercising a scan without network calls.
#[derive(Debug, Default)]
pub struct NoopProvider;

#[async_trait::async_trait]
impl LabelProvider for NoopProvider {
    async fn detect_labels(
        &self,
        _image: &[u8],
        _max_results: usize,
    ) -> Result<Vec<Label>, ProviderError> {
        Ok(Vec::new())
    }
}
