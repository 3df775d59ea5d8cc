use crate::error::LabelerError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_OUTPUT: &str = "image_labels.txt";
pub const DEFAULT_POOL_SIZE: usize = 10;
pub const DEFAULT_MAX_RESULTS: usize = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scan: ScanConfig,
    pub output: OutputConfig,
    pub workers: WorkerConfig,
    pub provider: ProviderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub folder: String,
    pub recursive: bool,
    pub extensions: Vec<String>,
    pub exclude: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            folder: String::new(),
            recursive: false,
            extensions: vec!["jpg".into(), "jpeg".into(), "png".into()],
            exclude: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: String,
    pub append: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_OUTPUT.to_string(),
            append: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub pool_size: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// google | openai | noop
    pub name: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub max_results: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: "google".to_string(),
            api_key: None,
            base_url: None,
            model: None,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), LabelerError> {
        if self.workers.pool_size == 0 {
            return Err(LabelerError::Config("workers.pool_size must be at least 1".into()));
        }
        if self.provider.max_results == 0 {
            return Err(LabelerError::Config("provider.max_results must be at least 1".into()));
        }
        if self.scan.extensions.iter().all(|e| e.trim().is_empty()) {
            return Err(LabelerError::Config("scan.extensions must not be empty".into()));
        }
        if self.output.path.trim().is_empty() {
            return Err(LabelerError::Config("output.path must not be empty".into()));
        }
        Ok(())
    }
}

/// Defaults, then the TOML file (explicit path or optional `config/default`),
/// then `LABELER__SECTION__KEY` environment variables.
pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    settings = settings.add_source(
        config::Environment::with_prefix("LABELER")
            .separator("__")
            .try_parsing(true),
    );
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_valid_except_folder() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.workers.pool_size, 10);
        assert_eq!(cfg.provider.max_results, 10);
        assert_eq!(cfg.provider.name, "google");
        assert!(cfg.output.append);
        assert!(!cfg.scan.recursive);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_pool_is_rejected() {
        let mut cfg = AppConfig::default();
        cfg.workers.pool_size = 0;
        assert!(matches!(cfg.validate(), Err(LabelerError::Config(_))));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labeler.toml");
        fs::write(
            &path,
            "[scan]\nfolder = \"art\"\n\n[workers]\npool_size = 3\n",
        )
        .unwrap();
        let cfg = load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(cfg.scan.folder, "art");
        assert_eq!(cfg.workers.pool_size, 3);
        assert_eq!(cfg.scan.extensions, vec!["jpg", "jpeg", "png"]);
        assert_eq!(cfg.output.path, DEFAULT_OUTPUT);
    }
}
