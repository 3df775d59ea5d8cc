use providers::ProviderError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LabelerError {
    #[error("invalid folder: {0:?}")]
    InvalidFolder(String),
    #[error("folder not found: {}", .0.display())]
    FolderNotFound(PathBuf),
    #[error("invalid exclude pattern: {0}")]
    Pattern(#[from] globset::Error),
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Service(#[from] ProviderError),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("no records found in {}", .0.display())]
    NoRecords(PathBuf),
    #[error("worker task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
