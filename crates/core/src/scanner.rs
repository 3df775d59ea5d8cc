//! Lists a folder and keeps the files whose extension marks them as images.

use crate::config::ScanConfig;
use crate::error::LabelerError;
use crate::models::ImagePath;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Returns the images under `cfg.folder`, sorted by path.
///
/// Only the folder itself is listed unless `cfg.recursive` is set. Hidden
/// entries and paths matching `cfg.exclude` are skipped.
pub fn scan(cfg: &ScanConfig) -> Result<Vec<ImagePath>, LabelerError> {
    if cfg.folder.trim().is_empty() {
        return Err(LabelerError::InvalidFolder(cfg.folder.clone()));
    }
    let root = PathBuf::from(&cfg.folder);
    if !root.is_dir() {
        return Err(LabelerError::FolderNotFound(root));
    }

    info!("Reading folder: {}.", root.display());
    let exclude_set = build_globset(&cfg.exclude)?;
    let allowed = allowed_extensions(&cfg.extensions);
    let max_depth = if cfg.recursive { usize::MAX } else { 1 };

    let mut images = Vec::new();
    for entry in WalkDir::new(&root)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(true)
        .into_iter()
        // The root itself may be hidden (temp dirs often are); only filter below it.
        .filter_entry(|e| e.depth() == 0 || should_descend(e.path(), &exclude_set))
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let image = ImagePath::new(entry.path());
        if image
            .extension()
            .map(|ext| allowed.contains(&ext))
            .unwrap_or(false)
        {
            images.push(image);
        }
    }
    images.sort();

    info!("Found {} images in folder: {}", images.len(), root.display());
    Ok(images)
}

fn allowed_extensions(extensions: &[String]) -> HashSet<String> {
    extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, LabelerError> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(Glob::new(pat)?);
    }
    Ok(builder.build()?)
}

fn should_descend(path: &Path, excludes: &GlobSet) -> bool {
    !is_hidden(path) && !excludes.is_match(path)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}
