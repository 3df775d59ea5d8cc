//! Label frequencies across a results file.

use crate::error::LabelerError;
use crate::models::OutputRecord;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

pub fn load_records(path: &Path) -> Result<Vec<OutputRecord>, LabelerError> {
    info!("Reading file: {}.", path.display());
    let content = fs::read_to_string(path).map_err(|source| LabelerError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut records = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match OutputRecord::parse(line) {
            Some(r) => records.push(r),
            None => warn!(line = idx + 1, "Unparsable record"),
        }
    }
    Ok(records)
}

/// Most frequent first; ties ordered by label.
pub fn tally<'a>(records: impl IntoIterator<Item = &'a OutputRecord>) -> Vec<LabelCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        for label in &record.labels {
            *counts.entry(label.as_str()).or_default() += 1;
        }
    }
    let mut out: Vec<LabelCount> = counts
        .into_iter()
        .map(|(label, count)| LabelCount {
            label: label.to_string(),
            count,
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    out
}

pub fn count_labels(path: &Path) -> Result<Vec<LabelCount>, LabelerError> {
    let records = load_records(path)?;
    if records.is_empty() {
        return Err(LabelerError::NoRecords(path.to_path_buf()));
    }
    Ok(tally(&records))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_labels_across_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.txt");
        fs::write(
            &path,
            "TheArsenal_1928.png: art, mural, painting\n\
             \n\
             Self_Portrait.jpg: art, painting, portrait\n\
             garbage line\n\
             blank.png:\n",
        )
        .unwrap();
        let counts = count_labels(&path).unwrap();
        let pairs: Vec<(&str, usize)> = counts.iter().map(|c| (c.label.as_str(), c.count)).collect();
        assert_eq!(
            pairs,
            vec![("art", 2), ("painting", 2), ("mural", 1), ("portrait", 1)]
        );
    }

    #[test]
    fn empty_file_has_no_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.txt");
        fs::write(&path, "\n").unwrap();
        assert!(matches!(count_labels(&path), Err(LabelerError::NoRecords(_))));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            count_labels(&dir.path().join("absent.txt")),
            Err(LabelerError::Read { .. })
        ));
    }
}
