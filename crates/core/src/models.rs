use providers::Label;
use std::fmt;
use std::path::{Path, PathBuf};

/// An image file found by the scanner.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImagePath {
    path: PathBuf,
}

impl ImagePath {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Lowercased extension without the dot.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase())
    }
}

#[derive(Debug, Clone)]
pub struct LabelResult {
    pub image: ImagePath,
    pub labels: Vec<Label>,
}

impl LabelResult {
    pub fn to_record(&self) -> OutputRecord {
        OutputRecord {
            file_name: self.image.file_name(),
            labels: self.labels.iter().map(|l| l.description.clone()).collect(),
        }
    }
}

/// One line of the results file: `file_name: label1, label2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRecord {
    pub file_name: String,
    pub labels: Vec<String>,
}

impl OutputRecord {
    /// Reads a rendered line back. The label list starts after the last
    /// `": "`, so file names may contain `": "` but labels may not.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (name, rest) = match line.strip_suffix(':') {
            Some(name) => (name, ""),
            None => line.rsplit_once(": ")?,
        };
        if name.is_empty() {
            return None;
        }
        let labels = rest
            .split(", ")
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        Some(Self {
            file_name: name.to_string(),
            labels,
        })
    }
}

impl fmt::Display for OutputRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.labels.is_empty() {
            write!(f, "{}:", self.file_name)
        } else {
            write!(f, "{}: {}", self.file_name, self.labels.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_renders_basename_and_labels() {
        let result = LabelResult {
            image: ImagePath::new("/art/cat.jpg"),
            labels: vec![Label::new("cat", 0.9), Label::new("animal", 0.8)],
        };
        assert_eq!(result.to_record().to_string(), "cat.jpg: cat, animal");
    }

    #[test]
    fn record_without_labels_keeps_the_colon() {
        let record = OutputRecord {
            file_name: "blank.png".into(),
            labels: vec![],
        };
        assert_eq!(record.to_string(), "blank.png:");
        assert_eq!(OutputRecord::parse("blank.png:"), Some(record));
    }

    #[test]
    fn parse_reads_rendered_lines() {
        let record = OutputRecord::parse("TheArsenal_1928.png: art, mural, painting\n").unwrap();
        assert_eq!(record.file_name, "TheArsenal_1928.png");
        assert_eq!(record.labels, vec!["art", "mural", "painting"]);
        assert_eq!(OutputRecord::parse("no separator"), None);
        assert_eq!(OutputRecord::parse(": orphan"), None);
    }

    #[test]
    fn file_names_with_separator_read_back() {
        let record = OutputRecord {
            file_name: "Act 1: Scene 2.png".into(),
            labels: vec!["stage".into(), "theatre".into()],
        };
        assert_eq!(OutputRecord::parse(&record.to_string()), Some(record));

        let bare = OutputRecord {
            file_name: "Act 1: Scene 3.png".into(),
            labels: vec![],
        };
        assert_eq!(OutputRecord::parse(&bare.to_string()), Some(bare));
    }

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(ImagePath::new("a/B.JPG").extension().as_deref(), Some("jpg"));
        assert_eq!(ImagePath::new("a/README").extension(), None);
    }
}
