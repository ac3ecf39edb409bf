//! Reading per-image label files into annotation records.

pub mod discovery;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::emotion::Emotion;
use crate::error::{PipelineError, Result};

pub use discovery::label_files;

/// One accepted label file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRecord {
    pub image_id: String,
    pub class_index: u8,
    pub true_emotion: Emotion,
}

/// Reads label files from one directory.
///
/// Every call to [`AnnotationReader::records`] starts a fresh pass over the
/// directory.
#[derive(Debug, Clone)]
pub struct AnnotationReader {
    directory: PathBuf,
    max_records: usize,
}

impl AnnotationReader {
    pub fn new(directory: impl Into<PathBuf>, max_records: usize) -> Self {
        Self {
            directory: directory.into(),
            max_records,
        }
    }

    /// Start a pass over the label directory.
    ///
    /// Fails only when the directory itself is missing; unreadable or invalid
    /// files are skipped while iterating.
    pub fn records(&self) -> Result<Records> {
        if !self.directory.is_dir() {
            return Err(PipelineError::Configuration(format!(
                "label directory not found: {}",
                self.directory.display()
            )));
        }

        Ok(Records {
            files: Box::new(label_files(&self.directory)),
            remaining: self.max_records,
        })
    }
}

/// Lazy sequence of accepted records, capped at the reader's maximum.
pub struct Records {
    files: Box<dyn Iterator<Item = PathBuf>>,
    remaining: usize,
}

impl Iterator for Records {
    type Item = AnnotationRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        for path in self.files.by_ref() {
            if let Some(record) = read_record(&path) {
                self.remaining -= 1;
                return Some(record);
            }
        }

        None
    }
}

/// Read one label file. `None` means the file is skipped.
pub fn read_record(path: &Path) -> Option<AnnotationRecord> {
    let first_line = match read_first_line(path) {
        Ok(line) => line,
        Err(e) => {
            warn!("Skipping unreadable label file {:?}: {}", path, e);
            return None;
        }
    };

    let Some(class_index) = parse_class_index(&first_line) else {
        debug!("Skipping {:?}: no class index on first line", path);
        return None;
    };

    let Some(true_emotion) = Emotion::from_class_index(class_index) else {
        debug!("Skipping {:?}: unknown class index {}", path, class_index);
        return None;
    };

    Some(AnnotationRecord {
        image_id: image_id_for(path),
        class_index: true_emotion.class_index(),
        true_emotion,
    })
}

fn read_first_line(path: &Path) -> std::io::Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut line = String::new();
    reader.read_line(&mut line)?;
    Ok(line)
}

/// First whitespace-delimited token of a label line, as an integer.
pub fn parse_class_index(line: &str) -> Option<i64> {
    line.split_whitespace().next()?.parse().ok()
}

/// Image file name that a label file annotates (`x.txt` labels `x.jpg`).
fn image_id_for(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    format!("{}.jpg", stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_label(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_parse_class_index() {
        assert_eq!(parse_class_index("4 0.51 0.43 0.22 0.31\n"), Some(4));
        assert_eq!(parse_class_index("  7"), Some(7));
        assert_eq!(parse_class_index(""), None);
        assert_eq!(parse_class_index("   \n"), None);
        assert_eq!(parse_class_index("happy 0.5"), None);
        assert_eq!(parse_class_index("4.0"), None);
    }

    #[test]
    fn test_reads_only_valid_labels() {
        let dir = tempdir().unwrap();
        write_label(dir.path(), "a.txt", "4 0.5 0.5 0.2 0.2\n");
        write_label(dir.path(), "b.txt", "9\n");
        write_label(dir.path(), "c.txt", "0\n1\n");
        write_label(dir.path(), "d.txt", "");
        write_label(dir.path(), "e.txt", "x y z\n");

        let reader = AnnotationReader::new(dir.path(), 5000);
        let records: Vec<AnnotationRecord> = reader.records().unwrap().collect();

        assert_eq!(
            records,
            vec![
                AnnotationRecord {
                    image_id: "a.jpg".to_string(),
                    class_index: 4,
                    true_emotion: Emotion::Happy,
                },
                AnnotationRecord {
                    image_id: "c.jpg".to_string(),
                    class_index: 0,
                    true_emotion: Emotion::Anger,
                },
            ]
        );
    }

    #[test]
    fn test_cap_and_restart() {
        let dir = tempdir().unwrap();
        for i in 0..10 {
            write_label(dir.path(), &format!("img_{:02}.txt", i), &format!("{}\n", i % 8));
        }

        let reader = AnnotationReader::new(dir.path(), 3);
        let first: Vec<String> = reader.records().unwrap().map(|r| r.image_id).collect();
        let second: Vec<String> = reader.records().unwrap().map(|r| r.image_id).collect();

        assert_eq!(first, vec!["img_00.jpg", "img_01.jpg", "img_02.jpg"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempdir().unwrap();
        let reader = AnnotationReader::new(dir.path().join("absent"), 10);
        assert!(matches!(reader.records(), Err(PipelineError::Configuration(_))));
    }
}
