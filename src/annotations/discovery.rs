use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const LABEL_EXTENSION: &str = "txt";

/// Label files directly inside `directory`, in file-name order.
///
/// The walk is lazy; subdirectories are not descended into.
pub fn label_files(directory: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(LABEL_EXTENSION))
                .unwrap_or(false)
        })
}
