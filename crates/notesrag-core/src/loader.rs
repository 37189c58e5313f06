//! Directory walker that turns supported files into `SourceDocument`s.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::types::{DocumentFormat, SourceDocument};

/// A file that was discovered but could not be loaded.
#[derive(Debug)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub error: Error,
}

/// Outcome of loading a directory: the readable documents plus per-file failures.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub documents: Vec<SourceDocument>,
    pub failures: Vec<LoadFailure>,
}

impl LoadReport {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentLoader;

impl DocumentLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load every supported file under `root`, recursing into subdirectories.
    ///
    /// A missing `root` is created and yields an empty report. Files that fail
    /// to read or parse are recorded in `failures` and skipped. Documents come
    /// back in file-name order so runs are reproducible.
    pub fn load_directory(&self, root: &Path) -> Result<LoadReport> {
        if !root.exists() {
            info!(dir = %root.display(), "notes directory missing, creating it");
            fs::create_dir_all(root)?;
            return Ok(LoadReport::default());
        }

        let mut report = LoadReport::default();
        let files = self.list_supported_files(root, &mut report.failures);
        for (file_index, (file_path, format)) in files.iter().enumerate() {
            debug!(file = %file_path.display(), n = file_index + 1, total = files.len(), ?format, "loading");
            match format.read(file_path) {
                Ok(doc) => report.documents.push(doc),
                Err(error) => {
                    warn!(file = %file_path.display(), %error, "skipping unreadable document");
                    report.failures.push(LoadFailure { path: file_path.clone(), error });
                }
            }
        }
        info!(dir = %root.display(), documents = report.documents.len(), failed = report.failures.len(), "loaded notes");
        Ok(report)
    }

    fn list_supported_files(&self, root: &Path, failures: &mut Vec<LoadFailure>) -> Vec<(PathBuf, DocumentFormat)> {
        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                    warn!(path = %path.display(), error = %e, "cannot walk entry");
                    failures.push(LoadFailure { path: path.clone(), error: Error::load(path, e.to_string()) });
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(format) = DocumentFormat::from_path(entry.path()) {
                files.push((entry.into_path(), format));
            }
        }
        files
    }
}
