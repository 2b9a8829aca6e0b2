use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::domain::files::FileSet;
use crate::error::{AppError, AppResult};
use crate::services::{CodeGenerationService, TestGenerationService};

const SKIPPED_DIRS: &[&str] = &[".git", "__pycache__", "target", "node_modules"];

pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn read(&self) -> AppResult<FileSet> {
        if !self.root.is_dir() {
            return Err(AppError::InvalidRequest(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }

        let mut files = FileSet::new();
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_skipped(entry.path(), &self.root));

        for entry in walker {
            let entry = entry.map_err(|err| {
                AppError::Io(std::io::Error::other(format!(
                    "failed to walk {}: {err}",
                    self.root.display()
                )))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            match fs::read_to_string(entry.path()) {
                Ok(content) => {
                    let key = relative.to_string_lossy().replace('\\', "/");
                    debug!(path = %key, "collected file");
                    files.insert(key, content);
                }
                Err(err) if err.kind() == std::io::ErrorKind::InvalidData => {
                    warn!(path = %entry.path().display(), "skipping non-UTF-8 file");
                }
                Err(err) => return Err(AppError::Io(err)),
            }
        }
        Ok(files)
    }
}

fn is_skipped(path: &Path, root: &Path) -> bool {
    path != root
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

#[async_trait]
impl CodeGenerationService for DirectorySource {
    async fn generate_implementation(&self, _requirements: &str) -> AppResult<FileSet> {
        self.read()
    }
}

#[async_trait]
impl TestGenerationService for DirectorySource {
    async fn generate_tests(
        &self,
        _implementation: &FileSet,
        _requirements: &str,
    ) -> AppResult<FileSet> {
        self.read()
    }
}
