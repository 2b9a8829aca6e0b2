use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use blake3::Hasher;
use serde::{Deserialize, Serialize};

use crate::config::config_directory;
use crate::domain::files::FileSet;
use crate::domain::repository::RepositoryCoordinates;
use crate::error::{AppError, AppResult};
use crate::workflow::coordinator::{WorkflowProgress, WorkflowResult, WorkflowStep};

const RUN_LOG_FILE_NAME: &str = "runs.json";
const RUN_LOG_LIMIT: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Succeeded,
    Failed { step: WorkflowStep, error: String },
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunEntry {
    pub key: String,
    pub ticket_id: String,
    pub recorded_at: u64,
    #[serde(flatten)]
    pub status: RunStatus,
    pub progress: WorkflowProgress,
}

impl RunEntry {
    pub fn from_result(key: String, ticket_id: &str, result: &WorkflowResult) -> Self {
        let status = match result {
            WorkflowResult::Success(_) => RunStatus::Succeeded,
            WorkflowResult::Failure(failure) => RunStatus::Failed {
                step: failure.step,
                error: failure.error.to_string(),
            },
        };
        Self {
            key,
            ticket_id: ticket_id.to_string(),
            recorded_at: now_secs(),
            status,
            progress: result.progress(),
        }
    }

    pub fn is_abortable(&self) -> bool {
        matches!(self.status, RunStatus::Failed { .. })
            && self.progress.pull_request.is_none()
            && self
                .progress
                .branch
                .as_ref()
                .is_some_and(|branch| branch.created())
    }
}

#[derive(Default, Serialize, Deserialize)]
struct RunLogFile {
    entries: Vec<RunEntry>,
}

/// Local record of PR workflow runs, oldest first.
pub struct RunLog {
    file_path: PathBuf,
    file: RunLogFile,
}

impl RunLog {
    pub fn load() -> AppResult<Self> {
        Self::load_from(config_directory()?.join(RUN_LOG_FILE_NAME))
    }

    pub fn load_from(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let file = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str::<RunLogFile>(&contents)
                .map_err(|err| AppError::Configuration(format!("invalid run log: {err}")))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => RunLogFile::default(),
            Err(err) => return Err(AppError::Io(err)),
        };

        Ok(Self {
            file_path: path,
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn entries(&self) -> &[RunEntry] {
        &self.file.entries
    }

    pub fn record(&mut self, entry: RunEntry) {
        self.file.entries.push(entry);
        if self.file.entries.len() > RUN_LOG_LIMIT {
            let overflow = self.file.entries.len() - RUN_LOG_LIMIT;
            self.file.entries.drain(0..overflow);
        }
    }

    pub fn latest_for_ticket(&self, ticket_id: &str) -> Option<&RunEntry> {
        self.file
            .entries
            .iter()
            .rev()
            .find(|entry| entry.ticket_id.eq_ignore_ascii_case(ticket_id.trim()))
    }

    pub fn succeeded_with_key(&self, key: &str) -> Option<&RunEntry> {
        self.file
            .entries
            .iter()
            .rev()
            .find(|entry| entry.key == key && entry.status == RunStatus::Succeeded)
    }

    pub fn mark_aborted(&mut self, key: &str, recorded_at: u64) -> bool {
        match self
            .file
            .entries
            .iter_mut()
            .find(|entry| entry.key == key && entry.recorded_at == recorded_at)
        {
            Some(entry) => {
                entry.status = RunStatus::Aborted;
                true
            }
            None => false,
        }
    }

    pub fn save(&self) -> AppResult<()> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(&self.file)
            .map_err(|err| AppError::Configuration(format!("failed to write run log: {err}")))?;
        fs::write(&self.file_path, data)?;
        Ok(())
    }

    pub fn compute_key(
        repository: &RepositoryCoordinates,
        ticket_id: &str,
        branch: Option<&str>,
        files: &FileSet,
    ) -> String {
        let mut hasher = Hasher::new();
        hasher.update(repository.to_string().as_bytes());
        hasher.update(b"\0");
        hasher.update(ticket_id.trim().to_lowercase().as_bytes());
        hasher.update(b"\0");
        if let Some(branch) = branch {
            hasher.update(branch.as_bytes());
        }
        for (path, content) in files.iter() {
            hasher.update(b"\0");
            hasher.update(path.as_bytes());
            hasher.update(b"\0");
            hasher.update(content.as_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}
