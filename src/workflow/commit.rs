use base64::prelude::{BASE64_STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::branch::BranchName;
use crate::domain::files::FileSet;
use crate::domain::repository::RepositoryCoordinates;
use crate::error::{AppError, AppResult};
use crate::services::{ContentsUpdate, RepositoryApi};

#[derive(Deserialize)]
struct ContentsResponse {
    sha: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileAction {
    Created,
    Updated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub action: FileAction,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub changes: Vec<FileChange>,
}

impl CommitReport {
    pub fn committed_paths(&self) -> Vec<String> {
        self.changes.iter().map(|change| change.path.clone()).collect()
    }
}

#[derive(Debug)]
pub struct CommitFailure {
    pub report: CommitReport,
    pub error: AppError,
}

impl From<CommitFailure> for AppError {
    fn from(failure: CommitFailure) -> Self {
        failure.error
    }
}

pub struct FileCommitter<'a> {
    api: &'a dyn RepositoryApi,
    repo: &'a RepositoryCoordinates,
}

impl<'a> FileCommitter<'a> {
    pub fn new(api: &'a dyn RepositoryApi, repo: &'a RepositoryCoordinates) -> Self {
        Self { api, repo }
    }

    /// Writes every file of `files` to `branch`, one commit per file, in path
    /// order. Stops at the first failure; nothing after it is attempted.
    pub async fn commit_files(
        &self,
        branch: &BranchName,
        files: &FileSet,
        message: &str,
    ) -> Result<CommitReport, CommitFailure> {
        let mut report = CommitReport::default();
        for (path, content) in files.iter() {
            match self.commit_file(branch, path, content, message).await {
                Ok(change) => report.changes.push(change),
                Err(error) => return Err(CommitFailure { report, error }),
            }
        }
        info!(branch = %branch, files = report.changes.len(), "committed files");
        Ok(report)
    }

    pub async fn commit_file(
        &self,
        branch: &BranchName,
        path: &str,
        content: &str,
        message: &str,
    ) -> AppResult<FileChange> {
        let existing_sha = self.existing_sha(branch, path).await?;
        let action = if existing_sha.is_some() {
            FileAction::Updated
        } else {
            FileAction::Created
        };

        let update = ContentsUpdate {
            message: message.to_string(),
            content: BASE64_STANDARD.encode(content),
            branch: branch.to_string(),
            sha: existing_sha,
        };
        let response = self.api.put_contents(self.repo, path, &update).await?;
        if !response.is_success() {
            return Err(AppError::FileCommit {
                path: path.to_string(),
                status: response.status,
                message: response.message(),
            });
        }

        debug!(path, ?action, "pushed file");
        Ok(FileChange {
            path: path.to_string(),
            action,
        })
    }

    async fn existing_sha(&self, branch: &BranchName, path: &str) -> AppResult<Option<String>> {
        let response = self
            .api
            .get_contents(self.repo, path, branch.as_str())
            .await?;
        if response.is_not_found() {
            return Ok(None);
        }
        if !response.is_success() {
            return Err(AppError::FileCommit {
                path: path.to_string(),
                status: response.status,
                message: format!("existence check failed: {}", response.message()),
            });
        }
        let payload: ContentsResponse = response.json()?;
        Ok(Some(payload.sha))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::infra::memory::{InMemoryRepository, Operation};

    fn repo() -> RepositoryCoordinates {
        RepositoryCoordinates::new("acme", "ascii-art-converter")
    }

    fn branch() -> BranchName {
        BranchName("feature/ascii-1-ascii-art-converter".to_string())
    }

    #[tokio::test]
    async fn empty_file_set_commits_nothing() {
        let remote = InMemoryRepository::new().with_branch(branch().as_str());
        let repo = repo();
        let committer = FileCommitter::new(&remote, &repo);

        let report = committer
            .commit_files(&branch(), &FileSet::new(), "Implement ASCII-1")
            .await
            .unwrap();
        assert!(report.committed_paths().is_empty());
        assert_eq!(remote.calls(Operation::GetContents), 0);
        assert_eq!(remote.calls(Operation::PutContents), 0);
    }

    #[tokio::test]
    async fn creates_new_and_updates_existing_files() {
        let remote = InMemoryRepository::new()
            .with_branch(branch().as_str())
            .with_file(branch().as_str(), "README.md", "old readme");
        let repo = repo();
        let committer = FileCommitter::new(&remote, &repo);
        let files: FileSet = [("README.md", "new readme"), ("main.py", "print(1)")]
            .into_iter()
            .collect();

        let report = committer
            .commit_files(&branch(), &files, "Implement ASCII-1")
            .await
            .unwrap();

        assert_eq!(
            report.changes,
            vec![
                FileChange {
                    path: "README.md".to_string(),
                    action: FileAction::Updated,
                },
                FileChange {
                    path: "main.py".to_string(),
                    action: FileAction::Created,
                },
            ]
        );
        assert_eq!(
            remote.file(branch().as_str(), "README.md").as_deref(),
            Some("new readme")
        );
        assert_eq!(
            remote.file(branch().as_str(), "main.py").as_deref(),
            Some("print(1)")
        );
    }

    #[tokio::test]
    async fn stops_at_first_failing_file() {
        let remote = InMemoryRepository::new()
            .with_branch(branch().as_str())
            .fail_on(Operation::PutContents, Some("b.py"), 409, "conflict");
        let repo = repo();
        let committer = FileCommitter::new(&remote, &repo);
        let files: FileSet = [("a.py", "A"), ("b.py", "B"), ("c.py", "C")]
            .into_iter()
            .collect();

        let failure = committer
            .commit_files(&branch(), &files, "Implement ASCII-1")
            .await
            .unwrap_err();

        assert_eq!(failure.report.committed_paths(), vec!["a.py"]);
        match &failure.error {
            AppError::FileCommit { path, status, .. } => {
                assert_eq!(path, "b.py");
                assert_eq!(*status, 409);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(remote.calls(Operation::PutContents), 2);
        assert!(remote.file(branch().as_str(), "c.py").is_none());
    }

    #[tokio::test]
    async fn failed_existence_check_is_a_commit_error() {
        let remote = InMemoryRepository::new()
            .with_branch(branch().as_str())
            .fail_on(Operation::GetContents, None, 500, "server error");
        let repo = repo();
        let committer = FileCommitter::new(&remote, &repo);

        let error = committer
            .commit_file(&branch(), "a.py", "A", "msg")
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::FileCommit);
        assert_eq!(remote.calls(Operation::PutContents), 0);
    }
}
