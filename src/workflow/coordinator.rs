use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::GitHubSettings;
use crate::domain::branch::{BranchName, DEFAULT_BRANCH_SLUG, EnsuredBranch};
use crate::domain::files::FileSet;
use crate::domain::pull_request::{PullRequest, PullRequestDraft};
use crate::domain::repository::RepositoryCoordinates;
use crate::error::AppError;
use crate::services::RepositoryApi;
use crate::workflow::branch::BranchManager;
use crate::workflow::commit::FileCommitter;
use crate::workflow::pull_request::PullRequestOpener;

#[derive(Debug, Clone, Default)]
pub struct WorkflowRequest {
    pub ticket_id: String,
    pub implementation_files: FileSet,
    pub test_files: FileSet,
    pub branch: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowStep {
    Validate,
    Branch,
    Commit,
    PullRequest,
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WorkflowStep::Validate => "validate",
            WorkflowStep::Branch => "branch",
            WorkflowStep::Commit => "commit",
            WorkflowStep::PullRequest => "pull request",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowProgress {
    pub repository: Option<RepositoryCoordinates>,
    pub branch: Option<EnsuredBranch>,
    pub committed_paths: Vec<String>,
    pub pull_request: Option<PullRequest>,
}

#[derive(Debug)]
pub struct WorkflowSuccess {
    pub repository: RepositoryCoordinates,
    pub branch: EnsuredBranch,
    pub committed_paths: Vec<String>,
    pub pull_request: PullRequest,
}

#[derive(Debug)]
pub struct WorkflowFailure {
    pub step: WorkflowStep,
    pub error: AppError,
    pub progress: WorkflowProgress,
}

#[derive(Debug)]
pub enum WorkflowResult {
    Success(WorkflowSuccess),
    Failure(WorkflowFailure),
}

impl WorkflowResult {
    pub fn is_success(&self) -> bool {
        matches!(self, WorkflowResult::Success(_))
    }

    pub fn progress(&self) -> WorkflowProgress {
        match self {
            WorkflowResult::Success(success) => WorkflowProgress {
                repository: Some(success.repository.clone()),
                branch: Some(success.branch.clone()),
                committed_paths: success.committed_paths.clone(),
                pull_request: Some(success.pull_request.clone()),
            },
            WorkflowResult::Failure(failure) => failure.progress.clone(),
        }
    }
}

pub fn default_title(ticket_id: &str) -> String {
    format!("[{ticket_id}] Implement ASCII Art Converter")
}

pub fn default_description(ticket_id: &str) -> String {
    format!(
        "# {ticket_id} - ASCII Art Converter Implementation

This PR implements an ASCII art converter that can transform images into ASCII art.

## Features Implemented

- Convert PNG and JPG images to ASCII art
- Support for different ASCII character sets (simple, standard, complex)
- Save output to text files
- Preserve aspect ratio of original images

## Test Coverage

- Unit tests for all core functionality
- Edge case handling
- Test coverage for different character sets and output options

## How to Test

1. Install dependencies: `pip install -r requirements.txt`
2. Run the converter: `python -m ascii_art_converter.image_to_ascii input_image.jpg -o output.txt`
3. Run tests: `python -m pytest tests/`
"
    )
}

pub fn commit_message(ticket_id: &str) -> String {
    format!("Implement {ticket_id} - ASCII Art Converter")
}

/// Branch -> Commit -> PR, stopping at the first failing step. Nothing is
/// rolled back.
pub struct PrWorkflowCoordinator<'a> {
    api: &'a dyn RepositoryApi,
    settings: &'a GitHubSettings,
}

impl<'a> PrWorkflowCoordinator<'a> {
    pub fn new(api: &'a dyn RepositoryApi, settings: &'a GitHubSettings) -> Self {
        Self { api, settings }
    }

    pub async fn run(&self, request: WorkflowRequest) -> WorkflowResult {
        let mut progress = WorkflowProgress::default();

        let ticket_id = request.ticket_id.trim().to_string();
        let repository = match self.validate(&ticket_id) {
            Ok(repository) => repository,
            Err(error) => return fail(WorkflowStep::Validate, error, progress),
        };
        progress.repository = Some(repository.clone());

        let branch = request
            .branch
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| BranchName(name.to_string()))
            .unwrap_or_else(|| BranchName::for_ticket(&ticket_id, DEFAULT_BRANCH_SLUG));
        let title = non_blank(request.title).unwrap_or_else(|| default_title(&ticket_id));
        let description =
            non_blank(request.description).unwrap_or_else(|| default_description(&ticket_id));

        let collisions = request
            .implementation_files
            .collisions(&request.test_files);
        if !collisions.is_empty() {
            warn!(?collisions, "test files replace implementation files at the same path");
        }
        let files = request
            .implementation_files
            .merged_with(&request.test_files);

        info!(
            ticket = %ticket_id,
            repository = %repository,
            branch = %branch,
            files = files.len(),
            "starting pull request workflow"
        );

        let base_branch = self.settings.base_branch.as_str();
        let ensured = match BranchManager::new(self.api, &repository)
            .ensure_branch(&branch, base_branch)
            .await
        {
            Ok(ensured) => ensured,
            Err(error) => return fail(WorkflowStep::Branch, error, progress),
        };
        progress.branch = Some(ensured.clone());

        let committer = FileCommitter::new(self.api, &repository);
        let report = match committer
            .commit_files(&branch, &files, &commit_message(&ticket_id))
            .await
        {
            Ok(report) => report,
            Err(failure) => {
                progress.committed_paths = failure.report.committed_paths();
                return fail(WorkflowStep::Commit, failure.error, progress);
            }
        };
        progress.committed_paths = report.committed_paths();

        let draft = PullRequestDraft {
            title,
            body: description,
            head: branch.to_string(),
            base: base_branch.to_string(),
        };
        let pull_request = match PullRequestOpener::new(self.api, &repository)
            .open_pull_request(&draft)
            .await
        {
            Ok(pull_request) => pull_request,
            Err(error) => return fail(WorkflowStep::PullRequest, error, progress),
        };

        info!(
            ticket = %ticket_id,
            number = pull_request.number,
            "pull request workflow finished"
        );
        WorkflowResult::Success(WorkflowSuccess {
            repository,
            branch: ensured,
            committed_paths: progress.committed_paths,
            pull_request,
        })
    }

    fn validate(&self, ticket_id: &str) -> Result<RepositoryCoordinates, AppError> {
        let repository = self.settings.target()?;
        self.api.check_credentials()?;
        if ticket_id.is_empty() {
            return Err(AppError::InvalidRequest(
                "ticket id must not be empty".to_string(),
            ));
        }
        Ok(repository)
    }
}

fn fail(step: WorkflowStep, error: AppError, progress: WorkflowProgress) -> WorkflowResult {
    error!(%step, %error, "pull request workflow failed");
    WorkflowResult::Failure(WorkflowFailure {
        step,
        error,
        progress,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::domain::branch::BranchState;
    use crate::error::ErrorKind;
    use crate::infra::github::GitHubClient;
    use crate::infra::memory::{InMemoryRepository, Operation};

    fn settings() -> GitHubSettings {
        GitHubSettings {
            token: Some("ghp_test".to_string()),
            owner: Some("acme".to_string()),
            repo: Some("ascii-art-converter".to_string()),
            repo_url: None,
            base_branch: "main".to_string(),
            api_url: "https://api.github.com".to_string(),
            timeout: Duration::from_secs(5),
            lookup_retries: 0,
        }
    }

    fn request() -> WorkflowRequest {
        WorkflowRequest {
            ticket_id: "ASCII-1".to_string(),
            implementation_files: [("main.py", "print(1)")].into_iter().collect(),
            test_files: [("test_main.py", "assert True")].into_iter().collect(),
            ..WorkflowRequest::default()
        }
    }

    fn expect_failure(result: WorkflowResult) -> WorkflowFailure {
        match result {
            WorkflowResult::Failure(failure) => failure,
            WorkflowResult::Success(success) => panic!("unexpected success: {success:?}"),
        }
    }

    #[tokio::test]
    async fn opens_pull_request_end_to_end() {
        let remote = InMemoryRepository::new().with_branch("main");
        let settings = settings();
        let result = PrWorkflowCoordinator::new(&remote, &settings)
            .run(request())
            .await;

        assert!(result.is_success());
        let WorkflowResult::Success(success) = result else {
            unreachable!()
        };
        assert_eq!(
            success.branch.name.as_str(),
            "feature/ascii-1-ascii-art-converter"
        );
        assert_eq!(success.branch.state, BranchState::Created);
        assert_eq!(success.committed_paths, vec!["main.py", "test_main.py"]);
        assert_eq!(
            success.pull_request.title,
            "[ASCII-1] Implement ASCII Art Converter"
        );
        assert_eq!(success.pull_request.base, "main");

        let pulls = remote.pull_requests();
        assert_eq!(pulls.len(), 1);
        assert!(pulls[0].body.starts_with("# ASCII-1 - ASCII Art Converter"));
        assert_eq!(
            remote
                .file("feature/ascii-1-ascii-art-converter", "test_main.py")
                .as_deref(),
            Some("assert True")
        );
    }

    #[tokio::test]
    async fn test_files_win_on_collision() {
        let remote = InMemoryRepository::new().with_branch("main");
        let settings = settings();
        let request = WorkflowRequest {
            ticket_id: "ASCII-1".to_string(),
            implementation_files: [("a.py", "X")].into_iter().collect(),
            test_files: [("a.py", "Y")].into_iter().collect(),
            ..WorkflowRequest::default()
        };

        let result = PrWorkflowCoordinator::new(&remote, &settings)
            .run(request)
            .await;
        assert!(result.is_success());
        assert_eq!(remote.calls(Operation::PutContents), 1);
        assert_eq!(
            remote
                .file("feature/ascii-1-ascii-art-converter", "a.py")
                .as_deref(),
            Some("Y")
        );
    }

    #[tokio::test]
    async fn caller_supplied_branch_title_and_description_are_used() {
        let remote = InMemoryRepository::new().with_branch("main");
        let settings = settings();
        let request = WorkflowRequest {
            branch: Some("custom/ascii-1".to_string()),
            title: Some("Custom title".to_string()),
            description: Some("Custom body".to_string()),
            ..request()
        };

        let result = PrWorkflowCoordinator::new(&remote, &settings)
            .run(request)
            .await;
        assert!(result.is_success());
        let pulls = remote.pull_requests();
        assert_eq!(pulls[0].head, "custom/ascii-1");
        assert_eq!(pulls[0].title, "Custom title");
        assert_eq!(pulls[0].body, "Custom body");
    }

    #[tokio::test]
    async fn missing_base_branch_short_circuits() {
        let remote = InMemoryRepository::new();
        let settings = settings();
        let failure = expect_failure(
            PrWorkflowCoordinator::new(&remote, &settings)
                .run(request())
                .await,
        );

        assert_eq!(failure.step, WorkflowStep::Branch);
        assert_eq!(failure.error.kind(), ErrorKind::BaseBranchNotFound);
        assert!(failure.progress.branch.is_none());
        assert_eq!(remote.calls(Operation::GetContents), 0);
        assert_eq!(remote.calls(Operation::PutContents), 0);
        assert_eq!(remote.calls(Operation::CreatePull), 0);
    }

    #[tokio::test]
    async fn branch_failure_skips_commit_and_pull_request() {
        let remote = InMemoryRepository::new().with_branch("main").fail_on(
            Operation::CreateRef,
            None,
            500,
            "internal error",
        );
        let settings = settings();
        let failure = expect_failure(
            PrWorkflowCoordinator::new(&remote, &settings)
                .run(request())
                .await,
        );

        assert_eq!(failure.error.kind(), ErrorKind::BranchCreation);
        assert_eq!(remote.calls(Operation::PutContents), 0);
        assert_eq!(remote.calls(Operation::CreatePull), 0);
    }

    #[tokio::test]
    async fn commit_failure_leaves_branch_and_skips_pull_request() {
        let remote = InMemoryRepository::new().with_branch("main").fail_on(
            Operation::PutContents,
            Some("test_main.py"),
            409,
            "conflict",
        );
        let settings = settings();
        let failure = expect_failure(
            PrWorkflowCoordinator::new(&remote, &settings)
                .run(request())
                .await,
        );

        assert_eq!(failure.step, WorkflowStep::Commit);
        assert_eq!(failure.error.kind(), ErrorKind::FileCommit);
        assert_eq!(failure.progress.committed_paths, vec!["main.py"]);
        assert!(failure.progress.branch.is_some());
        assert!(remote.has_branch("feature/ascii-1-ascii-art-converter"));
        assert_eq!(remote.calls(Operation::CreatePull), 0);
    }

    #[tokio::test]
    async fn pull_request_failure_reports_everything_committed() {
        let remote = InMemoryRepository::new().with_branch("main").fail_on(
            Operation::CreatePull,
            None,
            422,
            "Validation Failed",
        );
        let settings = settings();
        let failure = expect_failure(
            PrWorkflowCoordinator::new(&remote, &settings)
                .run(request())
                .await,
        );

        assert_eq!(failure.step, WorkflowStep::PullRequest);
        assert_eq!(failure.error.status(), Some(422));
        assert_eq!(
            failure.progress.committed_paths,
            vec!["main.py", "test_main.py"]
        );
        assert!(failure.progress.pull_request.is_none());
    }

    #[tokio::test]
    async fn rerun_reuses_existing_branch_and_updates_files() {
        let remote = InMemoryRepository::new().with_branch("main");
        let settings = settings();
        let coordinator = PrWorkflowCoordinator::new(&remote, &settings);

        assert!(coordinator.run(request()).await.is_success());
        let second = coordinator.run(request()).await;

        let WorkflowResult::Success(success) = second else {
            panic!("second run failed");
        };
        assert_eq!(success.branch.state, BranchState::AlreadyExisted);
        assert_eq!(success.pull_request.number, 2);
    }

    #[tokio::test]
    async fn missing_configuration_fails_before_any_call() {
        let remote = InMemoryRepository::new().with_branch("main");
        let settings = GitHubSettings {
            owner: None,
            ..settings()
        };
        let failure = expect_failure(
            PrWorkflowCoordinator::new(&remote, &settings)
                .run(request())
                .await,
        );

        assert_eq!(failure.step, WorkflowStep::Validate);
        assert_eq!(failure.error.kind(), ErrorKind::Configuration);
        assert_eq!(remote.calls(Operation::GetRef), 0);
    }

    #[tokio::test]
    async fn missing_token_is_a_configuration_error() {
        let settings = GitHubSettings {
            token: None,
            ..settings()
        };
        let client = GitHubClient::new(&settings).unwrap();
        let failure = expect_failure(
            PrWorkflowCoordinator::new(&client, &settings)
                .run(request())
                .await,
        );
        assert_eq!(failure.step, WorkflowStep::Validate);
        assert_eq!(failure.error.kind(), ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn blank_ticket_id_is_rejected() {
        let remote = InMemoryRepository::new().with_branch("main");
        let settings = settings();
        let request = WorkflowRequest {
            ticket_id: "  ".to_string(),
            ..request()
        };
        let failure = expect_failure(
            PrWorkflowCoordinator::new(&remote, &settings)
                .run(request)
                .await,
        );
        assert_eq!(failure.error.kind(), ErrorKind::InvalidRequest);
    }
}
