use serde::Deserialize;
use tracing::info;

use crate::domain::pull_request::{PullRequest, PullRequestDraft, PullRequestState};
use crate::domain::repository::RepositoryCoordinates;
use crate::error::{AppError, AppResult};
use crate::services::RepositoryApi;

#[derive(Deserialize)]
struct PullResponse {
    number: u64,
    html_url: String,
    #[serde(default = "open_state")]
    state: PullRequestState,
}

fn open_state() -> PullRequestState {
    PullRequestState::Open
}

pub struct PullRequestOpener<'a> {
    api: &'a dyn RepositoryApi,
    repo: &'a RepositoryCoordinates,
}

impl<'a> PullRequestOpener<'a> {
    pub fn new(api: &'a dyn RepositoryApi, repo: &'a RepositoryCoordinates) -> Self {
        Self { api, repo }
    }

    pub async fn open_pull_request(&self, draft: &PullRequestDraft) -> AppResult<PullRequest> {
        let response = self.api.create_pull(self.repo, draft).await?;
        if !response.is_success() {
            return Err(AppError::PullRequest {
                status: response.status,
                message: response.message(),
            });
        }

        let payload: PullResponse = response.json()?;
        info!(number = payload.number, url = %payload.html_url, "opened pull request");
        Ok(PullRequest {
            number: payload.number,
            url: payload.html_url,
            title: draft.title.clone(),
            head: draft.head.clone(),
            base: draft.base.clone(),
            state: payload.state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::infra::memory::{InMemoryRepository, Operation};

    fn draft() -> PullRequestDraft {
        PullRequestDraft {
            title: "[ASCII-1] Implement ASCII Art Converter".to_string(),
            body: "body".to_string(),
            head: "feature/ascii-1-ascii-art-converter".to_string(),
            base: "main".to_string(),
        }
    }

    #[tokio::test]
    async fn returns_number_and_url() {
        let remote = InMemoryRepository::new()
            .with_branch("main")
            .with_branch("feature/ascii-1-ascii-art-converter");
        let repo = RepositoryCoordinates::new("acme", "ascii-art-converter");
        let opener = PullRequestOpener::new(&remote, &repo);

        let pull = opener.open_pull_request(&draft()).await.unwrap();
        assert_eq!(pull.number, 1);
        assert_eq!(
            pull.url,
            "https://github.com/acme/ascii-art-converter/pull/1"
        );
        assert_eq!(pull.state, PullRequestState::Open);
        assert_eq!(pull.head, "feature/ascii-1-ascii-art-converter");
    }

    #[tokio::test]
    async fn reports_remote_rejection_without_retrying() {
        let remote = InMemoryRepository::new().with_branch("main").fail_on(
            Operation::CreatePull,
            None,
            422,
            "A pull request already exists",
        );
        let repo = RepositoryCoordinates::new("acme", "ascii-art-converter");
        let opener = PullRequestOpener::new(&remote, &repo);

        let error = opener.open_pull_request(&draft()).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::PullRequest);
        assert_eq!(error.status(), Some(422));
        assert_eq!(remote.calls(Operation::CreatePull), 1);
    }
}
