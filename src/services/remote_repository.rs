use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::pull_request::PullRequestDraft;
use crate::domain::repository::RepositoryCoordinates;
use crate::error::{AppError, AppResult};

/// Status and raw body of a remote call. Interpreting the status is left to
/// the caller; transport failures surface as `AppError::Transport` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    pub fn json<T: DeserializeOwned>(&self) -> AppResult<T> {
        serde_json::from_str(&self.body).map_err(|err| {
            AppError::Transport(format!("unexpected response body ({}): {err}", self.status))
        })
    }

    pub fn message(&self) -> String {
        serde_json::from_str::<serde_json::Value>(&self.body)
            .ok()
            .and_then(|value| {
                value
                    .get("message")
                    .and_then(|message| message.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| self.body.trim().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentsUpdate {
    pub message: String,
    pub content: String,
    pub branch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

#[async_trait]
pub trait RepositoryApi: Send + Sync {
    fn check_credentials(&self) -> AppResult<()>;

    async fn get_ref(&self, repo: &RepositoryCoordinates, branch: &str) -> AppResult<ApiResponse>;

    async fn create_ref(
        &self,
        repo: &RepositoryCoordinates,
        ref_name: &str,
        sha: &str,
    ) -> AppResult<ApiResponse>;

    async fn delete_ref(&self, repo: &RepositoryCoordinates, branch: &str)
    -> AppResult<ApiResponse>;

    async fn get_contents(
        &self,
        repo: &RepositoryCoordinates,
        path: &str,
        branch: &str,
    ) -> AppResult<ApiResponse>;

    async fn put_contents(
        &self,
        repo: &RepositoryCoordinates,
        path: &str,
        update: &ContentsUpdate,
    ) -> AppResult<ApiResponse>;

    async fn create_pull(
        &self,
        repo: &RepositoryCoordinates,
        draft: &PullRequestDraft,
    ) -> AppResult<ApiResponse>;
}
