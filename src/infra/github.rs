use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    Client, RequestBuilder, Url,
    header::{ACCEPT, AUTHORIZATION, USER_AGENT},
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::GitHubSettings;
use crate::domain::pull_request::PullRequestDraft;
use crate::domain::repository::RepositoryCoordinates;
use crate::error::{AppError, AppResult};
use crate::services::{ApiResponse, ContentsUpdate, RepositoryApi};

const CLIENT_USER_AGENT: &str = "sdlc-cli";
const API_VERSION: &str = "2022-11-28";
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

pub struct GitHubClient {
    http: Client,
    api_url: String,
    token: Option<String>,
    lookup_retries: u32,
    retry_backoff: Duration,
}

impl GitHubClient {
    pub fn new(settings: &GitHubSettings) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|err| AppError::Transport(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            http,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            token: settings.token.clone(),
            lookup_retries: settings.lookup_retries,
            retry_backoff: RETRY_BACKOFF,
        })
    }

    fn token(&self) -> AppResult<&str> {
        self.token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| AppError::Configuration("GitHub token not configured".to_string()))
    }

    // Each segment is percent-encoded, so `#`, `?` and spaces in file paths
    // or branch names stay part of the path.
    fn repo_endpoint(&self, repo: &RepositoryCoordinates, segments: &[&str]) -> AppResult<Url> {
        let mut url = Url::parse(&self.api_url).map_err(|err| {
            AppError::Configuration(format!("invalid GitHub API URL '{}': {err}", self.api_url))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                AppError::Configuration(format!("invalid GitHub API URL '{}'", self.api_url))
            })?
            .pop_if_empty()
            .extend(["repos", repo.owner.as_str(), repo.repo.as_str()])
            .extend(segments.iter().flat_map(|segment| segment.split('/')));
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> AppResult<RequestBuilder> {
        Ok(request
            .header(AUTHORIZATION, format!("Bearer {}", self.token()?))
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .header("X-GitHub-Api-Version", API_VERSION))
    }

    async fn send(&self, request: RequestBuilder) -> AppResult<ApiResponse> {
        let response = self
            .authorize(request)?
            .send()
            .await
            .map_err(|err| AppError::Transport(format!("failed to call GitHub: {err}")))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unable to read response>".to_string());
        Ok(ApiResponse { status, body })
    }

    /// GET with up to `lookup_retries` extra attempts on transport errors and
    /// 5xx responses.
    async fn lookup(&self, url: Url, query: &[(&str, &str)]) -> AppResult<ApiResponse> {
        let mut attempt = 0;
        loop {
            let mut request = self.http.get(url.clone());
            if !query.is_empty() {
                request = request.query(query);
            }
            let outcome = self.send(request).await;
            let retryable = match &outcome {
                Ok(response) => response.status >= 500,
                Err(AppError::Transport(_)) => true,
                Err(_) => false,
            };
            if !retryable || attempt >= self.lookup_retries {
                return outcome;
            }
            attempt += 1;
            warn!(url = %url, attempt, "retrying lookup");
            tokio::time::sleep(self.retry_backoff * attempt).await;
        }
    }

    async fn send_json<T: Serialize + ?Sized>(
        &self,
        request: RequestBuilder,
        body: &T,
    ) -> AppResult<ApiResponse> {
        self.send(request.json(body)).await
    }
}

#[derive(Serialize)]
struct CreateRefRequest<'a> {
    #[serde(rename = "ref")]
    ref_name: &'a str,
    sha: &'a str,
}

#[async_trait]
impl RepositoryApi for GitHubClient {
    fn check_credentials(&self) -> AppResult<()> {
        self.token().map(|_| ())
    }

    async fn get_ref(&self, repo: &RepositoryCoordinates, branch: &str) -> AppResult<ApiResponse> {
        let url = self.repo_endpoint(repo, &["git", "ref", "heads", branch])?;
        debug!(%repo, branch, "looking up branch ref");
        self.lookup(url, &[]).await
    }

    async fn create_ref(
        &self,
        repo: &RepositoryCoordinates,
        ref_name: &str,
        sha: &str,
    ) -> AppResult<ApiResponse> {
        let url = self.repo_endpoint(repo, &["git", "refs"])?;
        debug!(%repo, ref_name, "creating ref");
        self.send_json(self.http.post(url), &CreateRefRequest { ref_name, sha })
            .await
    }

    async fn delete_ref(
        &self,
        repo: &RepositoryCoordinates,
        branch: &str,
    ) -> AppResult<ApiResponse> {
        let url = self.repo_endpoint(repo, &["git", "refs", "heads", branch])?;
        debug!(%repo, branch, "deleting ref");
        self.send(self.http.delete(url)).await
    }

    async fn get_contents(
        &self,
        repo: &RepositoryCoordinates,
        path: &str,
        branch: &str,
    ) -> AppResult<ApiResponse> {
        let url = self.repo_endpoint(repo, &["contents", path])?;
        debug!(%repo, path, branch, "looking up file");
        self.lookup(url, &[("ref", branch)]).await
    }

    async fn put_contents(
        &self,
        repo: &RepositoryCoordinates,
        path: &str,
        update: &ContentsUpdate,
    ) -> AppResult<ApiResponse> {
        let url = self.repo_endpoint(repo, &["contents", path])?;
        debug!(%repo, path, update = update.sha.is_some(), "writing file");
        self.send_json(self.http.put(url), update).await
    }

    async fn create_pull(
        &self,
        repo: &RepositoryCoordinates,
        draft: &PullRequestDraft,
    ) -> AppResult<ApiResponse> {
        let url = self.repo_endpoint(repo, &["pulls"])?;
        debug!(%repo, head = %draft.head, base = %draft.base, "opening pull request");
        self.send_json(self.http.post(url), draft).await
    }
}
