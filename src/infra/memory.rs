use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use base64::prelude::{BASE64_STANDARD, Engine as _};
use serde_json::json;

use crate::domain::pull_request::PullRequestDraft;
use crate::domain::repository::RepositoryCoordinates;
use crate::error::{AppError, AppResult};
use crate::services::{ApiResponse, ContentsUpdate, RepositoryApi};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetRef,
    CreateRef,
    DeleteRef,
    GetContents,
    PutContents,
    CreatePull,
}

struct Fault {
    operation: Operation,
    /// Branch or file path the fault applies to; `None` matches every call.
    target: Option<String>,
    response: ApiResponse,
}

#[derive(Default)]
struct State {
    branches: BTreeMap<String, String>,
    files: HashMap<(String, String), StoredFile>,
    pulls: Vec<PullRequestDraft>,
    calls: HashMap<Operation, usize>,
    faults: Vec<Fault>,
    commits: u64,
}

#[derive(Clone)]
struct StoredFile {
    content: String,
    sha: String,
}

impl State {
    fn record(&mut self, operation: Operation, target: &str) -> Option<ApiResponse> {
        *self.calls.entry(operation).or_default() += 1;
        self.faults
            .iter()
            .find(|fault| {
                fault.operation == operation
                    && fault.target.as_deref().is_none_or(|wanted| wanted == target)
            })
            .map(|fault| fault.response.clone())
    }

    fn next_commit_sha(&mut self, seed: &str) -> String {
        self.commits += 1;
        content_sha(&format!("commit:{}:{seed}", self.commits))
    }
}

/// In-process stand-in for one remote repository, with GitHub status codes.
#[derive(Default)]
pub struct InMemoryRepository {
    state: Mutex<State>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_branch(self, name: &str) -> Self {
        {
            let mut state = self.lock();
            let sha = state.next_commit_sha(name);
            state.branches.insert(name.to_string(), sha);
        }
        self
    }

    pub fn with_file(self, branch: &str, path: &str, content: &str) -> Self {
        self.lock().files.insert(
            (branch.to_string(), path.to_string()),
            StoredFile {
                content: content.to_string(),
                sha: content_sha(content),
            },
        );
        self
    }

    pub fn fail_on(
        self,
        operation: Operation,
        target: Option<&str>,
        status: u16,
        message: &str,
    ) -> Self {
        self.lock().faults.push(Fault {
            operation,
            target: target.map(str::to_string),
            response: ApiResponse::new(status, json!({ "message": message }).to_string()),
        });
        self
    }

    pub fn calls(&self, operation: Operation) -> usize {
        self.lock().calls.get(&operation).copied().unwrap_or(0)
    }

    pub fn has_branch(&self, name: &str) -> bool {
        self.lock().branches.contains_key(name)
    }

    pub fn file(&self, branch: &str, path: &str) -> Option<String> {
        self.lock()
            .files
            .get(&(branch.to_string(), path.to_string()))
            .map(|file| file.content.clone())
    }

    pub fn pull_requests(&self) -> Vec<PullRequestDraft> {
        self.lock().pulls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // State stays consistent even if a holder panicked mid-test.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn content_sha(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex()[..40].to_string()
}

fn not_found() -> ApiResponse {
    ApiResponse::new(404, json!({ "message": "Not Found" }).to_string())
}

fn unprocessable(message: &str) -> ApiResponse {
    ApiResponse::new(422, json!({ "message": message }).to_string())
}

#[async_trait]
impl RepositoryApi for InMemoryRepository {
    fn check_credentials(&self) -> AppResult<()> {
        Ok(())
    }

    async fn get_ref(&self, _repo: &RepositoryCoordinates, branch: &str) -> AppResult<ApiResponse> {
        let mut state = self.lock();
        if let Some(response) = state.record(Operation::GetRef, branch) {
            return Ok(response);
        }
        Ok(match state.branches.get(branch) {
            Some(sha) => ApiResponse::new(
                200,
                json!({
                    "ref": format!("refs/heads/{branch}"),
                    "object": { "sha": sha, "type": "commit" },
                })
                .to_string(),
            ),
            None => not_found(),
        })
    }

    async fn create_ref(
        &self,
        _repo: &RepositoryCoordinates,
        ref_name: &str,
        sha: &str,
    ) -> AppResult<ApiResponse> {
        let mut state = self.lock();
        let target = ref_name.strip_prefix("refs/heads/");
        if let Some(response) = state.record(Operation::CreateRef, target.unwrap_or(ref_name)) {
            return Ok(response);
        }
        let Some(branch) = target else {
            return Ok(unprocessable("Reference name must start with refs/heads/"));
        };
        if state.branches.contains_key(branch) {
            return Ok(unprocessable("Reference already exists"));
        }
        state.branches.insert(branch.to_string(), sha.to_string());
        Ok(ApiResponse::new(
            201,
            json!({ "ref": ref_name, "object": { "sha": sha, "type": "commit" } }).to_string(),
        ))
    }

    async fn delete_ref(
        &self,
        _repo: &RepositoryCoordinates,
        branch: &str,
    ) -> AppResult<ApiResponse> {
        let mut state = self.lock();
        if let Some(response) = state.record(Operation::DeleteRef, branch) {
            return Ok(response);
        }
        if state.branches.remove(branch).is_none() {
            return Ok(unprocessable("Reference does not exist"));
        }
        state.files.retain(|(file_branch, _), _| file_branch != branch);
        Ok(ApiResponse::new(204, ""))
    }

    async fn get_contents(
        &self,
        _repo: &RepositoryCoordinates,
        path: &str,
        branch: &str,
    ) -> AppResult<ApiResponse> {
        let mut state = self.lock();
        if let Some(response) = state.record(Operation::GetContents, path) {
            return Ok(response);
        }
        Ok(
            match state.files.get(&(branch.to_string(), path.to_string())) {
                Some(file) => ApiResponse::new(
                    200,
                    json!({
                        "type": "file",
                        "path": path,
                        "sha": file.sha,
                        "encoding": "base64",
                        "content": BASE64_STANDARD.encode(&file.content),
                    })
                    .to_string(),
                ),
                None => not_found(),
            },
        )
    }

    async fn put_contents(
        &self,
        _repo: &RepositoryCoordinates,
        path: &str,
        update: &ContentsUpdate,
    ) -> AppResult<ApiResponse> {
        let mut state = self.lock();
        if let Some(response) = state.record(Operation::PutContents, path) {
            return Ok(response);
        }
        if !state.branches.contains_key(&update.branch) {
            return Ok(ApiResponse::new(
                404,
                json!({ "message": format!("Branch {} not found", update.branch) }).to_string(),
            ));
        }

        let decoded = BASE64_STANDARD
            .decode(&update.content)
            .map_err(|err| AppError::Transport(format!("content is not base64: {err}")))?;
        let content = String::from_utf8(decoded)
            .map_err(|err| AppError::Transport(format!("content is not UTF-8: {err}")))?;

        let key = (update.branch.clone(), path.to_string());
        let status = match (state.files.get(&key), update.sha.as_deref()) {
            (None, _) => 201,
            (Some(_), None) => {
                return Ok(unprocessable("Invalid request.\n\n\"sha\" wasn't supplied."));
            }
            (Some(existing), Some(sha)) if existing.sha != sha => {
                return Ok(ApiResponse::new(
                    409,
                    json!({ "message": format!("{path} does not match {sha}") }).to_string(),
                ));
            }
            (Some(_), Some(_)) => 200,
        };

        let sha = content_sha(&content);
        let commit = state.next_commit_sha(path);
        state.branches.insert(update.branch.clone(), commit.clone());
        state.files.insert(key, StoredFile { content, sha: sha.clone() });
        Ok(ApiResponse::new(
            status,
            json!({
                "content": { "path": path, "sha": sha },
                "commit": { "sha": commit, "message": update.message },
            })
            .to_string(),
        ))
    }

    async fn create_pull(
        &self,
        repo: &RepositoryCoordinates,
        draft: &PullRequestDraft,
    ) -> AppResult<ApiResponse> {
        let mut state = self.lock();
        if let Some(response) = state.record(Operation::CreatePull, &draft.head) {
            return Ok(response);
        }
        if !state.branches.contains_key(&draft.head) || !state.branches.contains_key(&draft.base)
        {
            return Ok(unprocessable("Validation Failed"));
        }
        state.pulls.push(draft.clone());
        let number = state.pulls.len();
        Ok(ApiResponse::new(
            201,
            json!({
                "number": number,
                "html_url": format!("https://github.com/{}/{}/pull/{number}", repo.owner, repo.repo),
                "state": "open",
                "title": draft.title,
                "head": { "ref": draft.head },
                "base": { "ref": draft.base },
            })
            .to_string(),
        ))
    }
}
