use serde::Deserialize;
use tracing::{debug, info};

use crate::domain::branch::{BranchName, BranchState, EnsuredBranch};
use crate::domain::repository::RepositoryCoordinates;
use crate::error::{AppError, AppResult};
use crate::services::RepositoryApi;

const ALREADY_EXISTS: &str = "reference already exists";

#[derive(Deserialize)]
struct RefResponse {
    object: RefObject,
}

#[derive(Deserialize)]
struct RefObject {
    sha: String,
}

pub struct BranchManager<'a> {
    api: &'a dyn RepositoryApi,
    repo: &'a RepositoryCoordinates,
}

impl<'a> BranchManager<'a> {
    pub fn new(api: &'a dyn RepositoryApi, repo: &'a RepositoryCoordinates) -> Self {
        Self { api, repo }
    }

    /// Creates `name` at the tip of `base_branch`. A branch that already
    /// exists counts as success with `BranchState::AlreadyExisted`; its head
    /// is left untouched.
    pub async fn ensure_branch(
        &self,
        name: &BranchName,
        base_branch: &str,
    ) -> AppResult<EnsuredBranch> {
        let base_sha = self.base_sha(base_branch).await?;
        debug!(base_branch, %base_sha, "resolved base branch");

        let response = self
            .api
            .create_ref(self.repo, &name.ref_name(), &base_sha)
            .await?;

        let state = if response.is_success() {
            info!(branch = %name, base_branch, "created branch");
            BranchState::Created
        } else if response.message().to_lowercase().contains(ALREADY_EXISTS) {
            info!(branch = %name, "branch already exists, reusing it");
            BranchState::AlreadyExisted
        } else {
            return Err(AppError::BranchCreation {
                branch: name.to_string(),
                status: response.status,
                message: response.message(),
            });
        };

        Ok(EnsuredBranch {
            name: name.clone(),
            base_branch: base_branch.to_string(),
            state,
        })
    }

    pub async fn delete_branch(&self, name: &BranchName) -> AppResult<()> {
        let response = self.api.delete_ref(self.repo, name.as_str()).await?;
        if !response.is_success() {
            return Err(AppError::BranchDeletion {
                branch: name.to_string(),
                status: response.status,
                message: response.message(),
            });
        }
        info!(branch = %name, "deleted branch");
        Ok(())
    }

    async fn base_sha(&self, base_branch: &str) -> AppResult<String> {
        let response = self.api.get_ref(self.repo, base_branch).await?;
        if response.is_not_found() {
            return Err(AppError::BaseBranchNotFound {
                branch: base_branch.to_string(),
                status: response.status,
                message: response.message(),
            });
        }
        if !response.is_success() {
            return Err(AppError::BranchCreation {
                branch: base_branch.to_string(),
                status: response.status,
                message: format!("base branch lookup failed: {}", response.message()),
            });
        }
        let payload: RefResponse = response.json()?;
        Ok(payload.object.sha)
    }
}
