use std::path::Path;

use async_trait::async_trait;

use crate::error::AppResult;

#[async_trait]
pub trait VersionControlService: Send + Sync {
    async fn clone_repository(&self, url: &str, destination: &Path) -> AppResult<()>;
}
