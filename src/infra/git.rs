use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::services::VersionControlService;

pub struct GitCli;

#[async_trait]
impl VersionControlService for GitCli {
    async fn clone_repository(&self, url: &str, destination: &Path) -> AppResult<()> {
        info!(url, destination = %destination.display(), "cloning repository");
        let output = Command::new("git")
            .arg("clone")
            .arg(url)
            .arg(destination)
            .output()
            .await
            .map_err(|err| AppError::Clone {
                url: url.to_string(),
                message: format!("failed to run git: {err}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Clone {
                url: url.to_string(),
                message: format!("git exited with {}: {}", output.status, stderr.trim()),
            });
        }
        Ok(())
    }
}
