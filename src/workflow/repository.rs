use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::domain::repository::{LocalRepository, RepositoryCoordinates};
use crate::error::{AppError, AppResult};
use crate::services::VersionControlService;

pub struct RepositoryLocator<'a> {
    version_control: &'a dyn VersionControlService,
    repositories_dir: PathBuf,
}

impl<'a> RepositoryLocator<'a> {
    pub fn new(version_control: &'a dyn VersionControlService, repositories_dir: &Path) -> Self {
        Self {
            version_control,
            repositories_dir: repositories_dir.to_path_buf(),
        }
    }

    pub fn resolve(url: &str) -> AppResult<RepositoryCoordinates> {
        let trimmed = url.trim().trim_end_matches('/');
        let segments: Vec<&str> = trimmed.split(['/', ':']).collect();
        if segments.len() < 2 {
            return Err(AppError::InvalidUrl(url.to_string()));
        }
        let owner = segments[segments.len() - 2].trim();
        let repo = segments[segments.len() - 1].trim();
        if !is_plain_segment(owner) || !is_plain_segment(repo) {
            return Err(AppError::InvalidUrl(url.to_string()));
        }
        Ok(RepositoryCoordinates::new(owner, repo))
    }

    /// Clones `url` into `<repositories_dir>/<repo>`. Whatever already lives
    /// at that path is deleted first.
    pub async fn setup(&self, url: &str) -> AppResult<LocalRepository> {
        let coordinates = Self::resolve(url)?;
        let local_path = self.repositories_dir.join(&coordinates.repo);
        if local_path.parent() != Some(self.repositories_dir.as_path()) {
            return Err(AppError::InvalidUrl(url.to_string()));
        }

        match tokio::fs::metadata(&local_path).await {
            Ok(metadata) => {
                warn!(path = %local_path.display(), "removing existing working copy");
                if metadata.is_dir() {
                    tokio::fs::remove_dir_all(&local_path).await?;
                } else {
                    tokio::fs::remove_file(&local_path).await?;
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(AppError::Io(err)),
        }
        tokio::fs::create_dir_all(&self.repositories_dir).await?;

        self.version_control
            .clone_repository(url.trim(), &local_path)
            .await?;
        info!(repository = %coordinates, path = %local_path.display(), "repository ready");

        Ok(LocalRepository {
            coordinates,
            url: url.trim().to_string(),
            local_path,
        })
    }
}

fn is_plain_segment(segment: &str) -> bool {
    !segment.is_empty() && segment != "." && segment != ".." && !segment.contains('\\')
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::ErrorKind;

    #[derive(Default)]
    struct RecordingGit {
        clones: Mutex<Vec<(String, PathBuf)>>,
        fail: bool,
    }

    #[async_trait]
    impl VersionControlService for RecordingGit {
        async fn clone_repository(&self, url: &str, destination: &Path) -> AppResult<()> {
            self.clones
                .lock()
                .unwrap()
                .push((url.to_string(), destination.to_path_buf()));
            if self.fail {
                return Err(AppError::Clone {
                    url: url.to_string(),
                    message: "exit status: 128".to_string(),
                });
            }
            assert!(!destination.exists(), "clone target must be empty");
            std::fs::create_dir_all(destination.join(".git"))?;
            Ok(())
        }
    }

    #[test]
    fn resolves_last_two_segments() {
        for (url, owner, repo) in [
            ("https://github.com/acme/ascii-art-converter", "acme", "ascii-art-converter"),
            ("https://github.com/acme/ascii-art-converter///", "acme", "ascii-art-converter"),
            ("acme/tools", "acme", "tools"),
            ("git@github.com:acme/tools.git", "acme", "tools.git"),
            ("https://example.com/group/sub/acme/tools", "acme", "tools"),
        ] {
            let coordinates = RepositoryLocator::resolve(url).unwrap();
            assert_eq!(coordinates, RepositoryCoordinates::new(owner, repo), "{url}");
        }
    }

    #[test]
    fn rejects_short_or_empty_segments() {
        for url in ["", "ascii-art-converter", "/", "acme//", "acme//tools"] {
            let error = RepositoryLocator::resolve(url).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::InvalidUrl, "{url}");
        }
    }

    #[test]
    fn rejects_dot_segments() {
        for url in [
            "https://github.com/acme/..",
            "https://github.com/acme/.",
            "https://github.com/../tools",
            "git@github.com:acme/..",
            "https://github.com/acme/..\\..",
        ] {
            let error = RepositoryLocator::resolve(url).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::InvalidUrl, "{url}");
        }
    }

    #[tokio::test]
    async fn setup_never_touches_paths_outside_the_clone_root() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = dir.path().join("workspace");
        let repositories = workspace.join("repositories");
        std::fs::create_dir_all(&repositories).unwrap();
        std::fs::write(workspace.join("precious.txt"), "keep").unwrap();

        let git = RecordingGit {
            fail: true,
            ..RecordingGit::default()
        };
        let locator = RepositoryLocator::new(&git, &repositories);
        let error = locator
            .setup("https://github.com/acme/..")
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::InvalidUrl);
        assert!(workspace.join("precious.txt").exists());
        assert!(repositories.exists());
        assert!(git.clones.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn setup_replaces_existing_working_copy() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("tools");
        std::fs::create_dir_all(&stale).unwrap();
        std::fs::write(stale.join("stale.txt"), "old").unwrap();

        let git = RecordingGit::default();
        let locator = RepositoryLocator::new(&git, dir.path());
        let local = locator
            .setup("https://github.com/acme/tools")
            .await
            .unwrap();

        assert_eq!(local.coordinates, RepositoryCoordinates::new("acme", "tools"));
        assert_eq!(local.local_path, stale);
        assert!(!stale.join("stale.txt").exists());
        assert!(stale.join(".git").exists());
        assert_eq!(git.clones.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn setup_reports_clone_failure() {
        let dir = tempfile::tempdir().unwrap();
        let git = RecordingGit {
            fail: true,
            ..RecordingGit::default()
        };
        let locator = RepositoryLocator::new(&git, dir.path());
        let error = locator
            .setup("https://github.com/acme/tools")
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Clone);
    }

    #[tokio::test]
    async fn setup_rejects_invalid_url_before_cloning() {
        let dir = tempfile::tempdir().unwrap();
        let git = RecordingGit::default();
        let locator = RepositoryLocator::new(&git, dir.path());
        let error = locator.setup("tools").await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidUrl);
        assert!(git.clones.lock().unwrap().is_empty());
    }
}
