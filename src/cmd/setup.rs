use crate::config::StoredConfig;
use crate::context::AppContext;
use crate::domain::repository::LocalRepository;
use crate::error::AppResult;
use crate::workflow::repository::RepositoryLocator;

pub async fn run(ctx: &AppContext, url: &str, save: bool) -> AppResult<LocalRepository> {
    let locator = RepositoryLocator::new(
        ctx.version_control.as_ref(),
        &ctx.config.repositories_dir,
    );
    let local = locator.setup(url).await?;

    if save {
        let mut stored = StoredConfig::load()?;
        remember(&mut stored, &local);
        stored.save()?;
    }
    Ok(local)
}

fn remember(stored: &mut StoredConfig, local: &LocalRepository) {
    stored.github_owner = Some(local.coordinates.owner.clone());
    stored.github_repo = Some(local.coordinates.repo.clone());
    stored.github_repo_url = Some(local.url.clone());
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::domain::repository::RepositoryCoordinates;

    #[test]
    fn remembers_repository_coordinates() {
        let mut stored = StoredConfig {
            github_token: Some("ghp_keep".to_string()),
            github_owner: Some("old".to_string()),
            ..StoredConfig::default()
        };
        let local = LocalRepository {
            coordinates: RepositoryCoordinates::new("acme", "tools"),
            url: "https://github.com/acme/tools".to_string(),
            local_path: PathBuf::from("/work/repositories/tools"),
        };

        remember(&mut stored, &local);
        assert_eq!(stored.github_owner.as_deref(), Some("acme"));
        assert_eq!(stored.github_repo.as_deref(), Some("tools"));
        assert_eq!(
            stored.github_repo_url.as_deref(),
            Some("https://github.com/acme/tools")
        );
        assert_eq!(stored.github_token.as_deref(), Some("ghp_keep"));
    }
}
