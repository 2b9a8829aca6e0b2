use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::repository::RepositoryCoordinates;
use crate::error::{AppError, AppResult};

const CONFIG_DIR_NAME: &str = "sdlc";
const CONFIG_FILE_NAME: &str = "config.toml";

pub const DEFAULT_REPO: &str = "ascii-art-converter";
pub const DEFAULT_BASE_BRANCH: &str = "main";
pub const DEFAULT_API_URL: &str = "https://api.github.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_REPOSITORIES_DIR: &str = "repositories";

pub fn config_directory() -> AppResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME))
        .ok_or_else(|| AppError::Configuration("could not determine config directory".to_string()))
}

pub fn config_file_path() -> AppResult<PathBuf> {
    Ok(config_directory()?.join(CONFIG_FILE_NAME))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredConfig {
    pub github_token: Option<String>,
    pub github_owner: Option<String>,
    pub github_repo: Option<String>,
    pub github_repo_url: Option<String>,
    pub github_base_branch: Option<String>,
    pub github_api_url: Option<String>,
    pub jira_base_url: Option<String>,
    pub jira_email: Option<String>,
    pub jira_token: Option<String>,
    pub jira_project: Option<String>,
    pub tracker: Option<String>,
    pub repositories_dir: Option<String>,
    pub http_timeout_secs: Option<u64>,
    pub lookup_retries: Option<u32>,
}

impl StoredConfig {
    pub fn load() -> AppResult<Self> {
        Self::load_from(&config_file_path()?)
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).map_err(|err| {
                AppError::Configuration(format!("invalid config file {}: {err}", path.display()))
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(AppError::Io(err)),
        }
    }

    pub fn save(&self) -> AppResult<()> {
        self.save_to(&config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = toml::to_string_pretty(self)
            .map_err(|err| AppError::Configuration(format!("failed to write config: {err}")))?;
        fs::write(path, data)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerProvider {
    Fixture,
    Jira,
    Custom(String),
}

impl TrackerProvider {
    fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "" | "fixture" | "mock" => TrackerProvider::Fixture,
            "jira" => TrackerProvider::Jira,
            other => TrackerProvider::Custom(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GitHubSettings {
    pub token: Option<String>,
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub repo_url: Option<String>,
    pub base_branch: String,
    pub api_url: String,
    pub timeout: Duration,
    pub lookup_retries: u32,
}

impl GitHubSettings {
    pub fn target(&self) -> AppResult<RepositoryCoordinates> {
        let owner = non_empty(self.owner.as_deref()).ok_or_else(|| {
            AppError::Configuration(
                "GitHub owner not configured (set GITHUB_ORG, GITHUB_OWNER or GITHUB_USERNAME, or run `sdlc setup`)"
                    .to_string(),
            )
        })?;
        let repo = non_empty(self.repo.as_deref()).ok_or_else(|| {
            AppError::Configuration("GitHub repository not configured".to_string())
        })?;
        Ok(RepositoryCoordinates::new(owner, repo))
    }
}

#[derive(Debug, Clone, Default)]
pub struct JiraSettings {
    pub base_url: Option<String>,
    pub email: Option<String>,
    pub token: Option<String>,
    pub project: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub github: GitHubSettings,
    pub jira: JiraSettings,
    pub tracker: TrackerProvider,
    pub repositories_dir: PathBuf,
}

impl AppConfig {
    pub fn load(workspace_root: &Path) -> AppResult<Self> {
        let stored = StoredConfig::load()?;
        Self::resolve(stored, workspace_root, |key| env::var(key).ok())
    }

    /// Merges stored settings with environment lookups; the environment wins.
    pub fn resolve<F>(stored: StoredConfig, workspace_root: &Path, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let owner = var("GITHUB_ORG")
            .or_else(|| var("GITHUB_OWNER"))
            .or_else(|| var("GITHUB_USERNAME"))
            .or(stored.github_owner);

        let timeout_secs = match var("SDLC_HTTP_TIMEOUT_SECS") {
            Some(value) => parse_number::<u64>("SDLC_HTTP_TIMEOUT_SECS", &value)?,
            None => stored.http_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };
        if timeout_secs == 0 {
            return Err(AppError::Configuration(
                "HTTP timeout must be at least one second".to_string(),
            ));
        }
        let lookup_retries = match var("SDLC_LOOKUP_RETRIES") {
            Some(value) => parse_number::<u32>("SDLC_LOOKUP_RETRIES", &value)?,
            None => stored.lookup_retries.unwrap_or(0),
        };

        let github = GitHubSettings {
            token: var("GITHUB_TOKEN").or(stored.github_token),
            owner,
            repo: var("GITHUB_REPO")
                .or(stored.github_repo)
                .or_else(|| Some(DEFAULT_REPO.to_string())),
            repo_url: var("GITHUB_REPO_URL").or(stored.github_repo_url),
            base_branch: var("GITHUB_BASE_BRANCH")
                .or(stored.github_base_branch)
                .unwrap_or_else(|| DEFAULT_BASE_BRANCH.to_string()),
            api_url: var("GITHUB_API_URL")
                .or(stored.github_api_url)
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
            lookup_retries,
        };

        let jira = JiraSettings {
            base_url: var("JIRA_BASE_URL").or(stored.jira_base_url),
            email: var("JIRA_EMAIL").or(stored.jira_email),
            token: var("JIRA_TOKEN").or(stored.jira_token),
            project: var("JIRA_PROJECT").or(stored.jira_project),
        };

        let tracker = var("SDLC_TRACKER")
            .or(stored.tracker)
            .map(|value| TrackerProvider::parse(&value))
            .unwrap_or(TrackerProvider::Fixture);

        let repositories_dir = var("SDLC_REPOSITORIES_DIR")
            .or(stored.repositories_dir)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REPOSITORIES_DIR));
        let repositories_dir = if repositories_dir.is_absolute() {
            repositories_dir
        } else {
            workspace_root.join(repositories_dir)
        };

        Ok(Self {
            github,
            jira,
            tracker,
            repositories_dir,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> AppResult<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| AppError::Configuration(format!("{key} must be a non-negative integer")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::error::ErrorKind;

    fn resolve(stored: StoredConfig, vars: &[(&str, &str)]) -> AppResult<AppConfig> {
        let env: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        AppConfig::resolve(stored, Path::new("/work"), |key| env.get(key).cloned())
    }

    #[test]
    fn applies_defaults() {
        let config = resolve(StoredConfig::default(), &[]).unwrap();
        assert_eq!(config.github.repo.as_deref(), Some(DEFAULT_REPO));
        assert_eq!(config.github.base_branch, "main");
        assert_eq!(config.github.api_url, DEFAULT_API_URL);
        assert_eq!(config.github.timeout, Duration::from_secs(30));
        assert_eq!(config.github.lookup_retries, 0);
        assert_eq!(config.tracker, TrackerProvider::Fixture);
        assert_eq!(config.repositories_dir, PathBuf::from("/work/repositories"));
    }

    #[test]
    fn org_takes_precedence_over_username() {
        let config = resolve(
            StoredConfig::default(),
            &[("GITHUB_USERNAME", "octocat"), ("GITHUB_ORG", "acme")],
        )
        .unwrap();
        assert_eq!(config.github.owner.as_deref(), Some("acme"));
    }

    #[test]
    fn environment_overrides_stored_values() {
        let stored = StoredConfig {
            github_owner: Some("stored-owner".to_string()),
            github_repo: Some("stored-repo".to_string()),
            tracker: Some("jira".to_string()),
            ..StoredConfig::default()
        };
        let config = resolve(stored, &[("GITHUB_REPO", "env-repo")]).unwrap();
        assert_eq!(config.github.owner.as_deref(), Some("stored-owner"));
        assert_eq!(config.github.repo.as_deref(), Some("env-repo"));
        assert_eq!(config.tracker, TrackerProvider::Jira);
    }

    #[test]
    fn missing_owner_is_a_configuration_error() {
        let config = resolve(StoredConfig::default(), &[]).unwrap();
        let error = config.github.target().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn rejects_invalid_timeout() {
        let error = resolve(StoredConfig::default(), &[("SDLC_HTTP_TIMEOUT_SECS", "soon")])
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Configuration);
        let error =
            resolve(StoredConfig::default(), &[("SDLC_HTTP_TIMEOUT_SECS", "0")]).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn stored_config_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        assert_eq!(StoredConfig::load_from(&path).unwrap(), StoredConfig::default());

        let stored = StoredConfig {
            github_owner: Some("acme".to_string()),
            lookup_retries: Some(2),
            ..StoredConfig::default()
        };
        stored.save_to(&path).unwrap();
        assert_eq!(StoredConfig::load_from(&path).unwrap(), stored);
    }
}
