use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("invalid repository URL '{0}': expected https://github.com/<owner>/<repo>")]
    InvalidUrl(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("git clone of {url} failed: {message}")]
    Clone { url: String, message: String },
    #[error("base branch '{branch}' not found ({status}): {message}")]
    BaseBranchNotFound {
        branch: String,
        status: u16,
        message: String,
    },
    #[error("failed to create branch '{branch}' ({status}): {message}")]
    BranchCreation {
        branch: String,
        status: u16,
        message: String,
    },
    #[error("failed to delete branch '{branch}' ({status}): {message}")]
    BranchDeletion {
        branch: String,
        status: u16,
        message: String,
    },
    #[error("failed to push file {path} ({status}): {message}")]
    FileCommit {
        path: String,
        status: u16,
        message: String,
    },
    #[error("failed to open pull request ({status}): {message}")]
    PullRequest { status: u16, message: String },
    #[error("ticket {0} not found")]
    TicketNotFound(String),
    #[error("issue tracker error: {0}")]
    IssueTracker(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    InvalidUrl,
    InvalidRequest,
    Clone,
    BaseBranchNotFound,
    BranchCreation,
    BranchDeletion,
    FileCommit,
    PullRequest,
    TicketNotFound,
    IssueTracker,
    Transport,
    Io,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Configuration(_) => ErrorKind::Configuration,
            AppError::InvalidUrl(_) => ErrorKind::InvalidUrl,
            AppError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            AppError::Clone { .. } => ErrorKind::Clone,
            AppError::BaseBranchNotFound { .. } => ErrorKind::BaseBranchNotFound,
            AppError::BranchCreation { .. } => ErrorKind::BranchCreation,
            AppError::BranchDeletion { .. } => ErrorKind::BranchDeletion,
            AppError::FileCommit { .. } => ErrorKind::FileCommit,
            AppError::PullRequest { .. } => ErrorKind::PullRequest,
            AppError::TicketNotFound(_) => ErrorKind::TicketNotFound,
            AppError::IssueTracker(_) => ErrorKind::IssueTracker,
            AppError::Transport(_) => ErrorKind::Transport,
            AppError::Io(_) => ErrorKind::Io,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::BaseBranchNotFound { status, .. }
            | AppError::BranchCreation { status, .. }
            | AppError::BranchDeletion { status, .. }
            | AppError::FileCommit { status, .. }
            | AppError::PullRequest { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
