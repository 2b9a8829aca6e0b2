pub mod generation;
pub mod issue_tracker;
pub mod remote_repository;
pub mod version_control;

pub use generation::{CodeGenerationService, TestGenerationService};
pub use issue_tracker::IssueTrackerService;
pub use remote_repository::{ApiResponse, ContentsUpdate, RepositoryApi};
pub use version_control::VersionControlService;
