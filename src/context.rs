use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::{
    CodeGenerationService, IssueTrackerService, RepositoryApi, TestGenerationService,
    VersionControlService,
};

#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub version_control: Arc<dyn VersionControlService>,
    pub issue_tracker: Arc<dyn IssueTrackerService>,
    pub code_generator: Arc<dyn CodeGenerationService>,
    pub test_generator: Arc<dyn TestGenerationService>,
    pub repository: Arc<dyn RepositoryApi>,
}

impl AppContext {
    pub fn new(
        config: AppConfig,
        version_control: Arc<dyn VersionControlService>,
        issue_tracker: Arc<dyn IssueTrackerService>,
        code_generator: Arc<dyn CodeGenerationService>,
        test_generator: Arc<dyn TestGenerationService>,
        repository: Arc<dyn RepositoryApi>,
    ) -> Self {
        Self {
            config,
            version_control,
            issue_tracker,
            code_generator,
            test_generator,
            repository,
        }
    }
}
