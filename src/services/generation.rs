use async_trait::async_trait;

use crate::domain::files::FileSet;
use crate::error::AppResult;

#[async_trait]
pub trait CodeGenerationService: Send + Sync {
    async fn generate_implementation(&self, requirements: &str) -> AppResult<FileSet>;
}

#[async_trait]
pub trait TestGenerationService: Send + Sync {
    async fn generate_tests(
        &self,
        implementation: &FileSet,
        requirements: &str,
    ) -> AppResult<FileSet>;
}
