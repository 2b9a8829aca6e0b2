pub mod directory;
pub mod fixtures;
pub mod git;
pub mod github;
pub mod jira;
pub mod memory;
