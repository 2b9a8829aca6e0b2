pub mod branch;
pub mod commit;
pub mod coordinator;
pub mod delivery;
pub mod pull_request;
pub mod repository;
