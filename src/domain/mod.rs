pub mod branch;
pub mod files;
pub mod pull_request;
pub mod repository;
pub mod ticket;
