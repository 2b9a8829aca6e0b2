pub mod config;
pub mod pr;
pub mod runs;
pub mod setup;
pub mod ticket;
