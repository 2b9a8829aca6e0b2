use async_trait::async_trait;

use crate::domain::ticket::Ticket;
use crate::error::AppResult;

#[async_trait]
pub trait IssueTrackerService: Send + Sync {
    async fn list_open_tickets(&self) -> AppResult<Vec<Ticket>>;
    async fn get_ticket_details(&self, ticket_id: &str) -> AppResult<Ticket>;
}
