use tracing::info;

use crate::context::AppContext;
use crate::domain::files::FileSet;
use crate::domain::ticket::Ticket;
use crate::error::{AppError, AppResult};
use crate::workflow::coordinator::{PrWorkflowCoordinator, WorkflowRequest, WorkflowResult};

#[derive(Debug, Clone, Default)]
pub struct DeliveryRequest {
    pub ticket_id: String,
    pub branch: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

pub struct DeliveryOutcome {
    pub ticket: Ticket,
    pub files: FileSet,
    pub result: WorkflowResult,
}

/// Ticket -> requirements -> implementation -> tests -> pull request.
pub async fn deliver_ticket(
    ctx: &AppContext,
    request: DeliveryRequest,
) -> AppResult<DeliveryOutcome> {
    let ticket_id = request.ticket_id.trim();
    if ticket_id.is_empty() {
        return Err(AppError::InvalidRequest(
            "ticket id must not be empty".to_string(),
        ));
    }

    let ticket = ctx.issue_tracker.get_ticket_details(ticket_id).await?;
    let requirements = ticket.requirements_document();
    info!(ticket = %ticket.key, summary = %ticket.summary, "loaded ticket");

    let implementation = ctx
        .code_generator
        .generate_implementation(&requirements)
        .await?;
    let tests = ctx
        .test_generator
        .generate_tests(&implementation, &requirements)
        .await?;
    info!(
        implementation = implementation.len(),
        tests = tests.len(),
        "generated files"
    );

    let files = implementation.merged_with(&tests);
    let coordinator = PrWorkflowCoordinator::new(ctx.repository.as_ref(), &ctx.config.github);
    let result = coordinator
        .run(WorkflowRequest {
            ticket_id: ticket.key.clone(),
            implementation_files: implementation,
            test_files: tests,
            branch: request.branch,
            title: request.title,
            description: request.description,
        })
        .await;

    Ok(DeliveryOutcome {
        ticket,
        files,
        result,
    })
}
