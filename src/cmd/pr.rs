use tracing::warn;

use crate::context::AppContext;
use crate::error::AppResult;
use crate::runlog::{RunEntry, RunLog};
use crate::workflow::coordinator::WorkflowResult;
use crate::workflow::delivery::{DeliveryOutcome, DeliveryRequest, deliver_ticket};

#[derive(Debug, Clone)]
pub struct PrCommandArgs {
    pub request: DeliveryRequest,
    pub record: bool,
}

pub async fn run(ctx: &AppContext, args: PrCommandArgs) -> AppResult<DeliveryOutcome> {
    let record = args.record;
    let branch_override = args.request.branch.clone();
    let outcome = deliver_ticket(ctx, args.request).await?;

    if record {
        let mut log = RunLog::load()?;
        let key = match ctx.config.github.target() {
            Ok(repository) => Some(RunLog::compute_key(
                &repository,
                &outcome.ticket.key,
                branch_override.as_deref(),
                &outcome.files,
            )),
            Err(_) => None,
        };
        if let Some(key) = key {
            if outcome.result.is_success() {
                if let Some(previous) = log.succeeded_with_key(&key) {
                    if let Some(pull) = &previous.progress.pull_request {
                        warn!(
                            number = pull.number,
                            url = %pull.url,
                            "an earlier run already opened a pull request for the same changes"
                        );
                    }
                }
            }
            log.record(RunEntry::from_result(key, &outcome.ticket.key, &outcome.result));
            log.save()?;
        }
    }

    Ok(outcome)
}

pub fn report(outcome: &DeliveryOutcome) {
    match &outcome.result {
        WorkflowResult::Success(success) => {
            println!(
                "Pull request #{} opened for {}: {}",
                success.pull_request.number, outcome.ticket.key, success.pull_request.url
            );
            println!(
                "Branch {} ({}) with {} file(s):",
                success.branch.name,
                if success.branch.created() {
                    "created"
                } else {
                    "already existed"
                },
                success.committed_paths.len()
            );
            for path in &success.committed_paths {
                println!("  {path}");
            }
        }
        WorkflowResult::Failure(failure) => {
            eprintln!(
                "Workflow for {} failed at the {} step: {}",
                outcome.ticket.key, failure.step, failure.error
            );
            if let Some(branch) = &failure.progress.branch {
                eprintln!("Branch {} was left in place.", branch.name);
                if branch.created() && failure.progress.pull_request.is_none() {
                    eprintln!(
                        "Run `sdlc abort {}` to delete it.",
                        outcome.ticket.key
                    );
                }
            }
            if !failure.progress.committed_paths.is_empty() {
                eprintln!(
                    "Files already pushed: {}",
                    failure.progress.committed_paths.join(", ")
                );
            }
        }
    }
}
