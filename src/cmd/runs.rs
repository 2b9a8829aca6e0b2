use crate::context::AppContext;
use crate::domain::branch::BranchName;
use crate::error::{AppError, AppResult};
use crate::runlog::{RunEntry, RunLog, RunStatus};
use crate::workflow::branch::BranchManager;

pub fn list() -> AppResult<()> {
    let log = RunLog::load()?;
    if log.entries().is_empty() {
        println!("No recorded runs in {}", log.path().display());
        return Ok(());
    }
    for entry in log.entries() {
        println!("{}", describe(entry));
    }
    Ok(())
}

pub async fn abort(ctx: &AppContext, ticket_id: &str) -> AppResult<BranchName> {
    let mut log = RunLog::load()?;
    let entry = log
        .latest_for_ticket(ticket_id)
        .cloned()
        .ok_or_else(|| AppError::InvalidRequest(format!("no recorded run for {ticket_id}")))?;
    if !entry.is_abortable() {
        return Err(AppError::InvalidRequest(format!(
            "latest run for {ticket_id} has nothing to clean up ({})",
            describe(&entry)
        )));
    }

    let (Some(repository), Some(branch)) = (&entry.progress.repository, &entry.progress.branch)
    else {
        return Err(AppError::InvalidRequest(format!(
            "latest run for {ticket_id} did not record its branch"
        )));
    };

    ctx.repository.check_credentials()?;
    BranchManager::new(ctx.repository.as_ref(), repository)
        .delete_branch(&branch.name)
        .await?;

    log.mark_aborted(&entry.key, entry.recorded_at);
    log.save()?;
    Ok(branch.name.clone())
}

fn describe(entry: &RunEntry) -> String {
    let status = match &entry.status {
        RunStatus::Succeeded => "succeeded".to_string(),
        RunStatus::Failed { step, error } => format!("failed at {step}: {error}"),
        RunStatus::Aborted => "aborted".to_string(),
    };
    let branch = entry
        .progress
        .branch
        .as_ref()
        .map(|branch| branch.name.to_string())
        .unwrap_or_else(|| "-".to_string());
    let pull = entry
        .progress
        .pull_request
        .as_ref()
        .map(|pull| format!(" PR #{}", pull.number))
        .unwrap_or_default();
    format!(
        "[{}] {} {} on {}{} ({} file(s))",
        entry.recorded_at,
        entry.ticket_id,
        status,
        branch,
        pull,
        entry.progress.committed_paths.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::coordinator::{WorkflowProgress, WorkflowStep};

    #[test]
    fn describes_failed_run() {
        let entry = RunEntry {
            key: "k".to_string(),
            ticket_id: "ASCII-1".to_string(),
            recorded_at: 42,
            status: RunStatus::Failed {
                step: WorkflowStep::Commit,
                error: "failed to push file a.py (409): conflict".to_string(),
            },
            progress: WorkflowProgress::default(),
        };
        assert_eq!(
            describe(&entry),
            "[42] ASCII-1 failed at commit: failed to push file a.py (409): conflict on - (0 file(s))"
        );
    }
}
