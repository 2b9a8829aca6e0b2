use crate::context::AppContext;
use crate::domain::ticket::Ticket;
use crate::error::AppResult;

pub async fn list(ctx: &AppContext) -> AppResult<()> {
    let tickets = ctx.issue_tracker.list_open_tickets().await?;
    print!("{}", format_table(&tickets));
    println!("\n{} open ticket(s)", tickets.len());
    Ok(())
}

pub async fn show(ctx: &AppContext, ticket_id: &str) -> AppResult<()> {
    let ticket = ctx.issue_tracker.get_ticket_details(ticket_id).await?;
    println!("{}", format_details(&ticket));
    Ok(())
}

fn format_table(tickets: &[Ticket]) -> String {
    let mut table = String::from("| Key | Summary | Type | Priority | Assignee |\n");
    table.push_str("|-----|---------|------|----------|----------|\n");
    for ticket in tickets {
        table.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            ticket.key,
            ticket.summary,
            ticket.issue_type.as_deref().unwrap_or("-"),
            ticket.priority.as_deref().unwrap_or("-"),
            ticket.assignee.as_deref().unwrap_or("-"),
        ));
    }
    table
}

fn format_details(ticket: &Ticket) -> String {
    let mut out = format!("# {}: {}\n\n", ticket.key, ticket.summary);
    out.push_str(&format!("Status:   {}\n", ticket.status));
    let optional = [
        ("Type", &ticket.issue_type),
        ("Priority", &ticket.priority),
        ("Assignee", &ticket.assignee),
        ("Reporter", &ticket.reporter),
        ("Created", &ticket.created),
        ("Updated", &ticket.updated),
        ("Link", &ticket.url),
    ];
    for (label, value) in optional {
        if let Some(value) = value {
            out.push_str(&format!("{:<9} {value}\n", format!("{label}:")));
        }
    }
    out.push('\n');
    out.push_str(&ticket.requirements_document());
    out
}
