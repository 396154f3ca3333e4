use owo_colors::OwoColorize;

use super::CommandContext;
use crate::display::format_priority_colored;
use crate::error::Result;
use crate::types::{ProjectId, TicketDraft, TicketPriority, UserId};

/// Options for creating a new ticket
pub struct CreateOptions {
    pub project: ProjectId,
    pub title: String,
    pub description: Option<String>,
    pub priority: TicketPriority,
    pub assignee: Option<UserId>,
}

/// Create a ticket in the first column and print its id
pub async fn cmd_create(api_url: Option<&str>, options: CreateOptions) -> Result<()> {
    let ctx = CommandContext::open(api_url, options.project).await?;

    let mut draft = TicketDraft::new(options.title).priority(options.priority);
    if let Some(description) = options.description {
        draft = draft.description(description);
    }
    if let Some(user) = options.assignee {
        draft = draft.assign(user);
    }

    let created = ctx.store.create_ticket(draft).await;
    ctx.flush();
    let ticket = created?;

    println!(
        "{} {} [{}]",
        format!("#{}", ticket.id).cyan(),
        ticket.title,
        format_priority_colored(ticket.priority)
    );
    Ok(())
}
