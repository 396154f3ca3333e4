use owo_colors::OwoColorize;

use super::CommandContext;
use crate::error::Result;
use crate::types::{ProjectId, TicketId, TicketPatch, TicketPriority, UserId};

/// Field changes requested on the command line
#[derive(Debug, Default)]
pub struct EditOptions {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TicketPriority>,
    pub assignee: Option<UserId>,
    pub unassign: bool,
}

impl EditOptions {
    fn into_patch(self) -> TicketPatch {
        let assigned_user_id = if self.unassign {
            Some(None)
        } else {
            self.assignee.map(Some)
        };
        TicketPatch {
            title: self.title,
            description: self.description,
            status: None,
            priority: self.priority,
            assigned_user_id,
        }
    }
}

pub async fn cmd_edit(
    api_url: Option<&str>,
    project: ProjectId,
    ticket: TicketId,
    options: EditOptions,
) -> Result<()> {
    let ctx = CommandContext::open(api_url, project).await?;
    let updated = ctx.store.edit_ticket(ticket, options.into_patch()).await;
    ctx.flush();
    let updated = updated?;

    println!("{} {}", format!("#{}", updated.id).cyan(), updated.title);
    Ok(())
}

pub async fn cmd_delete(api_url: Option<&str>, project: ProjectId, ticket: TicketId) -> Result<()> {
    let ctx = CommandContext::open(api_url, project).await?;
    let deleted = ctx.store.delete_ticket(ticket).await;
    ctx.flush();
    deleted
}
