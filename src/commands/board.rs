//! Board commands (`ticketboard board`, `progress`, `move`, `users`)

use owo_colors::OwoColorize;
use serde_json::json;

use super::{CommandContext, OutputOptions, print_json};
use crate::board::{Board, DragController, DragGestures, DropOutcome};
use crate::display::{format_progress, format_status_colored, render_board, render_users};
use crate::error::Result;
use crate::types::{ProjectId, Ticket, TicketId, TicketStatus};

/// Print a project's board
pub async fn cmd_board(api_url: Option<&str>, project: ProjectId, output: OutputOptions) -> Result<()> {
    let ctx = CommandContext::connect(api_url).await?;
    let opened = ctx.store.open_project(project).await;
    ctx.flush();
    opened?;

    // the server only sometimes denormalizes the assignee name
    let tickets: Vec<Ticket> = ctx
        .store
        .tickets()
        .into_iter()
        .map(|mut ticket| {
            if ticket.assigned_user.is_none() {
                ticket.assigned_user = ctx.store.assignee(&ticket).map(|user| user.username);
            }
            ticket
        })
        .collect();
    let board = Board::from_tickets(&tickets);
    let summary = ctx.store.progress();

    if output.json {
        let columns: serde_json::Map<String, serde_json::Value> = board
            .columns()
            .map(|(status, tickets)| (status.to_string(), json!(tickets)))
            .collect();
        return print_json(&json!({
            "project_id": project,
            "columns": columns,
            "progress": {
                "to_do": summary.to_do,
                "in_progress": summary.in_progress,
                "done": summary.done,
                "completion_percent": summary.completion_percent(),
            },
        }));
    }

    println!("{}", format!("Project #{project}").bold());
    println!("{}", render_board(&board));
    println!("{summary}");
    Ok(())
}

pub async fn cmd_progress(api_url: Option<&str>, project: ProjectId, output: OutputOptions) -> Result<()> {
    let ctx = CommandContext::open(api_url, project).await?;
    let summary = ctx.store.progress();

    if output.json {
        return print_json(&json!({
            "to_do": summary.to_do,
            "in_progress": summary.in_progress,
            "done": summary.done,
            "total": summary.total(),
            "completion_percent": summary.completion_percent(),
        }));
    }

    println!("{}", format_progress(&summary));
    Ok(())
}

/// Move a ticket the same way a drop on the board would
pub async fn cmd_move(
    api_url: Option<&str>,
    project: ProjectId,
    ticket: TicketId,
    column: TicketStatus,
) -> Result<()> {
    let ctx = CommandContext::open(api_url, project).await?;
    let controller = DragController::new(ctx.store.clone());

    controller.on_drag_start(ticket);
    let outcome = controller.on_drop_on_column(column).await;
    ctx.flush();

    if let DropOutcome::Moved(intent) = outcome? {
        println!(
            "Moved {} to {}",
            format!("#{}", intent.ticket_id).cyan(),
            format_status_colored(intent.target_status)
        );
    }
    Ok(())
}

/// List the users of a project
pub async fn cmd_users(api_url: Option<&str>, project: ProjectId, output: OutputOptions) -> Result<()> {
    let ctx = CommandContext::open(api_url, project).await?;
    let loaded = ctx.store.load_roster().await;
    ctx.flush();
    loaded?;

    let users = ctx.store.roster();
    if output.json {
        return print_json(&users);
    }
    if users.is_empty() {
        println!("No users in project #{project}");
        return Ok(());
    }
    println!("{}", render_users(&users));
    Ok(())
}
