//! Plain-text tables for the board and its side data

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::board::Board;
use crate::types::{HistoryEntry, Ticket, TicketStatus, User};

/// A row of the board: one slot per column
#[derive(Tabled)]
struct BoardRow {
    #[tabled(rename = "To Do")]
    to_do: String,
    #[tabled(rename = "In Progress")]
    in_progress: String,
    #[tabled(rename = "Done")]
    done: String,
}

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "When")]
    changed_at: String,
    #[tabled(rename = "By")]
    changed_by: String,
    #[tabled(rename = "Change")]
    change_type: String,
    #[tabled(rename = "From")]
    old_value: String,
    #[tabled(rename = "To")]
    new_value: String,
}

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Username")]
    username: String,
}

/// Card text for a ticket inside a board cell
pub fn format_ticket_card(ticket: &Ticket) -> String {
    let mut card = format!("#{} {} ({})", ticket.id, ticket.title, ticket.priority);
    if let Some(assignee) = &ticket.assigned_user {
        card.push_str(&format!(" @{assignee}"));
    }
    card
}

/// Render the board as a three-column table, tallest column sets the height
pub fn render_board(board: &Board) -> String {
    let cell = |status: TicketStatus, row: usize| {
        board
            .column(status)
            .get(row)
            .map(format_ticket_card)
            .unwrap_or_default()
    };

    let rows: Vec<BoardRow> = (0..board.depth())
        .map(|row| BoardRow {
            to_do: cell(TicketStatus::ToDo, row),
            in_progress: cell(TicketStatus::InProgress, row),
            done: cell(TicketStatus::Done, row),
        })
        .collect();

    Table::new(rows).with(Style::modern()).to_string()
}

pub fn render_history(entries: &[HistoryEntry]) -> String {
    let rows = entries.iter().map(|entry| HistoryRow {
        changed_at: entry.changed_at.clone(),
        changed_by: entry.changed_by.clone(),
        change_type: entry.change_type.clone(),
        old_value: entry.old_value.clone().unwrap_or_else(|| "-".to_string()),
        new_value: entry.new_value.clone().unwrap_or_else(|| "-".to_string()),
    });
    Table::new(rows).with(Style::modern()).to_string()
}

pub fn render_users(users: &[User]) -> String {
    let rows = users.iter().map(|user| UserRow {
        id: user.id.to_string(),
        username: user.username.clone(),
    });
    Table::new(rows).with(Style::modern()).to_string()
}
