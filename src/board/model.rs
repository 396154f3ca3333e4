//! Board partition types.
//!
//! A [`Board`] is never stored: it is derived from the flat ticket list each
//! time it is asked for, so a ticket is always in exactly one column and the
//! column is always its `status`.

use crate::types::{Ticket, TicketId, TicketStatus};

/// The workflow columns in display order
pub const COLUMNS: [TicketStatus; 3] = [
    TicketStatus::ToDo,
    TicketStatus::InProgress,
    TicketStatus::Done,
];

/// Column every new ticket enters
pub const ENTRY_STATUS: TicketStatus = COLUMNS[0];

/// Position of a status in [`COLUMNS`]
pub fn column_index(status: TicketStatus) -> usize {
    match status {
        TicketStatus::ToDo => 0,
        TicketStatus::InProgress => 1,
        TicketStatus::Done => 2,
    }
}

/// A drop gesture resolved to a concrete request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragIntent {
    pub ticket_id: TicketId,
    pub target_status: TicketStatus,
}

/// Tickets grouped by workflow column
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Board {
    columns: [Vec<Ticket>; 3],
}

impl Board {
    /// Group tickets by status, keeping their relative order
    pub fn from_tickets(tickets: &[Ticket]) -> Self {
        let mut columns: [Vec<Ticket>; 3] = Default::default();
        for ticket in tickets {
            columns[column_index(ticket.status)].push(ticket.clone());
        }
        Self { columns }
    }

    pub fn column(&self, status: TicketStatus) -> &[Ticket] {
        &self.columns[column_index(status)]
    }

    /// Columns in display order
    pub fn columns(&self) -> impl Iterator<Item = (TicketStatus, &[Ticket])> {
        COLUMNS
            .into_iter()
            .map(move |status| (status, self.column(status)))
    }

    /// The column a ticket currently sits in
    pub fn column_of(&self, id: TicketId) -> Option<TicketStatus> {
        self.columns()
            .find(|(_, tickets)| tickets.iter().any(|t| t.id == id))
            .map(|(status, _)| status)
    }

    pub fn count(&self, status: TicketStatus) -> usize {
        self.column(status).len()
    }

    pub fn len(&self) -> usize {
        self.columns.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Length of the tallest column
    pub fn depth(&self) -> usize {
        self.columns.iter().map(Vec::len).max().unwrap_or(0)
    }
}
