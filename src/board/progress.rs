//! Per-column counts and completion percentage

use std::fmt;

use super::model::{Board, COLUMNS};
use crate::types::{Ticket, TicketStatus};

/// Counts of tickets by column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressSummary {
    pub to_do: usize,
    pub in_progress: usize,
    pub done: usize,
}

impl ProgressSummary {
    pub fn from_board(board: &Board) -> Self {
        Self {
            to_do: board.count(TicketStatus::ToDo),
            in_progress: board.count(TicketStatus::InProgress),
            done: board.count(TicketStatus::Done),
        }
    }

    pub fn from_tickets(tickets: &[Ticket]) -> Self {
        Self::from_board(&Board::from_tickets(tickets))
    }

    /// Get count for a specific column
    pub fn for_status(&self, status: TicketStatus) -> usize {
        match status {
            TicketStatus::ToDo => self.to_do,
            TicketStatus::InProgress => self.in_progress,
            TicketStatus::Done => self.done,
        }
    }

    pub fn total(&self) -> usize {
        self.to_do + self.in_progress + self.done
    }

    /// Tickets sitting in a terminal column
    pub fn completed(&self) -> usize {
        COLUMNS
            .into_iter()
            .filter(TicketStatus::is_terminal)
            .map(|status| self.for_status(status))
            .sum()
    }

    /// Share of completed tickets, 0..=100. An empty board is 0%.
    pub fn completion_percent(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.completed() as f64 / total as f64 * 100.0
    }
}

impl fmt::Display for ProgressSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "To Do: {} | In Progress: {} | Done: {} | Completion: {:.0}%",
            self.to_do,
            self.in_progress,
            self.done,
            self.completion_percent()
        )
    }
}
