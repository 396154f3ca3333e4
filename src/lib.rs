pub mod board;
pub mod commands;
pub mod config;
pub mod display;
pub mod error;
pub mod notify;
pub mod remote;
pub mod session;
pub mod types;

#[cfg(test)]
mod test_guards;

pub use board::{
    Board, BoardStore, COLUMNS, DragController, DragGestures, DragIntent, DropOutcome,
    ENTRY_STATUS, LoadOutcome, ProgressSummary,
};
pub use config::Config;
pub use error::{BoardError, ErrorKind, Result};
pub use notify::{Notification, Notifier, RecordingNotifier, Severity, TracingNotifier};
pub use remote::{ApiError, HttpTicketRepository, TicketRepository};
pub use session::{Action, Session, SessionUser};
pub use types::{
    HistoryEntry, ProjectId, Role, Ticket, TicketDraft, TicketId, TicketPatch, TicketPriority,
    TicketStatus, User, UserId,
};
