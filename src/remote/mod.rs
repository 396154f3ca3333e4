//! Ticket repository: the remote source of truth for tickets.
//!
//! The board talks to the server only through [`TicketRepository`]. The
//! production implementation is [`HttpTicketRepository`]; tests substitute
//! in-memory fakes.

pub mod error;
pub mod http;

use std::future::Future;

use crate::types::{HistoryEntry, ProjectId, Ticket, TicketDraft, TicketId, TicketPatch, User};

pub use error::ApiError;
pub use http::HttpTicketRepository;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Remote CRUD for one user's view of tickets
pub trait TicketRepository: Send + Sync {
    /// Fetch every ticket belonging to a project
    fn list(&self, project: ProjectId) -> impl Future<Output = ApiResult<Vec<Ticket>>> + Send;

    /// Create a ticket in the first workflow column
    fn create(
        &self,
        project: ProjectId,
        draft: &TicketDraft,
    ) -> impl Future<Output = ApiResult<Ticket>> + Send;

    /// Apply a partial update and return the server's record
    fn update(
        &self,
        id: TicketId,
        patch: &TicketPatch,
    ) -> impl Future<Output = ApiResult<Ticket>> + Send;

    fn delete(&self, id: TicketId) -> impl Future<Output = ApiResult<()>> + Send;

    /// Users assigned to a project, for resolving assignees
    fn project_users(&self, project: ProjectId)
    -> impl Future<Output = ApiResult<Vec<User>>> + Send;

    /// Server-side change log for a ticket
    fn history(&self, id: TicketId) -> impl Future<Output = ApiResult<Vec<HistoryEntry>>> + Send;
}
