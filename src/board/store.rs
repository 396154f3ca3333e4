//! Board state store: the single owner of one project's tickets.
//!
//! Reads take a consistent snapshot under a short lock. Mutations follow the
//! same shape:
//!
//! 1. check the session role, notify and stop if it is insufficient
//! 2. take the per-ticket pending lock (a second mutation on the same ticket
//!    is rejected while the first is in flight)
//! 3. apply the change locally where the operation is optimistic
//! 4. await the repository
//! 5. reconcile with the server record, or roll back and notify
//!
//! The state mutex is never held across an `.await`. Responses that resolve
//! after [`BoardStore::close`] are dropped without touching state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;

use super::model::Board;
use super::progress::ProgressSummary;
use crate::error::{BoardError, Result};
use crate::notify::{Notifier, TracingNotifier};
use crate::remote::TicketRepository;
use crate::session::{Action, Session};
use crate::types::{
    HistoryEntry, ProjectId, Ticket, TicketDraft, TicketId, TicketPatch, TicketStatus, User,
};

/// What happened to a `load` response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The response replaced the board; carries the ticket count
    Applied(usize),
    /// A newer `load` was issued before this one resolved
    Stale,
    /// The store was closed while the request was in flight
    Abandoned,
}

#[derive(Debug, Default)]
struct BoardData {
    project: Option<ProjectId>,
    tickets: Vec<Ticket>,
    roster: Vec<User>,
    /// Generation of the load whose response is currently shown
    applied_generation: u64,
}

impl BoardData {
    /// Put back the status recorded for a pending move, unless something
    /// newer already replaced the optimistic one. Returns the restored status.
    fn rollback_status(
        &mut self,
        pending: &DashMap<TicketId, Pending>,
        id: TicketId,
        optimistic: TicketStatus,
    ) -> Option<TicketStatus> {
        let restore = pending.get(&id).and_then(|p| p.restore)?;
        let ticket = self.tickets.iter_mut().find(|t| t.id == id)?;
        if ticket.status != optimistic {
            return None;
        }
        ticket.status = restore;
        Some(restore)
    }
}

/// A mutation in flight on one ticket
#[derive(Debug, Clone, Copy)]
struct Pending {
    action: Action,
    /// Status to put back if an optimistic move does not land. Loads that
    /// arrive while the move is in flight replace it with the server's value.
    restore: Option<TicketStatus>,
}

/// Releases a ticket's pending flag when the mutation ends or is dropped.
///
/// An armed guard also undoes its optimistic move when dropped before the
/// move settled, e.g. when the caller stops polling the future.
struct PendingGuard<'a> {
    pending: &'a DashMap<TicketId, Pending>,
    state: &'a Mutex<BoardData>,
    closed: &'a AtomicBool,
    notifier: &'a dyn Notifier,
    id: TicketId,
    revert: Option<TicketStatus>,
}

impl PendingGuard<'_> {
    /// Record an optimistic move. Call with the state lock held so a load
    /// cannot slip in between the local write and the recorded restore.
    fn arm(&mut self, optimistic: TicketStatus, previous: TicketStatus) {
        if let Some(mut entry) = self.pending.get_mut(&self.id) {
            entry.restore = Some(previous);
        }
        self.revert = Some(optimistic);
    }

    /// The move has an outcome; dropping the guard only releases the ticket
    fn settle(&mut self) {
        self.revert = None;
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if let Some(optimistic) = self.revert.take()
            && !self.closed.load(Ordering::SeqCst)
        {
            let restored = self
                .state
                .lock()
                .rollback_status(self.pending, self.id, optimistic);
            tracing::warn!(ticket = %self.id, from = %optimistic, ?restored, "move cancelled before the server answered");
            if restored.is_some() {
                self.notifier
                    .warning(&format!("Move of ticket #{} was cancelled", self.id));
            }
        }
        self.pending.remove(&self.id);
    }
}

pub struct BoardStore<R> {
    repo: Arc<R>,
    session: Arc<Session>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<BoardData>,
    pending: DashMap<TicketId, Pending>,
    /// Last issued load generation
    generation: AtomicU64,
    closed: AtomicBool,
}

impl<R> std::fmt::Debug for BoardStore<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("BoardStore")
            .field("project", &state.project)
            .field("tickets", &state.tickets.len())
            .field("pending", &self.pending.len())
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish()
    }
}

impl<R: TicketRepository> BoardStore<R> {
    /// Create an empty store. Feedback goes to tracing until a notifier is set.
    pub fn new(repo: Arc<R>, session: Arc<Session>) -> Self {
        Self {
            repo,
            session,
            notifier: Arc::new(TracingNotifier),
            state: Mutex::new(BoardData::default()),
            pending: DashMap::new(),
            generation: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn project_id(&self) -> Option<ProjectId> {
        self.state.lock().project
    }

    /// Snapshot of every ticket on the board
    pub fn tickets(&self) -> Vec<Ticket> {
        self.state.lock().tickets.clone()
    }

    pub fn ticket(&self, id: TicketId) -> Option<Ticket> {
        self.state.lock().tickets.iter().find(|t| t.id == id).cloned()
    }

    /// Tickets grouped into columns, derived from one snapshot
    pub fn board(&self) -> Board {
        Board::from_tickets(&self.state.lock().tickets)
    }

    pub fn progress(&self) -> ProgressSummary {
        ProgressSummary::from_tickets(&self.state.lock().tickets)
    }

    pub fn roster(&self) -> Vec<User> {
        self.state.lock().roster.clone()
    }

    /// Resolve a ticket's assignee against the loaded roster
    pub fn assignee(&self, ticket: &Ticket) -> Option<User> {
        let user_id = ticket.assigned_user_id?;
        self.state
            .lock()
            .roster
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
    }

    /// Last issued load generation
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Generation of the load currently displayed
    pub fn applied_generation(&self) -> u64 {
        self.state.lock().applied_generation
    }

    pub fn is_pending(&self, id: TicketId) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Abandon the store. In-flight requests finish but their results are
    /// dropped: no state writes, no notifications.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!(project = ?self.project_id(), "board store closed");
        }
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Fetch a project's tickets and replace the board with them.
    ///
    /// On failure the previous board is left untouched. Tickets with a
    /// mutation in flight keep their local status so a pending move is not
    /// visually undone by the refresh.
    pub async fn load(&self, project: ProjectId) -> Result<LoadOutcome> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(%project, generation, "loading tickets");

        let result = self.repo.list(project).await;

        if self.is_closed() {
            tracing::debug!(%project, generation, "dropping load response for closed store");
            return Ok(LoadOutcome::Abandoned);
        }
        if generation != self.generation.load(Ordering::SeqCst) {
            tracing::warn!(%project, generation, latest = self.generation(), "discarding stale load response");
            return Ok(LoadOutcome::Stale);
        }

        match result {
            Ok(tickets) => Ok(self.apply_load(project, generation, tickets)),
            Err(err) => {
                let err = BoardError::from(err);
                self.notifier
                    .error(&format!("Failed to load tickets: {err}"));
                Err(err)
            }
        }
    }

    /// Install a load response. The freshness checks are repeated under the
    /// state lock: `close` or a newer load may land between the first check
    /// and taking the lock.
    fn apply_load(&self, project: ProjectId, generation: u64, mut tickets: Vec<Ticket>) -> LoadOutcome {
        let mut data = self.state.lock();
        if self.is_closed() {
            tracing::debug!(%project, generation, "dropping load response for closed store");
            return LoadOutcome::Abandoned;
        }
        if generation != self.generation.load(Ordering::SeqCst) || generation <= data.applied_generation {
            tracing::warn!(%project, generation, applied = data.applied_generation, "discarding stale load response");
            return LoadOutcome::Stale;
        }

        if data.project == Some(project) {
            self.keep_pending_statuses(&data.tickets, &mut tickets);
        } else {
            data.roster.clear();
        }
        let count = tickets.len();
        data.project = Some(project);
        data.tickets = tickets;
        data.applied_generation = generation;
        tracing::debug!(%project, generation, count, "board replaced");
        LoadOutcome::Applied(count)
    }

    /// Keep the local status of tickets with a mutation in flight. A pending
    /// move learns the server's status as its new rollback target.
    fn keep_pending_statuses(&self, local: &[Ticket], incoming: &mut [Ticket]) {
        for ticket in incoming.iter_mut() {
            let Some(mut entry) = self.pending.get_mut(&ticket.id) else {
                continue;
            };
            if entry.restore.is_some() {
                entry.restore = Some(ticket.status);
            }
            if let Some(current) = local.iter().find(|t| t.id == ticket.id) {
                ticket.status = current.status;
            }
        }
    }

    /// Fetch the project's users for assignee lookups
    pub async fn load_roster(&self) -> Result<usize> {
        let project = self.require_project()?;
        let result = self.repo.project_users(project).await;
        if self.is_closed() {
            return Ok(0);
        }
        match result {
            Ok(users) => {
                let count = users.len();
                let mut data = self.state.lock();
                if data.project == Some(project) {
                    data.roster = users;
                }
                Ok(count)
            }
            Err(err) => {
                let err = BoardError::from(err);
                self.notifier.error(&format!("Failed to load users: {err}"));
                Err(err)
            }
        }
    }

    /// Load a project's tickets and its roster concurrently. A roster failure
    /// is reported but does not fail the call.
    pub async fn open_project(&self, project: ProjectId) -> Result<LoadOutcome> {
        let (outcome, users) = futures::join!(self.load(project), self.repo.project_users(project));
        let outcome = outcome?;

        if let LoadOutcome::Applied(_) = outcome {
            match users {
                Ok(users) => {
                    let mut data = self.state.lock();
                    if data.project == Some(project) {
                        data.roster = users;
                    }
                }
                Err(err) => {
                    let err = BoardError::from(err);
                    self.notifier
                        .warning(&format!("Failed to load users: {err}"));
                }
            }
        }
        Ok(outcome)
    }

    /// Server-side change log of a ticket
    pub async fn history(&self, id: TicketId) -> Result<Vec<HistoryEntry>> {
        self.repo.history(id).await.map_err(|err| {
            let err = BoardError::from(err);
            if !self.is_closed() {
                self.notifier
                    .error(&format!("Failed to load history for ticket #{id}: {err}"));
            }
            err
        })
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Move a ticket to another column.
    ///
    /// The change is visible immediately; if the server rejects it the ticket
    /// returns to the column it was in before the call, or to the status a
    /// load reported while the move was in flight. Dropping the future before
    /// it resolves rolls back the same way. Moving a ticket to the column it
    /// is already in still issues the update.
    pub async fn move_ticket(&self, id: TicketId, target: TicketStatus) -> Result<()> {
        self.ensure_authorized(Action::Move)?;
        let mut guard = self.acquire(id, Action::Move)?;

        let previous = {
            let mut data = self.state.lock();
            let previous = data.tickets.iter_mut().find(|t| t.id == id).map(|ticket| {
                let previous = ticket.status;
                ticket.status = target;
                previous
            });
            if let Some(previous) = previous {
                guard.arm(target, previous);
            }
            previous
        };
        let Some(previous) = previous else {
            return Err(self.not_found(id));
        };
        tracing::debug!(ticket = %id, from = %previous, to = %target, "optimistic move");

        let result = self.repo.update(id, &TicketPatch::status(target)).await;
        guard.settle();

        if self.is_closed() {
            tracing::debug!(ticket = %id, "dropping move response for closed store");
            return Ok(());
        }

        match result {
            Ok(confirmed) => {
                self.reconcile(confirmed);
                Ok(())
            }
            Err(err) => {
                let err = BoardError::from(err);
                let restored = self
                    .state
                    .lock()
                    .rollback_status(&self.pending, id, target);
                tracing::warn!(ticket = %id, from = %target, ?restored, error = %err, "move rejected");
                self.notifier
                    .error(&format!("Failed to move ticket #{id}: {err}"));
                Err(err)
            }
        }
    }

    /// Create a ticket in the first column, then reload the board to pick up
    /// the server's record.
    pub async fn create_ticket(&self, draft: TicketDraft) -> Result<Ticket> {
        self.ensure_authorized(Action::Create)?;

        let title = draft.title.trim();
        if title.is_empty() {
            return Err(self.invalid("Title is required!"));
        }
        let project = self.require_project()?;
        let draft = TicketDraft {
            title: title.to_string(),
            ..draft
        };

        let result = self.repo.create(project, &draft).await;
        if self.is_closed() {
            return result.map_err(BoardError::from);
        }

        match result {
            Ok(created) => {
                tracing::debug!(ticket = %created.id, %project, "ticket created");
                self.notifier.success("Ticket created successfully!");
                // load reports its own failure
                let _ = self.load(project).await;
                Ok(created)
            }
            Err(err) => {
                let err = BoardError::from(err);
                self.notifier
                    .error(&format!("Failed to create ticket: {err}"));
                Err(err)
            }
        }
    }

    /// Update a ticket's fields. Not optimistic: local state changes only
    /// once the server has accepted the patch.
    pub async fn edit_ticket(&self, id: TicketId, patch: TicketPatch) -> Result<Ticket> {
        self.ensure_authorized(Action::Edit)?;

        if patch.is_empty() {
            return Err(self.invalid("Nothing to update"));
        }
        if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(self.invalid("Title is required!"));
        }

        let _guard = self.acquire(id, Action::Edit)?;
        if self.ticket(id).is_none() {
            return Err(self.not_found(id));
        }

        let result = self.repo.update(id, &patch).await;
        if self.is_closed() {
            return result.map_err(BoardError::from);
        }

        match result {
            Ok(confirmed) => {
                self.reconcile(confirmed.clone());
                self.notifier.success("Ticket updated successfully!");
                Ok(confirmed)
            }
            Err(err) => {
                let err = BoardError::from(err);
                self.notifier
                    .error(&format!("Failed to update ticket #{id}: {err}"));
                Err(err)
            }
        }
    }

    pub async fn delete_ticket(&self, id: TicketId) -> Result<()> {
        self.ensure_authorized(Action::Delete)?;

        let _guard = self.acquire(id, Action::Delete)?;
        if self.ticket(id).is_none() {
            return Err(self.not_found(id));
        }

        let result = self.repo.delete(id).await;
        if self.is_closed() {
            return result.map_err(BoardError::from);
        }

        match result {
            Ok(()) => {
                self.state.lock().tickets.retain(|t| t.id != id);
                tracing::debug!(ticket = %id, "ticket deleted");
                self.notifier.success("Ticket deleted successfully!");
                Ok(())
            }
            Err(err) => {
                let err = BoardError::from(err);
                self.notifier
                    .error(&format!("Failed to delete ticket #{id}: {err}"));
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    /// Check the session role, notifying a warning when it falls short
    pub fn ensure_authorized(&self, action: Action) -> Result<()> {
        if self.session.is_authorized(action) {
            return Ok(());
        }
        // only guests are ever denied once signed in
        let message = match self.session.role() {
            Some(_) => format!("Guests cannot {action} tickets!"),
            None => format!("Sign in to {action} tickets"),
        };
        self.notifier.warning(&message);
        Err(BoardError::Authorization(message))
    }

    fn acquire(&self, id: TicketId, action: Action) -> Result<PendingGuard<'_>> {
        match self.pending.entry(id) {
            Entry::Occupied(existing) => {
                let in_flight = existing.get().action;
                drop(existing);
                tracing::debug!(ticket = %id, %in_flight, requested = %action, "mutation rejected, ticket busy");
                let err = BoardError::MutationPending(id);
                self.notifier.warning(&err.to_string());
                Err(err)
            }
            Entry::Vacant(slot) => {
                slot.insert(Pending {
                    action,
                    restore: None,
                });
                Ok(PendingGuard {
                    pending: &self.pending,
                    state: &self.state,
                    closed: &self.closed,
                    notifier: self.notifier.as_ref(),
                    id,
                    revert: None,
                })
            }
        }
    }

    fn require_project(&self) -> Result<ProjectId> {
        self.project_id()
            .ok_or_else(|| self.invalid("No project loaded"))
    }

    fn invalid(&self, message: &str) -> BoardError {
        self.notifier.error(message);
        BoardError::Validation(message.to_string())
    }

    fn not_found(&self, id: TicketId) -> BoardError {
        let err = BoardError::TicketNotFound(id);
        self.notifier.error(&err.to_string());
        err
    }

    /// Replace the local copy with the server-confirmed record, if the
    /// ticket is still on this board.
    fn reconcile(&self, confirmed: Ticket) {
        let mut data = self.state.lock();
        if let (Some(project), Some(ticket_project)) = (data.project, confirmed.project_id)
            && project != ticket_project
        {
            return;
        }
        if let Some(slot) = data.tickets.iter_mut().find(|t| t.id == confirmed.id) {
            *slot = confirmed;
        }
    }
}
