//! Drag-and-drop translation layer.
//!
//! [`DragGestures`] is what a front end calls while the pointer moves; it does
//! not know about any particular gesture library. [`DragController`] turns a
//! completed drop into a [`DragIntent`] and hands it to the store.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::model::DragIntent;
use super::store::BoardStore;
use crate::error::Result;
use crate::notify::Notifier;
use crate::remote::TicketRepository;
use crate::session::Action;
use crate::types::{TicketId, TicketStatus};

/// Result of a drop gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// The move was accepted by the server
    Moved(DragIntent),
    /// No drag was in progress
    Ignored,
}

/// Pointer gesture callbacks
#[async_trait]
pub trait DragGestures: Send + Sync {
    fn on_drag_start(&self, ticket: TicketId);

    async fn on_drop_on_column(&self, status: TicketStatus) -> Result<DropOutcome>;

    fn on_drag_cancel(&self);
}

pub struct DragController<R> {
    store: Arc<BoardStore<R>>,
    dragging: Mutex<Option<TicketId>>,
}

impl<R: TicketRepository> DragController<R> {
    pub fn new(store: Arc<BoardStore<R>>) -> Self {
        Self {
            store,
            dragging: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Arc<BoardStore<R>> {
        &self.store
    }

    /// Ticket currently being dragged, if any
    pub fn dragging(&self) -> Option<TicketId> {
        *self.dragging.lock()
    }

    /// Drop onto a column identified by its label, as a UI reports it
    pub async fn on_drop_on_column_named(&self, column: &str) -> Result<DropOutcome> {
        match column.parse::<TicketStatus>() {
            Ok(status) => self.on_drop_on_column(status).await,
            Err(err) => {
                // an unknown target ends the gesture
                self.dragging.lock().take();
                self.store.notifier().error(&err.to_string());
                Err(err)
            }
        }
    }
}

#[async_trait]
impl<R: TicketRepository> DragGestures for DragController<R> {
    fn on_drag_start(&self, ticket: TicketId) {
        tracing::trace!(%ticket, "drag start");
        *self.dragging.lock() = Some(ticket);
    }

    async fn on_drop_on_column(&self, status: TicketStatus) -> Result<DropOutcome> {
        let Some(ticket_id) = self.dragging.lock().take() else {
            tracing::debug!(%status, "drop without drag start ignored");
            return Ok(DropOutcome::Ignored);
        };

        self.store.ensure_authorized(Action::Move)?;

        let intent = DragIntent {
            ticket_id,
            target_status: status,
        };
        tracing::debug!(ticket = %ticket_id, to = %status, "drop");

        self.store
            .move_ticket(intent.ticket_id, intent.target_status)
            .await
            .map(|()| DropOutcome::Moved(intent))
    }

    fn on_drag_cancel(&self) {
        if let Some(ticket) = self.dragging.lock().take() {
            tracing::trace!(%ticket, "drag cancelled");
        }
    }
}
