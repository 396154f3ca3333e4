#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::process::{Command, Output};
use std::sync::Arc;

use parking_lot::Mutex;
use reqwest::StatusCode;
use tempfile::TempDir;
use tokio::sync::oneshot;

use ticketboard::remote::{ApiError, ApiResult, TicketRepository};
use ticketboard::{
    BoardStore, HistoryEntry, ProjectId, RecordingNotifier, Role, Session, SessionUser, Ticket,
    TicketDraft, TicketId, TicketPatch, TicketStatus, User,
};

/// A repository call as observed by the fake server
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List(ProjectId),
    Create(ProjectId, String),
    Update(TicketId, TicketPatch),
    Delete(TicketId),
    Users(ProjectId),
    History(TicketId),
}

#[derive(Default)]
struct FakeState {
    tickets: Vec<Ticket>,
    users: HashMap<ProjectId, Vec<User>>,
    history: Vec<HistoryEntry>,
    next_id: u64,
    calls: Vec<Call>,
    fail_list: VecDeque<ApiError>,
    fail_create: VecDeque<ApiError>,
    fail_update: VecDeque<ApiError>,
    fail_delete: VecDeque<ApiError>,
    list_gates: VecDeque<oneshot::Receiver<()>>,
    update_gates: VecDeque<oneshot::Receiver<()>>,
}

/// In-memory ticket server.
///
/// Responses are computed when the call is made; a gated call then waits for
/// its sender to fire (or be dropped) before returning, which lets tests
/// resolve requests out of order.
#[derive(Default)]
pub struct FakeRepository {
    state: Mutex<FakeState>,
}

impl FakeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the server with tickets for a project
    pub fn with_tickets(self, project: u64, tickets: Vec<Ticket>) -> Self {
        {
            let mut state = self.state.lock();
            for mut ticket in tickets {
                ticket.project_id = Some(ProjectId(project));
                state.next_id = state.next_id.max(ticket.id.0);
                state.tickets.push(ticket);
            }
        }
        self
    }

    pub fn with_users(self, project: u64, users: Vec<User>) -> Self {
        self.state.lock().users.insert(ProjectId(project), users);
        self
    }

    pub fn with_history(self, entries: Vec<HistoryEntry>) -> Self {
        self.state.lock().history.extend(entries);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn update_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Update(..)))
            .count()
    }

    /// Server-side copy of a ticket
    pub fn server_ticket(&self, id: u64) -> Option<Ticket> {
        self.state
            .lock()
            .tickets
            .iter()
            .find(|t| t.id == TicketId(id))
            .cloned()
    }

    /// Change a ticket behind the client's back
    pub fn set_server_status(&self, id: u64, status: TicketStatus) {
        if let Some(ticket) = self
            .state
            .lock()
            .tickets
            .iter_mut()
            .find(|t| t.id == TicketId(id))
        {
            ticket.status = status;
        }
    }

    pub fn fail_next_list(&self, err: ApiError) {
        self.state.lock().fail_list.push_back(err);
    }

    pub fn fail_next_create(&self, err: ApiError) {
        self.state.lock().fail_create.push_back(err);
    }

    pub fn fail_next_update(&self, err: ApiError) {
        self.state.lock().fail_update.push_back(err);
    }

    pub fn fail_next_delete(&self, err: ApiError) {
        self.state.lock().fail_delete.push_back(err);
    }

    /// Hold the next `list` response until the returned sender fires
    pub fn gate_next_list(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state.lock().list_gates.push_back(rx);
        tx
    }

    /// Hold the next `update` response until the returned sender fires
    pub fn gate_next_update(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state.lock().update_gates.push_back(rx);
        tx
    }
}

async fn wait(gate: Option<oneshot::Receiver<()>>) {
    if let Some(gate) = gate {
        let _ = gate.await;
    }
}

fn not_found(id: TicketId) -> ApiError {
    ApiError::with_status(StatusCode::NOT_FOUND, format!("Ticket {id} not found"))
}

impl TicketRepository for FakeRepository {
    async fn list(&self, project: ProjectId) -> ApiResult<Vec<Ticket>> {
        let (gate, result) = {
            let mut state = self.state.lock();
            state.calls.push(Call::List(project));
            let result = match state.fail_list.pop_front() {
                Some(err) => Err(err),
                None => Ok(state
                    .tickets
                    .iter()
                    .filter(|t| t.project_id == Some(project))
                    .cloned()
                    .collect()),
            };
            (state.list_gates.pop_front(), result)
        };
        wait(gate).await;
        result
    }

    async fn create(&self, project: ProjectId, draft: &TicketDraft) -> ApiResult<Ticket> {
        let mut state = self.state.lock();
        state
            .calls
            .push(Call::Create(project, draft.title.clone()));
        if let Some(err) = state.fail_create.pop_front() {
            return Err(err);
        }
        state.next_id += 1;
        let mut ticket = Ticket::new(state.next_id, draft.title.clone(), TicketStatus::ToDo);
        ticket.description = draft.description.clone();
        ticket.priority = draft.priority;
        ticket.assigned_user_id = draft.assigned_user_id;
        ticket.project_id = Some(project);
        state.tickets.push(ticket.clone());
        Ok(ticket)
    }

    async fn update(&self, id: TicketId, patch: &TicketPatch) -> ApiResult<Ticket> {
        let (gate, result) = {
            let mut state = self.state.lock();
            state.calls.push(Call::Update(id, patch.clone()));
            let result = match state.fail_update.pop_front() {
                Some(err) => Err(err),
                None => match state.tickets.iter_mut().find(|t| t.id == id) {
                    Some(ticket) => {
                        patch.apply_to(ticket);
                        Ok(ticket.clone())
                    }
                    None => Err(not_found(id)),
                },
            };
            (state.update_gates.pop_front(), result)
        };
        wait(gate).await;
        result
    }

    async fn delete(&self, id: TicketId) -> ApiResult<()> {
        let mut state = self.state.lock();
        state.calls.push(Call::Delete(id));
        if let Some(err) = state.fail_delete.pop_front() {
            return Err(err);
        }
        let before = state.tickets.len();
        state.tickets.retain(|t| t.id != id);
        if state.tickets.len() == before {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn project_users(&self, project: ProjectId) -> ApiResult<Vec<User>> {
        let mut state = self.state.lock();
        state.calls.push(Call::Users(project));
        Ok(state.users.get(&project).cloned().unwrap_or_default())
    }

    async fn history(&self, id: TicketId) -> ApiResult<Vec<HistoryEntry>> {
        let mut state = self.state.lock();
        state.calls.push(Call::History(id));
        Ok(state
            .history
            .iter()
            .filter(|h| h.ticket_id == id)
            .cloned()
            .collect())
    }
}

pub fn server_error(message: &str) -> ApiError {
    ApiError::with_status(StatusCode::INTERNAL_SERVER_ERROR, message)
}

pub fn forbidden(message: &str) -> ApiError {
    ApiError::with_status(StatusCode::FORBIDDEN, message)
}

pub fn session(role: Role) -> Arc<Session> {
    Arc::new(Session::authenticated(
        SessionUser::new(1, "alice", role),
        "test-token",
    ))
}

/// Store wired to a fake server and a recording notifier
pub struct Harness {
    pub repo: Arc<FakeRepository>,
    pub notifier: Arc<RecordingNotifier>,
    pub store: Arc<BoardStore<FakeRepository>>,
}

impl Harness {
    pub fn new(repo: FakeRepository, role: Role) -> Self {
        Self::with_session(repo, session(role))
    }

    pub fn with_session(repo: FakeRepository, session: Arc<Session>) -> Self {
        let repo = Arc::new(repo);
        let notifier = Arc::new(RecordingNotifier::new());
        let store = BoardStore::new(Arc::clone(&repo), session).with_notifier(notifier.clone());
        Self {
            repo,
            notifier,
            store: Arc::new(store),
        }
    }

    /// `(id, status)` pairs in board order
    pub fn statuses(&self) -> Vec<(u64, TicketStatus)> {
        self.store
            .tickets()
            .iter()
            .map(|t| (t.id.0, t.status))
            .collect()
    }
}

/// The two-ticket board of project 7 used across the store tests
pub fn project_seven() -> FakeRepository {
    FakeRepository::new().with_tickets(
        7,
        vec![
            Ticket::new(1, "Design schema", TicketStatus::ToDo),
            Ticket::new(2, "Set up CI", TicketStatus::Done),
        ],
    )
}

/// Runs the compiled binary against an isolated config file
pub struct BoardCli {
    pub temp_dir: TempDir,
}

impl BoardCli {
    pub fn new() -> Self {
        BoardCli {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn config_path(&self) -> std::path::PathBuf {
        self.temp_dir.path().join("config.yaml")
    }

    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_ticketboard"))
            .args(args)
            .env("TICKETBOARD_CONFIG", self.config_path())
            .env_remove("TICKETBOARD_API_URL")
            .env_remove("TICKETBOARD_TOKEN")
            .current_dir(self.temp_dir.path())
            .output()
            .expect("Failed to execute ticketboard command")
    }

    pub fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args);
        if !output.status.success() {
            panic!(
                "Command {:?} failed with status {:?}\nstdout: {}\nstderr: {}",
                args,
                output.status,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    pub fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            !output.status.success(),
            "Command {:?} should have failed\nstdout: {}",
            args,
            String::from_utf8_lossy(&output.stdout)
        );
        String::from_utf8_lossy(&output.stderr).to_string()
    }
}
