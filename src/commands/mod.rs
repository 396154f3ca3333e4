//! CLI command handlers.
//!
//! Each command builds a [`CommandContext`], runs one board operation and
//! prints whatever the store reported through its notifier.

mod auth;
mod board;
mod config;
mod create;
mod edit;
mod history;

pub use auth::{cmd_login, cmd_logout};
pub use board::{cmd_board, cmd_move, cmd_progress, cmd_users};
pub use config::{cmd_config_set_token, cmd_config_set_url, cmd_config_show};
pub use create::{CreateOptions, cmd_create};
pub use edit::{EditOptions, cmd_delete, cmd_edit};
pub use history::cmd_history;

use std::sync::Arc;

use serde::Serialize;

use crate::board::BoardStore;
use crate::config::Config;
use crate::display::format_notification;
use crate::error::Result;
use crate::notify::{Notifier, RecordingNotifier};
use crate::remote::HttpTicketRepository;
use crate::session::Session;
use crate::types::ProjectId;

/// Output selection shared by the read commands
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub json: bool,
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Everything a command needs to talk to the board
pub struct CommandContext {
    pub store: Arc<BoardStore<HttpTicketRepository>>,
    notifier: Arc<RecordingNotifier>,
}

/// API client for `--api-url` when given, otherwise for the configured URL
fn repository(
    config: &Config,
    api_url: Option<&str>,
    session: &Arc<Session>,
) -> Result<HttpTicketRepository> {
    let repo = match api_url {
        Some(url) => {
            HttpTicketRepository::new(url, Arc::clone(session))?.with_retries(config.retries)
        }
        None => HttpTicketRepository::from_config(config, Arc::clone(session))?,
    };
    tracing::debug!(base_url = %repo.base_url(), "connecting");
    Ok(repo)
}

impl CommandContext {
    /// Load config, resolve the signed-in user from the configured token and
    /// build the store. Without a token the session stays anonymous.
    pub async fn connect(api_url: Option<&str>) -> Result<Self> {
        let config = Config::load()?;
        let session = Arc::new(Session::anonymous());

        let repo = Arc::new(repository(&config, api_url, &session)?);

        if let Some(token) = config.token() {
            session.set_token(token.clone());
            let user = repo.fetch_profile().await?;
            session.login(user, token);
        }

        let notifier = Arc::new(RecordingNotifier::new());
        let store = BoardStore::new(repo, session)
            .with_notifier(Arc::clone(&notifier) as Arc<dyn Notifier>);

        Ok(Self {
            store: Arc::new(store),
            notifier,
        })
    }

    /// Connect and load a project's board
    pub async fn open(api_url: Option<&str>, project: ProjectId) -> Result<Self> {
        let ctx = Self::connect(api_url).await?;
        let loaded = ctx.store.load(project).await;
        ctx.flush();
        loaded?;
        Ok(ctx)
    }

    /// Print and clear pending notifications
    pub fn flush(&self) {
        for notification in self.notifier.drain() {
            eprintln!("{}", format_notification(&notification));
        }
    }
}
