//! reqwest-backed implementation of [`TicketRepository`].
//!
//! # Security Note - Logging
//!
//! The bearer token is read from the shared [`Session`] for every request and
//! attached as a header marked sensitive, so it is printed as `Sensitive` if
//! reqwest/hyper debug logging is switched on. Do not enable
//! `RUST_LOG=reqwest=trace` in production regardless: bodies are not redacted.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{self, HeaderValue};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::board::model::ENTRY_STATUS;
use crate::config::Config;
use crate::error::{BoardError, Result};
use crate::session::{Session, SessionUser};
use crate::types::{
    HistoryEntry, ProjectId, Ticket, TicketDraft, TicketId, TicketPatch, TicketPriority,
    TicketStatus, User, UserId,
};

use super::{ApiError, ApiResult, TicketRepository};

const RETRY_BACKOFF_MS: u64 = 250;

/// Ticket API client
pub struct HttpTicketRepository {
    client: Client,
    base_url: Url,
    session: Arc<Session>,
    /// Extra attempts for GET requests on transient failures
    retries: u32,
}

impl std::fmt::Debug for HttpTicketRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTicketRepository")
            .field("base_url", &self.base_url.as_str())
            .field("retries", &self.retries)
            .finish_non_exhaustive()
    }
}

/// Body of `POST /api/tickets`
#[derive(Serialize)]
struct CreateTicketBody<'a> {
    title: &'a str,
    description: &'a str,
    priority: TicketPriority,
    assigned_user_id: Option<UserId>,
    project_id: ProjectId,
    status: TicketStatus,
}

/// Body of `POST /api/auth/login`
#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

/// Create and update answer with `{ "message": .., "ticket": {..} }`; accept
/// a bare record as well.
#[derive(Deserialize)]
#[serde(untagged)]
enum TicketResponse {
    Wrapped { ticket: Ticket },
    Bare(Ticket),
}

impl HttpTicketRepository {
    /// Create a client from configuration.
    ///
    /// Timeouts come from the config; the token is taken from `session` at
    /// request time, so login/logout take effect without rebuilding.
    pub fn from_config(config: &Config, session: Arc<Session>) -> Result<Self> {
        Self::build(config, &config.api_url(), session)
    }

    /// Create a client for an explicit base URL with default timeouts
    pub fn new(base_url: &str, session: Arc<Session>) -> Result<Self> {
        Self::build(&Config::default(), base_url, session)
    }

    fn build(config: &Config, base_url: &str, session: Arc<Session>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: normalize_base_url(base_url)?,
            session,
            retries: config.retries,
        })
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a path below `/api/`
    pub fn endpoint(&self, path: &str) -> ApiResult<Url> {
        self.base_url
            .join("api/")
            .and_then(|api| api.join(path.trim_start_matches('/')))
            .map_err(|e| ApiError::new(format!("invalid endpoint '{path}': {e}")))
    }

    fn request(&self, method: Method, url: Url) -> ApiResult<RequestBuilder> {
        let mut builder = self
            .client
            .request(method, url)
            .header(header::ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = self.session.token() {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ApiError::new("session token is not a valid header value"))?;
            value.set_sensitive(true);
            builder = builder.header(header::AUTHORIZATION, value);
        }

        Ok(builder)
    }

    /// Send once and return the body of a successful response
    async fn send(&self, builder: RequestBuilder) -> ApiResult<String> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::from_response_body(status, &body));
        }
        Ok(body)
    }

    /// Exchange credentials for a bearer token (`POST /api/auth/login`).
    ///
    /// Not retried. Wrong credentials come back as a 401 carrying the
    /// server's message.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<String> {
        let builder = self
            .request(Method::POST, self.endpoint("auth/login")?)?
            .json(&LoginBody { email, password });
        let body = self.send(builder).await?;
        decode::<LoginResponse>(&body).map(|r| r.token)
    }

    /// Identity behind the current token (`GET /api/users/me`)
    pub async fn fetch_profile(&self) -> ApiResult<SessionUser> {
        self.get("users/me").await
    }

    /// GET with retry on transient failures
    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = self.endpoint(path)?;
        let mut attempt = 0;

        loop {
            let builder = self.request(Method::GET, url.clone())?;
            match self.send(builder).await {
                Ok(body) => return decode(&body),
                Err(err) if err.is_transient() && attempt < self.retries => {
                    attempt += 1;
                    tracing::debug!(%url, attempt, error = %err, "retrying request");
                    tokio::time::sleep(Duration::from_millis(RETRY_BACKOFF_MS * attempt as u64))
                        .await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl TicketRepository for HttpTicketRepository {
    async fn list(&self, project: ProjectId) -> ApiResult<Vec<Ticket>> {
        self.get(&format!("projects/{project}/tickets")).await
    }

    async fn create(&self, project: ProjectId, draft: &TicketDraft) -> ApiResult<Ticket> {
        let body = CreateTicketBody {
            title: &draft.title,
            description: &draft.description,
            priority: draft.priority,
            assigned_user_id: draft.assigned_user_id,
            project_id: project,
            status: ENTRY_STATUS,
        };
        let builder = self
            .request(Method::POST, self.endpoint("tickets")?)?
            .json(&body);
        decode_ticket_response(&self.send(builder).await?)
    }

    async fn update(&self, id: TicketId, patch: &TicketPatch) -> ApiResult<Ticket> {
        let builder = self
            .request(Method::PUT, self.endpoint(&format!("tickets/{id}"))?)?
            .json(patch);
        decode_ticket_response(&self.send(builder).await?)
    }

    async fn delete(&self, id: TicketId) -> ApiResult<()> {
        let builder = self.request(Method::DELETE, self.endpoint(&format!("tickets/{id}"))?)?;
        self.send(builder).await.map(|_| ())
    }

    async fn project_users(&self, project: ProjectId) -> ApiResult<Vec<User>> {
        self.get(&format!("projects/{project}/users")).await
    }

    async fn history(&self, id: TicketId) -> ApiResult<Vec<HistoryEntry>> {
        self.get(&format!("tickets/{id}/history")).await
    }
}

fn normalize_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw)
        .map_err(|e| BoardError::Config(format!("invalid api_url '{raw}': {e}")))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn decode<T: DeserializeOwned>(body: &str) -> ApiResult<T> {
    serde_json::from_str(body).map_err(|e| ApiError::new(format!("invalid response body: {e}")))
}

/// Decode the create/update response into the server-confirmed record
pub fn decode_ticket_response(body: &str) -> ApiResult<Ticket> {
    decode::<TicketResponse>(body).map(|r| match r {
        TicketResponse::Wrapped { ticket } | TicketResponse::Bare(ticket) => ticket,
    })
}
