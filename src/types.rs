use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::BoardError;

/// Timestamp layout used by the ticket API for `created_at`/`updated_at`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Server-assigned ticket identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(pub u64);

/// Project identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub u64);

/// User identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

macro_rules! numeric_id {
    ($name:ident, $label:literal) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                $name(value)
            }
        }

        impl FromStr for $name {
            type Err = BoardError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim().trim_start_matches('#');
                trimmed.parse::<u64>().map($name).map_err(|_| {
                    BoardError::Validation(format!("invalid {} '{}'", $label, s))
                })
            }
        }
    };
}

numeric_id!(TicketId, "ticket id");
numeric_id!(ProjectId, "project id");
numeric_id!(UserId, "user id");

/// Workflow column a ticket sits in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TicketStatus {
    #[default]
    #[serde(rename = "To Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Done")]
    Done,
}

impl TicketStatus {
    /// Column label as used by the API and the board headers
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::ToDo => "To Do",
            TicketStatus::InProgress => "In Progress",
            TicketStatus::Done => "Done",
        }
    }

    /// Returns true for the column that counts towards completion
    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketStatus::Done)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = BoardError;

    /// Accepts the API labels as well as the snake/kebab forms typed on a
    /// command line (`to_do`, `in-progress`, `done`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "todo" => Ok(TicketStatus::ToDo),
            "inprogress" => Ok(TicketStatus::InProgress),
            "done" => Ok(TicketStatus::Done),
            _ => Err(BoardError::Validation(format!("unknown column '{}'", s))),
        }
    }
}

pub const VALID_STATUSES: &[&str] = &["To Do", "In Progress", "Done"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TicketPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::Low => "Low",
            TicketPriority::Medium => "Medium",
            TicketPriority::High => "High",
        }
    }
}

impl fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketPriority {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(TicketPriority::Low),
            "medium" => Ok(TicketPriority::Medium),
            "high" => Ok(TicketPriority::High),
            _ => Err(BoardError::Validation(format!("invalid priority '{}'", s))),
        }
    }
}

pub const VALID_PRIORITIES: &[&str] = &["Low", "Medium", "High"];

/// Session role as reported by the profile endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    Admin,
    #[default]
    User,
    Guest,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::Guest => "guest",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Role {
    /// Unrecognised roles fall back to `user`, matching the server default.
    fn from(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "admin" => Role::Admin,
            "guest" => Role::Guest,
            _ => Role::User,
        }
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Role::from(raw.as_str()))
    }
}

/// A work item on the board, as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default)]
    pub status: TicketStatus,
    #[serde(default)]
    pub priority: TicketPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    #[serde(default)]
    pub assigned_user_id: Option<UserId>,
    /// Assignee username denormalized by the server, display only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Ticket {
    /// Minimal ticket, mostly useful for fixtures and tests
    pub fn new(id: impl Into<TicketId>, title: impl Into<String>, status: TicketStatus) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            status,
            priority: TicketPriority::default(),
            project_id: None,
            assigned_user_id: None,
            assigned_user: None,
            creator: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Parse `updated_at` using the API timestamp layout
    pub fn updated_at(&self) -> Option<jiff::civil::DateTime> {
        self.updated_at
            .as_deref()
            .and_then(|raw| jiff::civil::DateTime::strptime(TIMESTAMP_FORMAT, raw).ok())
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Input for creating a ticket. There is deliberately no status field: new
/// tickets always enter the first column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketDraft {
    pub title: String,
    pub description: String,
    pub priority: TicketPriority,
    pub assigned_user_id: Option<UserId>,
}

impl TicketDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn priority(mut self, priority: TicketPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn assign(mut self, user: UserId) -> Self {
        self.assigned_user_id = Some(user);
        self
    }
}

/// Partial update for a ticket. `None` fields are left untouched; the outer
/// option of `assigned_user_id` distinguishes "unchanged" from "unassign".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TicketPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TicketPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_user_id: Option<Option<UserId>>,
}

impl TicketPatch {
    /// Patch that only changes the workflow column
    pub fn status(status: TicketStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.assigned_user_id.is_none()
    }

    /// Apply the patch to a local copy of a ticket
    pub fn apply_to(&self, ticket: &mut Ticket) {
        if let Some(title) = &self.title {
            ticket.title = title.clone();
        }
        if let Some(description) = &self.description {
            ticket.description = description.clone();
        }
        if let Some(status) = self.status {
            ticket.status = status;
        }
        if let Some(priority) = self.priority {
            ticket.priority = priority;
        }
        if let Some(assignee) = self.assigned_user_id {
            ticket.assigned_user_id = assignee;
        }
    }
}

/// Roster entry used to resolve a ticket's assignee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// One row of a ticket's server-side change log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: u64,
    pub ticket_id: TicketId,
    pub changed_by: String,
    pub change_type: String,
    #[serde(default)]
    pub old_value: Option<String>,
    #[serde(default)]
    pub new_value: Option<String>,
    pub changed_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serde_uses_column_labels() {
        let json = serde_json::to_string(&TicketStatus::InProgress).unwrap();
        assert_eq!(json, "\"In Progress\"");
        let parsed: TicketStatus = serde_json::from_str("\"To Do\"").unwrap();
        assert_eq!(parsed, TicketStatus::ToDo);
    }

    #[test]
    fn test_status_from_str_accepts_cli_spellings() {
        assert_eq!("in_progress".parse::<TicketStatus>().unwrap(), TicketStatus::InProgress);
        assert_eq!("In Progress".parse::<TicketStatus>().unwrap(), TicketStatus::InProgress);
        assert_eq!("to-do".parse::<TicketStatus>().unwrap(), TicketStatus::ToDo);
        assert_eq!("DONE".parse::<TicketStatus>().unwrap(), TicketStatus::Done);
        assert!("blocked".parse::<TicketStatus>().is_err());
    }

    #[test]
    fn test_priority_ordering() {
        assert!(TicketPriority::Low < TicketPriority::Medium);
        assert!(TicketPriority::Medium < TicketPriority::High);
        assert_eq!(TicketPriority::default(), TicketPriority::Medium);
    }

    #[test]
    fn test_role_unknown_defaults_to_user() {
        let role: Role = serde_json::from_str("\"manager\"").unwrap();
        assert_eq!(role, Role::User);
        let role: Role = serde_json::from_str("\"Guest\"").unwrap();
        assert_eq!(role, Role::Guest);
    }

    #[test]
    fn test_ticket_decodes_server_record() {
        let json = r#"{
            "id": 12,
            "title": "Fix login",
            "description": null,
            "status": "Done",
            "priority": "High",
            "created_at": "2024-03-01 09:00:00",
            "updated_at": "2024-03-02 10:30:00",
            "project_id": 7,
            "assigned_user_id": 3,
            "assigned_user": "alice",
            "creator": "bob"
        }"#;
        let ticket: Ticket = serde_json::from_str(json).unwrap();
        assert_eq!(ticket.id, TicketId(12));
        assert_eq!(ticket.description, "");
        assert_eq!(ticket.status, TicketStatus::Done);
        assert_eq!(ticket.priority, TicketPriority::High);
        assert_eq!(ticket.project_id, Some(ProjectId(7)));
        assert_eq!(ticket.assigned_user_id, Some(UserId(3)));
        let updated = ticket.updated_at().unwrap();
        assert_eq!(updated.hour(), 10);
        assert_eq!(updated.minute(), 30);
    }

    #[test]
    fn test_patch_serializes_only_set_fields() {
        let patch = TicketPatch::status(TicketStatus::Done);
        assert_eq!(serde_json::to_string(&patch).unwrap(), r#"{"status":"Done"}"#);

        let unassign = TicketPatch {
            assigned_user_id: Some(None),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_string(&unassign).unwrap(),
            r#"{"assigned_user_id":null}"#
        );
    }

    #[test]
    fn test_patch_apply_to() {
        let mut ticket = Ticket::new(1, "Old", TicketStatus::ToDo);
        ticket.assigned_user_id = Some(UserId(4));
        let patch = TicketPatch {
            title: Some("New".to_string()),
            priority: Some(TicketPriority::Low),
            assigned_user_id: Some(None),
            ..Default::default()
        };
        patch.apply_to(&mut ticket);
        assert_eq!(ticket.title, "New");
        assert_eq!(ticket.priority, TicketPriority::Low);
        assert_eq!(ticket.status, TicketStatus::ToDo);
        assert_eq!(ticket.assigned_user_id, None);
    }

    #[test]
    fn test_ticket_id_parse() {
        assert_eq!("#42".parse::<TicketId>().unwrap(), TicketId(42));
        assert!("abc".parse::<TicketId>().is_err());
    }
}
