//! Email intake: triage NDA request emails into review threads.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{DeskConfig, IntakeConfig};

pub const UNKNOWN_CLIENT: &str = "Unknown Client";
const DEFAULT_SUBJECT: &str = "No Subject";
const DEFAULT_SENDER: &str = "unknown@email.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadStatus {
    Pending,
    InReview,
    Completed,
}

impl ThreadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InReview => "in_review",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Contract,
    Other,
}

/// Rule-based triage of one email subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailClassification {
    pub is_nda: bool,
    pub priority: Priority,
    pub status: ThreadStatus,
    pub kind: RequestKind,
}

/// An inbound email as exported from the shared mailbox sheet.
///
/// Every field may be blank in the export.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailMessage {
    pub subject: Option<String>,
    pub sender: Option<String>,
    pub body: Option<String>,
}

/// A review thread opened for one inbound email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewThread {
    pub id: String,
    pub subject: String,
    pub sender: String,
    pub client: String,
    pub status: ThreadStatus,
    pub priority: Priority,
    pub received: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
}

/// Classify an email by its subject line.
pub fn classify_email(subject: &str, config: &IntakeConfig) -> EmailClassification {
    let lower = subject.to_lowercase();
    let is_nda = config
        .nda_keywords
        .iter()
        .any(|k| lower.contains(&k.to_lowercase()));
    let priority = if lower.contains(&config.urgent_keyword.to_lowercase()) {
        Priority::High
    } else {
        Priority::Medium
    };

    EmailClassification {
        is_nda,
        priority,
        status: ThreadStatus::Pending,
        kind: if is_nda {
            RequestKind::Contract
        } else {
            RequestKind::Other
        },
    }
}

/// First configured client named in the subject (case-insensitive).
pub fn extract_client(subject: &str, config: &IntakeConfig) -> String {
    let lower = subject.to_lowercase();
    config
        .clients
        .iter()
        .find(|c| lower.contains(&c.to_lowercase()))
        .cloned()
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Opens review threads and numbers them `T001`, `T002`, ...
///
/// The counter lives here rather than in a global, so each session (or test)
/// starts from one.
pub struct ThreadIntake {
    config: IntakeConfig,
    sla: Duration,
    processed: u32,
}

impl ThreadIntake {
    pub fn new(config: &DeskConfig) -> Self {
        Self {
            config: config.intake.clone(),
            sla: config.sla(),
            processed: 0,
        }
    }

    /// Open a thread for `email`, received at `now`.
    pub fn process(&mut self, email: &EmailMessage, now: DateTime<Utc>) -> ReviewThread {
        let subject = email
            .subject
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SUBJECT);
        let classification = classify_email(subject, &self.config);

        self.processed += 1;
        let thread = ReviewThread {
            id: format!("T{:03}", self.processed),
            subject: subject.to_string(),
            sender: email
                .sender
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_SENDER.to_string()),
            client: extract_client(subject, &self.config),
            status: classification.status,
            priority: classification.priority,
            received: now,
            deadline: now
                .checked_add_signed(self.sla)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        };
        debug!(id = %thread.id, client = %thread.client, is_nda = classification.is_nda, "opened review thread");
        thread
    }

    pub fn processed_count(&self) -> u32 {
        self.processed
    }
}
