use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::persona::Persona;
use crate::models::report::ReportPayload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One chat history entry. Never mutated after it is appended.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persona: Option<Persona>,
    /// Speaker name for multi-agent transcripts ("Jack", "Planner", ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportPayload>,
}

impl Message {
    fn new(role: Role, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content,
            created_at: Utc::now(),
            persona: None,
            speaker: None,
            report: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into())
    }

    pub fn assistant(persona: Persona, content: impl Into<String>) -> Self {
        Self {
            persona: Some(persona),
            ..Self::new(Role::Assistant, content.into())
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content.into())
    }

    pub fn from_speaker(speaker: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            speaker: Some(speaker.into()),
            ..Self::new(Role::Assistant, content.into())
        }
    }

    pub fn with_report(mut self, report: ReportPayload) -> Self {
        self.report = Some(report);
        self
    }
}
