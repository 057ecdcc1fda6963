use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::message::Message;
use crate::models::price_bar::Period;
use crate::models::report::ReportPayload;

/// Which group of dispatch rules a session routes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonaSet {
    Blog,
    Onboarding,
    #[default]
    All,
}

/// Manual step of the blog-drafting workflow the user last triggered.
/// Transitions are not validated; any action may set any stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritingStage {
    #[default]
    Setup,
    Research,
    Outline,
    Writing,
    Seo,
    Editing,
    Complete,
}

impl WritingStage {
    pub fn progress(&self) -> u8 {
        match self {
            WritingStage::Setup => 10,
            WritingStage::Research => 20,
            WritingStage::Outline => 30,
            WritingStage::Writing => 60,
            WritingStage::Seo => 80,
            WritingStage::Editing => 95,
            WritingStage::Complete => 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub persona_set: PersonaSet,
    pub symbol: String,
    pub period: Period,
    pub tone: String,
    pub word_count: u32,
    pub target_audience: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            persona_set: PersonaSet::All,
            symbol: "TTM".to_string(),
            period: Period::ThreeMonths,
            tone: "professional".to_string(),
            word_count: 1000,
            target_audience: "general".to_string(),
        }
    }
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSessionConfig {
    pub persona_set: Option<PersonaSet>,
    pub symbol: Option<String>,
    pub period: Option<Period>,
    pub tone: Option<String>,
    pub word_count: Option<u32>,
    pub target_audience: Option<String>,
}

impl SessionConfig {
    pub fn apply(&mut self, update: UpdateSessionConfig) {
        if let Some(set) = update.persona_set {
            self.persona_set = set;
        }
        if let Some(symbol) = update.symbol {
            self.symbol = symbol.trim().to_uppercase();
        }
        if let Some(period) = update.period {
            self.period = period;
        }
        if let Some(tone) = update.tone {
            self.tone = tone;
        }
        if let Some(word_count) = update.word_count {
            self.word_count = word_count;
        }
        if let Some(audience) = update.target_audience {
            self.target_audience = audience;
        }
    }
}

/// Working state of the blog being drafted in a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BlogDraft {
    pub topic: String,
    pub keywords: Vec<String>,
    pub research: String,
    pub outline: String,
    pub content: String,
    pub seo_analysis: String,
    pub edited_content: String,
    pub editor_feedback: String,
}

impl BlogDraft {
    /// Latest full text: the edited version wins over the raw draft.
    pub fn final_text(&self) -> Option<&str> {
        if !self.edited_content.is_empty() {
            Some(&self.edited_content)
        } else if !self.content.is_empty() {
            Some(&self.content)
        } else {
            None
        }
    }
}

pub struct Session {
    pub id: Uuid,
    pub api_key: Option<String>,
    pub messages: Vec<Message>,
    pub config: SessionConfig,
    pub blog: BlogDraft,
    pub writing_stage: WritingStage,
    pub report: Option<ReportPayload>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(api_key: Option<String>, config: SessionConfig) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            api_key,
            messages: Vec::new(),
            config,
            blog: BlogDraft::default(),
            writing_stage: WritingStage::Setup,
            report: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.updated_at = Utc::now();
    }

    pub fn clear_history(&mut self) {
        self.messages.clear();
        self.updated_at = Utc::now();
    }

    pub fn reset_blog(&mut self) {
        self.blog = BlogDraft::default();
        self.writing_stage = WritingStage::Setup;
        self.updated_at = Utc::now();
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.id,
            has_api_key: self.api_key.is_some(),
            config: self.config.clone(),
            writing_stage: self.writing_stage,
            message_count: self.messages.len(),
            has_report: self.report.is_some(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// What clients see of a session. The credential itself is never echoed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub id: Uuid,
    pub has_api_key: bool,
    pub config: SessionConfig,
    pub writing_stage: WritingStage,
    pub message_count: usize,
    pub has_report: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateSession {
    pub api_key: Option<String>,
    pub config: Option<UpdateSessionConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_progress_weights() {
        assert_eq!(WritingStage::Setup.progress(), 10);
        assert_eq!(WritingStage::Writing.progress(), 60);
        assert_eq!(WritingStage::Complete.progress(), 100);
    }

    #[test]
    fn test_config_apply_is_partial() {
        let mut config = SessionConfig::default();
        config.apply(UpdateSessionConfig {
            symbol: Some(" nvda ".to_string()),
            word_count: Some(1500),
            ..Default::default()
        });
        assert_eq!(config.symbol, "NVDA");
        assert_eq!(config.word_count, 1500);
        assert_eq!(config.tone, "professional");
        assert_eq!(config.period, Period::ThreeMonths);
    }

    #[test]
    fn test_history_keeps_insertion_order() {
        let mut session = Session::new(None, SessionConfig::default());
        session.push(Message::user("first"));
        session.push(Message::system("second"));
        session.push(Message::user("third"));
        let contents: Vec<&str> = session.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);

        session.clear_history();
        assert!(session.messages.is_empty());
    }

    #[test]
    fn test_view_hides_key() {
        let session = Session::new(Some("secret".to_string()), SessionConfig::default());
        let json = serde_json::to_string(&session.view()).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("\"has_api_key\":true"));
    }
}
