use serde::Serialize;

use crate::models::Message;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageProgress {
    pub stage: &'static str,
    pub percent: u8,
}

struct StageRule {
    stage: &'static str,
    keywords: &'static [&'static str],
    percent: u8,
}

const STAGES: [StageRule; 5] = [
    StageRule { stage: "Account Setup", keywords: &["account", "setup", "create"], percent: 80 },
    StageRule { stage: "Profile Completion", keywords: &["profile", "bio", "complete"], percent: 60 },
    StageRule { stage: "Platform Orientation", keywords: &["feature", "platform", "navigate"], percent: 70 },
    StageRule { stage: "Team Integration", keywords: &["team", "colleague", "connect"], percent: 40 },
    StageRule { stage: "First Project", keywords: &["project", "task", "work"], percent: 20 },
];

/// Rough onboarding progress inferred from words used anywhere in the
/// conversation, both sides included. Stages never mentioned stay at 0.
pub fn onboarding_progress(messages: &[Message]) -> Vec<StageProgress> {
    let conversation = messages
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    STAGES
        .iter()
        .map(|rule| StageProgress {
            stage: rule.stage,
            percent: if rule.keywords.iter().any(|kw| conversation.contains(kw)) {
                rule.percent
            } else {
                0
            },
        })
        .collect()
}
