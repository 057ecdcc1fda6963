use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::config::MAX_CONVERSATION_TURNS;
use crate::errors::{AppError, LlmError};
use crate::models::{AgentProfile, Message};
use crate::services::llm_service::{error_reply, ChatMessage, Length, LlmService};
use crate::services::session_store::SessionStore;

/// One line of a multi-agent transcript.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Turn {
    pub speaker: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    pub turns: Vec<Turn>,
    /// Set when a call failed and the exchange stopped early.
    pub error: Option<String>,
}

/// Chat history as `speaker` sees it: its own lines are `assistant`,
/// everyone else's are `user`.
fn history_for(speaker: &str, turns: &[Turn]) -> Vec<ChatMessage> {
    turns
        .iter()
        .map(|t| {
            if t.speaker == speaker {
                ChatMessage::assistant(t.content.clone())
            } else {
                ChatMessage::user(t.content.clone())
            }
        })
        .collect()
}

/// Two agents take turns. The initiator's opening line counts as its first
/// message; each turn is one reply from the responder and, except after the
/// last turn, one from the initiator. `max_turns` turns issue
/// `2 * max_turns - 1` calls.
pub async fn run_two_party(
    llm: &LlmService,
    api_key: Option<&str>,
    initiator: &AgentProfile,
    responder: &AgentProfile,
    opening: &str,
    max_turns: usize,
) -> Transcript {
    let max_turns = max_turns.clamp(1, MAX_CONVERSATION_TURNS);
    let mut turns = vec![Turn { speaker: initiator.name.clone(), content: opening.to_string() }];

    for turn in 0..max_turns {
        let mut speakers = vec![responder];
        if turn + 1 < max_turns {
            speakers.push(initiator);
        }
        for speaker in speakers {
            match llm.ask_agent(api_key, speaker, history_for(&speaker.name, &turns), Length::Chat).await {
                Ok(content) => turns.push(Turn { speaker: speaker.name.clone(), content }),
                Err(e) => return Transcript { turns, error: Some(error_reply(&e)) },
            }
        }
    }

    Transcript { turns, error: None }
}

/// Agents speak in fixed rotation over a shared transcript seeded with
/// `task`, for `rounds` calls in total. The first failure aborts the run.
pub async fn run_round_robin(
    llm: &LlmService,
    api_key: Option<&str>,
    agents: &[AgentProfile],
    task_speaker: &str,
    task: &str,
    rounds: usize,
) -> Result<Vec<Turn>, LlmError> {
    let mut turns = vec![Turn { speaker: task_speaker.to_string(), content: task.to_string() }];
    if agents.is_empty() {
        return Ok(turns);
    }

    for agent in agents.iter().cycle().take(rounds) {
        info!("Round-robin turn for {}", agent.name);
        let content = llm
            .ask_agent(api_key, agent, history_for(&agent.name, &turns), Length::Long)
            .await?;
        turns.push(Turn { speaker: agent.name.clone(), content });
    }

    Ok(turns)
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationRequest {
    pub opening: String,
    pub max_turns: Option<usize>,
    /// Defaults to "Jack".
    pub initiator: Option<String>,
    /// Defaults to "Rose".
    pub responder: Option<String>,
}

/// The two-comedian show: runs the exchange and appends every line to the
/// session history in order.
pub async fn comedy_show(
    store: &SessionStore,
    llm: &LlmService,
    session_id: Uuid,
    request: ConversationRequest,
    default_turns: usize,
) -> Result<Transcript, AppError> {
    let opening = request.opening.trim();
    if opening.is_empty() {
        return Err(AppError::Validation("An opening line is required".to_string()));
    }

    let api_key = store.read(session_id, |s| s.api_key.clone())?;
    let initiator = AgentProfile::comedian(request.initiator.as_deref().unwrap_or("Jack"));
    let responder = AgentProfile::comedian(request.responder.as_deref().unwrap_or("Rose"));
    if initiator.name == responder.name {
        return Err(AppError::Validation("The two comedians need different names".to_string()));
    }

    let transcript = run_two_party(
        llm,
        api_key.as_deref(),
        &initiator,
        &responder,
        opening,
        request.max_turns.unwrap_or(default_turns),
    )
    .await;

    let mut messages: Vec<Message> = transcript
        .turns
        .iter()
        .map(|t| Message::from_speaker(t.speaker.clone(), t.content.clone()))
        .collect();
    if let Some(error) = &transcript.error {
        messages.push(Message::system(error.clone()));
    }
    store.append(session_id, messages)?;

    Ok(transcript)
}
