use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Message, Persona};
use crate::services::dispatcher::RoleDispatcher;
use crate::services::llm_service::{is_error_reply, Length, LlmService};
use crate::services::session_store::SessionStore;

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub persona: Persona,
    pub reply: Message,
    /// True when `reply` carries an inline error instead of model output.
    pub is_error: bool,
}

/// request → persona dispatch → one completion call → history.
pub async fn handle_chat(
    store: &SessionStore,
    llm: &LlmService,
    session_id: Uuid,
    text: &str,
) -> Result<ChatReply, AppError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::Validation("Message must not be empty".to_string()));
    }

    let (api_key, persona_set) = store.read(session_id, |s| (s.api_key.clone(), s.config.persona_set))?;
    let persona = RoleDispatcher::for_set(persona_set).dispatch(text);
    info!("Session {} routed message to persona {}", session_id, persona);

    store.append(session_id, [Message::user(text)])?;

    let content = llm
        .ask_persona_text(api_key.as_deref(), persona, text, Length::Chat)
        .await;
    let is_error = is_error_reply(&content);
    let reply = Message::assistant(persona, content);

    store.append(session_id, [reply.clone()])?;

    Ok(ChatReply { persona, reply, is_error })
}
