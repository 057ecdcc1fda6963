use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::LlmConfig;
use crate::errors::LlmError;
use crate::models::{AgentProfile, Persona};

/// Prefix put in front of every error text shown in place of a reply.
pub const ERROR_MARKER: &str = "I apologize, but I encountered an error: ";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant".to_string(), content: content.into() }
    }
}

/// One chat-completions call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: usize,
    pub top_p: f32,
    /// Ask the endpoint for a JSON object instead of free text.
    pub json_output: bool,
}

/// Chat-completion backend. One request in, one text out.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate_completion(
        &self,
        api_key: &str,
        request: CompletionRequest,
    ) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: usize,
    temperature: f32,
    top_p: f32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// Any endpoint speaking the OpenAI chat-completions dialect (Groq by default).
pub struct OpenAiCompatibleProvider {
    base_url: String,
    model: String,
    client: Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::NetworkError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into(),
            model: model.into(),
            client,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        Self::new(config.base_url.clone(), config.model.clone(), config.timeout)
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    async fn generate_completion(
        &self,
        api_key: &str,
        request: CompletionRequest,
    ) -> Result<String, LlmError> {
        info!("Generating completion (model: {}, max_tokens: {})", self.model, request.max_tokens);

        let body = OpenAiRequest {
            model: &self.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            top_p: request.top_p,
            stream: false,
            response_format: request.json_output.then_some(ResponseFormat { kind: "json_object" }),
        };

        let response = self.client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimited);
        }

        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::ApiError(format!("HTTP {}: {}", status, error_text)));
        }

        let parsed = response.json::<OpenAiResponse>()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        if let Some(usage) = &parsed.usage {
            info!("Completion generated. Tokens: {} prompt + {} completion = {} total",
                  usage.prompt_tokens, usage.completion_tokens, usage.total_tokens);
        }

        parsed.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))
    }
}

/// Output length class; picks between the two token budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Length {
    Chat,
    Long,
}

/// Persona-aware front of the completion client. Adds the system prompt,
/// applies sampling parameters, issues exactly one call. No retries.
pub struct LlmService {
    config: LlmConfig,
    provider: Arc<dyn LlmProvider>,
}

impl LlmService {
    pub fn new(config: LlmConfig, provider: Arc<dyn LlmProvider>) -> Self {
        Self { config, provider }
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    pub fn request(&self, messages: Vec<ChatMessage>, length: Length) -> CompletionRequest {
        CompletionRequest {
            messages,
            temperature: self.config.temperature,
            max_tokens: match length {
                Length::Chat => self.config.chat_max_tokens,
                Length::Long => self.config.long_max_tokens,
            },
            top_p: self.config.top_p,
            json_output: false,
        }
    }

    pub async fn complete(
        &self,
        api_key: Option<&str>,
        request: CompletionRequest,
    ) -> Result<String, LlmError> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(LlmError::MissingApiKey)?;

        self.provider.generate_completion(api_key, request).await.map_err(|e| {
            error!("Completion call failed: {}", e);
            e
        })
    }

    /// Single-turn call conditioned on a persona's fixed instructions.
    pub async fn ask_persona(
        &self,
        api_key: Option<&str>,
        persona: Persona,
        content: &str,
        length: Length,
    ) -> Result<String, LlmError> {
        let request = self.request(
            vec![ChatMessage::system(persona.instructions()), ChatMessage::user(content)],
            length,
        );
        self.complete(api_key, request).await
    }

    /// Same as [`ask_persona`](Self::ask_persona) but never fails: errors come
    /// back as marker-prefixed text for inline display.
    pub async fn ask_persona_text(
        &self,
        api_key: Option<&str>,
        persona: Persona,
        content: &str,
        length: Length,
    ) -> String {
        match self.ask_persona(api_key, persona, content, length).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Returning inline error for persona {}: {}", persona, e);
                error_reply(&e)
            }
        }
    }

    /// Call as a named agent with a running transcript.
    pub async fn ask_agent(
        &self,
        api_key: Option<&str>,
        agent: &AgentProfile,
        history: Vec<ChatMessage>,
        length: Length,
    ) -> Result<String, LlmError> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::system(agent.system_prompt.clone()));
        messages.extend(history);
        self.complete(api_key, self.request(messages, length)).await
    }
}

pub fn error_reply(error: &LlmError) -> String {
    format!("{}{}. Please try again.", ERROR_MARKER, error)
}

pub fn is_error_reply(text: &str) -> bool {
    text.starts_with(ERROR_MARKER)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Replays canned results in order and records every request.
    pub(crate) struct ScriptedProvider {
        replies: Mutex<Vec<Result<String, LlmError>>>,
        pub(crate) requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedProvider {
        pub(crate) fn new(replies: Vec<Result<String, LlmError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().rev().collect()),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn generate_completion(
            &self,
            _api_key: &str,
            request: CompletionRequest,
        ) -> Result<String, LlmError> {
            self.requests.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(LlmError::ApiError("script exhausted".into())))
        }
    }

    fn service(replies: Vec<Result<String, LlmError>>) -> (LlmService, Arc<ScriptedProvider>) {
        let provider = Arc::new(ScriptedProvider::new(replies));
        (LlmService::new(LlmConfig::default(), provider.clone()), provider)
    }

    #[tokio::test]
    async fn test_persona_prompt_is_system_message() {
        let (svc, provider) = service(vec![Ok("hi".into())]);
        let out = svc
            .ask_persona(Some("key"), Persona::Editor, "fix this", Length::Chat)
            .await
            .unwrap();
        assert_eq!(out, "hi");

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let req = &requests[0];
        assert_eq!(req.messages[0], ChatMessage::system(Persona::Editor.instructions()));
        assert_eq!(req.messages[1], ChatMessage::user("fix this"));
        assert_eq!(req.max_tokens, 1024);
        assert_eq!(req.temperature, 0.7);
        assert_eq!(req.top_p, 1.0);
    }

    #[tokio::test]
    async fn test_missing_key_never_calls_provider() {
        let (svc, provider) = service(vec![Ok("unused".into())]);
        let result = svc.ask_persona(None, Persona::Default, "hello", Length::Chat).await;
        assert_eq!(result, Err(LlmError::MissingApiKey));

        let result = svc.ask_persona(Some("  "), Persona::Default, "hello", Length::Chat).await;
        assert_eq!(result, Err(LlmError::MissingApiKey));
        assert!(provider.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_errors_become_marked_text_without_retry() {
        let (svc, provider) = service(vec![Err(LlmError::Timeout), Ok("late".into())]);
        let text = svc
            .ask_persona_text(Some("key"), Persona::Writer, "draft", Length::Long)
            .await;
        assert!(is_error_reply(&text));
        assert!(text.contains("request timed out"));
        assert_eq!(provider.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_agent_history_follows_system_prompt() {
        let (svc, provider) = service(vec![Ok("ok".into())]);
        let agent = AgentProfile::comedian("Rose");
        svc.ask_agent(Some("key"), &agent, vec![ChatMessage::user("knock knock")], Length::Chat)
            .await
            .unwrap();
        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests[0].messages.len(), 2);
        assert_eq!(requests[0].messages[0].role, "system");
        assert_eq!(requests[0].messages[1].content, "knock knock");
    }

    #[test]
    fn test_request_serialization_includes_sampling_params() {
        let messages = vec![ChatMessage::user("hi")];
        let body = OpenAiRequest {
            model: "llama-3.3-70b-versatile",
            messages: &messages,
            max_tokens: 2048,
            temperature: 0.7,
            top_p: 1.0,
            stream: false,
            response_format: Some(ResponseFormat { kind: "json_object" }),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["max_tokens"], 2048);
        assert_eq!(json["top_p"], 1.0);
        assert_eq!(json["stream"], false);
        assert_eq!(json["response_format"]["type"], "json_object");
    }
}
