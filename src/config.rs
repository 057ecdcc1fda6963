use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Upper bound on completion calls one report-team run may issue.
pub const MAX_TEAM_ROUNDS: usize = 20;
pub const MAX_CONVERSATION_TURNS: usize = 10;

/// Completion endpoint parameters shared by every session.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    /// Budget for short chat replies.
    pub chat_max_tokens: usize,
    /// Budget for long-form output (blog drafts, reports).
    pub long_max_tokens: usize,
    pub top_p: f32,
    pub timeout: Duration,
    /// Credential handed to sessions created without one.
    pub default_api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            chat_max_tokens: 1024,
            long_max_tokens: 2048,
            top_p: 1.0,
            timeout: Duration::from_secs(120),
            default_api_key: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub llm: LlmConfig,
    /// Pause between simulated agent-activity steps.
    pub agent_step_delay: Duration,
    pub report_team_rounds: usize,
    pub conversation_max_turns: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            llm: LlmConfig::default(),
            agent_step_delay: Duration::ZERO,
            report_team_rounds: 3,
            conversation_max_turns: 2,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup so tests
    /// don't have to touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();
        let llm_defaults = defaults.llm.clone();

        let default_api_key = lookup("GROQ_API_KEY").filter(|k| !k.trim().is_empty());

        let llm = LlmConfig {
            base_url: lookup("LLM_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(llm_defaults.base_url),
            model: lookup("LLM_MODEL").unwrap_or(llm_defaults.model),
            temperature: parse_or(&lookup, "LLM_TEMPERATURE", llm_defaults.temperature),
            chat_max_tokens: parse_or(&lookup, "LLM_CHAT_MAX_TOKENS", llm_defaults.chat_max_tokens),
            long_max_tokens: parse_or(&lookup, "LLM_LONG_MAX_TOKENS", llm_defaults.long_max_tokens),
            top_p: parse_or(&lookup, "LLM_TOP_P", llm_defaults.top_p),
            timeout: Duration::from_secs(parse_or(
                &lookup,
                "LLM_TIMEOUT_SECS",
                llm_defaults.timeout.as_secs(),
            )),
            default_api_key,
        };

        Self {
            bind_addr: parse_or(&lookup, "BIND_ADDR", defaults.bind_addr),
            llm,
            agent_step_delay: Duration::from_millis(parse_or(&lookup, "AGENT_STEP_DELAY_MS", 0u64)),
            report_team_rounds: parse_or(&lookup, "REPORT_TEAM_ROUNDS", defaults.report_team_rounds)
                .clamp(1, MAX_TEAM_ROUNDS),
            conversation_max_turns: parse_or(
                &lookup,
                "CONVERSATION_MAX_TURNS",
                defaults.conversation_max_turns,
            )
            .clamp(1, MAX_CONVERSATION_TURNS),
        }
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!("Ignoring unparseable {}={:?}, using default", key, raw);
                default
            }
        },
        None => default,
    }
}
