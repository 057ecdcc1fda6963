use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::LlmError;
use crate::models::Persona;
use crate::services::llm_service::{ChatMessage, Length, LlmService};

pub const DEFAULT_FEEDBACK: &str = "Comprehensive editing completed. Review the changes above.";

/// The editor persona's two-part answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorOutput {
    pub edited_content: String,
    pub feedback: String,
}

fn build_edit_prompt(topic: &str, tone: &str, content: &str) -> String {
    format!(
        r#"Please edit and improve the following content:

TOPIC: {topic}
DESIRED TONE: {tone}

CONTENT TO EDIT:
{content}

Focus on:
- Grammar and spelling
- Sentence structure and flow
- Tone consistency
- Readability improvements
- Eliminating redundancy
- Enhancing clarity

Respond with a single JSON object and nothing else:
{{
  "edited_content": "<the full improved content in markdown>",
  "feedback": "<specific feedback on what was changed and why>"
}}"#
    )
}

/// Reads the JSON answer. Anything that doesn't parse is taken whole as the
/// edited content with a generic feedback line.
pub fn parse_editor_response(response: &str) -> EditorOutput {
    let trimmed = strip_code_fence(response.trim());

    match serde_json::from_str::<EditorOutput>(trimmed) {
        Ok(output) if !output.edited_content.trim().is_empty() => output,
        _ => {
            warn!("Editor response was not the expected JSON, using whole text");
            EditorOutput {
                edited_content: response.trim().to_string(),
                feedback: DEFAULT_FEEDBACK.to_string(),
            }
        }
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// One editor call returning content and feedback as separate fields.
pub async fn edit_text(
    llm: &LlmService,
    api_key: Option<&str>,
    topic: &str,
    tone: &str,
    content: &str,
) -> Result<EditorOutput, LlmError> {
    let mut request = llm.request(
        vec![
            ChatMessage::system(Persona::Editor.instructions()),
            ChatMessage::user(build_edit_prompt(topic, tone, content)),
        ],
        Length::Long,
    );
    request.json_output = true;

    let response = llm.complete(api_key, request).await?;
    Ok(parse_editor_response(&response))
}
