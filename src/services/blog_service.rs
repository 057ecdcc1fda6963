use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::{AppError, LlmError};
use crate::models::{BlogDraft, Message, Persona, SessionConfig, WritingStage};
use crate::services::editor::edit_text;
use crate::services::llm_service::{error_reply, Length, LlmService};
use crate::services::session_store::SessionStore;

pub const MAX_KEYWORDS: usize = 15;

static KEYWORD_SPLIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[,\n;]").expect("valid regex"));
static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^(?:[-*•]|\d+[.)])\s*|["']"#).expect("valid regex"));

#[derive(Debug, Clone, Deserialize)]
pub struct SetTopic {
    pub topic: String,
    pub target_audience: Option<String>,
    pub tone: Option<String>,
    pub word_count: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlogView {
    pub draft: BlogDraft,
    pub stage: WritingStage,
    pub progress: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlogStepResult {
    pub stage: WritingStage,
    pub progress: u8,
    pub message: Message,
    pub is_error: bool,
}

/// Everything a step needs, copied out of the session so no lock is held
/// during the model call.
struct Snapshot {
    api_key: Option<String>,
    config: SessionConfig,
    draft: BlogDraft,
}

fn snapshot(store: &SessionStore, id: Uuid) -> Result<Snapshot, AppError> {
    store.read(id, |s| Snapshot {
        api_key: s.api_key.clone(),
        config: s.config.clone(),
        draft: s.blog.clone(),
    })
}

fn require(value: &str, what: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required before this step", what)));
    }
    Ok(())
}

pub fn view(store: &SessionStore, id: Uuid) -> Result<BlogView, AppError> {
    store.read(id, |s| BlogView {
        draft: s.blog.clone(),
        stage: s.writing_stage,
        progress: s.writing_stage.progress(),
    })
}

pub fn set_topic(store: &SessionStore, id: Uuid, input: SetTopic) -> Result<BlogView, AppError> {
    let topic = input.topic.trim().to_string();
    require(&topic, "A topic")?;

    store.update(id, |s| {
        s.blog.topic = topic;
        if let Some(audience) = input.target_audience {
            s.config.target_audience = audience;
        }
        if let Some(tone) = input.tone {
            s.config.tone = tone;
        }
        if let Some(word_count) = input.word_count {
            s.config.word_count = word_count;
        }
        s.writing_stage = WritingStage::Setup;
    })?;
    view(store, id)
}

/// Stores the step's output and advances the stage, or records the inline
/// error and leaves draft and stage untouched.
fn finish_step(
    store: &SessionStore,
    id: Uuid,
    persona: Persona,
    result: Result<String, LlmError>,
    stage: WritingStage,
    apply: impl FnOnce(&mut BlogDraft, &str),
) -> Result<BlogStepResult, AppError> {
    store.update(id, |s| match result {
        Ok(text) => {
            apply(&mut s.blog, &text);
            s.writing_stage = stage;
            let message = Message::assistant(persona, text);
            s.push(message.clone());
            BlogStepResult { stage, progress: stage.progress(), message, is_error: false }
        }
        Err(e) => {
            let message = Message::assistant(persona, error_reply(&e));
            s.push(message.clone());
            BlogStepResult {
                stage: s.writing_stage,
                progress: s.writing_stage.progress(),
                message,
                is_error: true,
            }
        }
    })
}

pub async fn research(store: &SessionStore, llm: &LlmService, id: Uuid) -> Result<BlogStepResult, AppError> {
    let snap = snapshot(store, id)?;
    require(&snap.draft.topic, "A topic")?;
    info!("Session {} researching blog topic {:?}", id, snap.draft.topic);

    let prompt = format!(
        r#"Please research the following blog topic: "{topic}"

Target Audience: {audience}

Provide a comprehensive research report including:
1. Key angles and perspectives
2. Main subtopics to cover
3. Important facts and data points
4. Target audience interests and pain points
5. Potential sources and references
6. Current trends related to this topic

Format your response as a structured research report."#,
        topic = snap.draft.topic,
        audience = snap.config.target_audience,
    );

    store.append(id, [Message::user(format!("Research topic: {}", snap.draft.topic))])?;
    let api_key = snap.api_key.as_deref();
    let result = llm.ask_persona(api_key, Persona::Researcher, &prompt, Length::Long).await;

    let keywords = if result.is_ok() {
        generate_keywords(llm, api_key, &snap.draft.topic, &snap.config.target_audience).await
    } else {
        Vec::new()
    };

    finish_step(store, id, Persona::Researcher, result, WritingStage::Research, |draft, text| {
        draft.research = text.to_string();
        draft.keywords = keywords;
    })
}

async fn generate_keywords(llm: &LlmService, api_key: Option<&str>, topic: &str, audience: &str) -> Vec<String> {
    let prompt = format!(
        r#"Generate 10-15 relevant keywords and keyphrases for a blog about:

TOPIC: {topic}
TARGET AUDIENCE: {audience}

Include:
- Primary keywords (1-2 words)
- Long-tail keywords (3-5 words)
- Question-based keywords
- LSI (Latent Semantic Indexing) keywords

Format as a simple comma-separated list."#
    );

    match llm.ask_persona(api_key, Persona::Seo, &prompt, Length::Chat).await {
        Ok(text) => parse_keywords(&text),
        Err(e) => {
            warn!("Keyword generation failed, continuing without keywords: {}", e);
            Vec::new()
        }
    }
}

/// Splits a comma/line separated keyword list, dropping bullets, numbering,
/// quotes and blanks. At most [`MAX_KEYWORDS`] are kept.
pub fn parse_keywords(text: &str) -> Vec<String> {
    KEYWORD_SPLIT
        .split(text)
        .map(|raw| LIST_MARKER.replace_all(raw.trim(), "").trim().to_string())
        .filter(|kw| !kw.is_empty())
        .take(MAX_KEYWORDS)
        .collect()
}

pub async fn outline(store: &SessionStore, llm: &LlmService, id: Uuid) -> Result<BlogStepResult, AppError> {
    let snap = snapshot(store, id)?;
    require(&snap.draft.research, "Research")?;

    let prompt = format!(
        r#"Based on the following research, create a detailed blog outline:

Topic: {topic}
Target Audience: {audience}
Tone: {tone}
Estimated Word Count: {words}

Research Insights:
{research}

Create a comprehensive outline with:
- Compelling introduction
- Main sections with subpoints
- Logical flow
- Key takeaways
- Strong conclusion

Format the outline clearly with headings and bullet points."#,
        topic = snap.draft.topic,
        audience = snap.config.target_audience,
        tone = snap.config.tone,
        words = snap.config.word_count,
        research = snap.draft.research,
    );

    store.append(id, [Message::user("Generate outline")])?;
    let result = llm.ask_persona(snap.api_key.as_deref(), Persona::Writer, &prompt, Length::Long).await;
    finish_step(store, id, Persona::Writer, result, WritingStage::Outline, |draft, text| {
        draft.outline = text.to_string();
    })
}

pub async fn write(store: &SessionStore, llm: &LlmService, id: Uuid) -> Result<BlogStepResult, AppError> {
    let snap = snapshot(store, id)?;
    require(&snap.draft.outline, "An outline")?;

    let keywords = if snap.draft.keywords.is_empty() {
        "Not specified".to_string()
    } else {
        snap.draft.keywords.join(", ")
    };

    let prompt = format!(
        r#"Write a complete blog post based on this outline and research:

TOPIC: {topic}
TARGET AUDIENCE: {audience}
KEYWORDS: {keywords}

OUTLINE:
{outline}

RESEARCH INSIGHTS:
{research}

Please write the full blog post of about {words} words with:
- Engaging introduction
- Well-structured body paragraphs
- Clear headings and subheadings
- Bullet points or numbered lists where appropriate
- Compelling conclusion
- Natural incorporation of keywords

Write in a {tone} tone."#,
        topic = snap.draft.topic,
        audience = snap.config.target_audience,
        outline = snap.draft.outline,
        research = snap.draft.research,
        words = snap.config.word_count,
        tone = snap.config.tone,
    );

    store.append(id, [Message::user("Write full blog")])?;
    let result = llm.ask_persona(snap.api_key.as_deref(), Persona::Writer, &prompt, Length::Long).await;
    finish_step(store, id, Persona::Writer, result, WritingStage::Writing, |draft, text| {
        draft.content = text.to_string();
    })
}

pub async fn seo(store: &SessionStore, llm: &LlmService, id: Uuid) -> Result<BlogStepResult, AppError> {
    let snap = snapshot(store, id)?;
    require(&snap.draft.content, "Blog content")?;

    let keywords = if snap.draft.keywords.is_empty() {
        "Not specified".to_string()
    } else {
        snap.draft.keywords.join(", ")
    };

    let prompt = format!(
        r#"Analyze the following blog content for SEO and provide optimization recommendations:

TOPIC: {topic}
TARGET KEYWORDS: {keywords}

CONTENT:
{content}

Provide a comprehensive SEO analysis including:
1. Keyword optimization suggestions
2. Meta description recommendations
3. Title tag optimization
4. Internal linking opportunities
5. Readability improvements
6. Competitor analysis insights
7. Technical SEO considerations

Be specific and provide actionable recommendations."#,
        topic = snap.draft.topic,
        content = snap.draft.content,
    );

    store.append(id, [Message::user("SEO analysis")])?;
    let result = llm.ask_persona(snap.api_key.as_deref(), Persona::Seo, &prompt, Length::Long).await;
    finish_step(store, id, Persona::Seo, result, WritingStage::Seo, |draft, text| {
        draft.seo_analysis = text.to_string();
    })
}

pub async fn edit(store: &SessionStore, llm: &LlmService, id: Uuid) -> Result<BlogStepResult, AppError> {
    let snap = snapshot(store, id)?;
    require(&snap.draft.content, "Blog content")?;

    store.append(id, [Message::user("Edit content")])?;
    let result = edit_text(
        llm,
        snap.api_key.as_deref(),
        &snap.draft.topic,
        &snap.config.tone,
        &snap.draft.content,
    )
    .await;

    // The chat message shows the feedback; the draft keeps both fields.
    let (shown, output) = match result {
        Ok(output) => (Ok(output.feedback.clone()), Some(output)),
        Err(e) => (Err(e), None),
    };

    finish_step(store, id, Persona::Editor, shown, WritingStage::Editing, |draft, _| {
        if let Some(output) = output {
            draft.edited_content = output.edited_content;
            draft.editor_feedback = output.feedback;
        }
    })
}

pub fn complete(store: &SessionStore, id: Uuid) -> Result<BlogView, AppError> {
    store.update(id, |s| s.writing_stage = WritingStage::Complete)?;
    view(store, id)
}

pub fn reset(store: &SessionStore, id: Uuid) -> Result<BlogView, AppError> {
    store.update(id, |s| s.reset_blog())?;
    view(store, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;
    use crate::services::llm_service::tests::ScriptedProvider;
    use std::sync::Arc;

    fn setup(replies: Vec<Result<String, LlmError>>) -> (SessionStore, LlmService, Uuid) {
        let store = SessionStore::new();
        let id = store.create(Some("key".into()), SessionConfig::default());
        let llm = LlmService::new(LlmConfig::default(), Arc::new(ScriptedProvider::new(replies)));
        (store, llm, id)
    }

    fn topic(store: &SessionStore, id: Uuid) {
        set_topic(
            store,
            id,
            SetTopic {
                topic: "Rust for data pipelines".into(),
                target_audience: Some("engineers".into()),
                tone: None,
                word_count: None,
            },
        )
        .unwrap();
    }

    #[test]
    fn test_parse_keywords() {
        let kws = parse_keywords("rust, \"data pipeline\",\n1. tokio\n- async io, , serde");
        assert_eq!(kws, vec!["rust", "data pipeline", "tokio", "async io", "serde"]);

        let many = (0..30).map(|i| format!("kw{}", i)).collect::<Vec<_>>().join(",");
        assert_eq!(parse_keywords(&many).len(), MAX_KEYWORDS);
    }

    #[tokio::test]
    async fn test_full_workflow_advances_stages() {
        let (store, llm, id) = setup(vec![
            Ok("research notes".into()),
            Ok("rust, tokio, serde".into()),
            Ok("# Outline".into()),
            Ok("# Post body".into()),
            Ok("Add a meta description".into()),
            Ok(r##"{"edited_content":"# Post body, polished","feedback":"Tightened intro"}"##.into()),
        ]);
        topic(&store, id);

        let r = research(&store, &llm, id).await.unwrap();
        assert_eq!(r.stage, WritingStage::Research);
        assert_eq!(view(&store, id).unwrap().draft.keywords, vec!["rust", "tokio", "serde"]);

        assert_eq!(outline(&store, &llm, id).await.unwrap().stage, WritingStage::Outline);
        assert_eq!(write(&store, &llm, id).await.unwrap().progress, 60);
        assert_eq!(seo(&store, &llm, id).await.unwrap().stage, WritingStage::Seo);

        let edited = edit(&store, &llm, id).await.unwrap();
        assert_eq!(edited.stage, WritingStage::Editing);
        assert_eq!(edited.message.content, "Tightened intro");

        let blog = view(&store, id).unwrap();
        assert_eq!(blog.draft.final_text(), Some("# Post body, polished"));
        assert_eq!(complete(&store, id).unwrap().progress, 100);
    }

    #[tokio::test]
    async fn test_steps_require_prior_output() {
        let (store, llm, id) = setup(vec![]);
        assert!(matches!(research(&store, &llm, id).await, Err(AppError::Validation(_))));
        topic(&store, id);
        assert!(matches!(outline(&store, &llm, id).await, Err(AppError::Validation(_))));
        assert!(matches!(edit(&store, &llm, id).await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_failed_step_keeps_stage_and_reports_inline() {
        let (store, llm, id) = setup(vec![Err(LlmError::Timeout)]);
        topic(&store, id);

        let r = research(&store, &llm, id).await.unwrap();
        assert!(r.is_error);
        assert_eq!(r.stage, WritingStage::Setup);
        assert!(view(&store, id).unwrap().draft.research.is_empty());
    }

    #[tokio::test]
    async fn test_reset_clears_draft() {
        let (store, _llm, id) = setup(vec![]);
        topic(&store, id);
        let blog = reset(&store, id).unwrap();
        assert_eq!(blog.draft, BlogDraft::default());
        assert_eq!(blog.stage, WritingStage::Setup);
    }
}
