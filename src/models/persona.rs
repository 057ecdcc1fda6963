use serde::{Deserialize, Serialize};
use std::fmt;

/// Canned response personas a chat message can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    Researcher,
    Writer,
    Seo,
    Editor,
    Technical,
    Onboarding,
    Default,
}

impl Persona {
    pub const ALL: [Persona; 7] = [
        Persona::Researcher,
        Persona::Writer,
        Persona::Seo,
        Persona::Editor,
        Persona::Technical,
        Persona::Onboarding,
        Persona::Default,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Persona::Researcher => "researcher",
            Persona::Writer => "writer",
            Persona::Seo => "seo",
            Persona::Editor => "editor",
            Persona::Technical => "technical",
            Persona::Onboarding => "onboarding",
            Persona::Default => "default",
        }
    }

    pub fn config(&self) -> &'static PersonaConfig {
        match self {
            Persona::Researcher => &RESEARCHER,
            Persona::Writer => &WRITER,
            Persona::Seo => &SEO,
            Persona::Editor => &EDITOR,
            Persona::Technical => &TECHNICAL,
            Persona::Onboarding => &ONBOARDING,
            Persona::Default => &DEFAULT,
        }
    }

    pub fn instructions(&self) -> &'static str {
        self.config().instructions
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display hint for front-ends; mirrors the message colour classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayStyle {
    Research,
    Writing,
    Seo,
    Editing,
    Technical,
    Onboarding,
    Assistant,
}

/// Fixed instructions and presentation for one persona. The table is
/// `static`, so entries can't change after startup.
#[derive(Debug, Serialize)]
pub struct PersonaConfig {
    pub persona: Persona,
    pub display_name: &'static str,
    pub icon: &'static str,
    pub style: DisplayStyle,
    pub instructions: &'static str,
}

static RESEARCHER: PersonaConfig = PersonaConfig {
    persona: Persona::Researcher,
    display_name: "Content Researcher",
    icon: "🔍",
    style: DisplayStyle::Research,
    instructions: "You are an expert content researcher and strategist. Your role is to:
- Research topics thoroughly
- Identify key points and angles for blog posts
- Suggest relevant subtopics and structure
- Provide factual information and data points
- Identify target audience and their interests
Be thorough, factual, and strategic in your approach.
Always cite reliable sources and provide well-researched information.",
};

static WRITER: PersonaConfig = PersonaConfig {
    persona: Persona::Writer,
    display_name: "Blog Writer",
    icon: "✍️",
    style: DisplayStyle::Writing,
    instructions: "You are a professional blog writer with expertise in creating engaging, well-structured content.
Your responsibilities include:
- Writing compelling introductions that hook readers
- Creating well-organized, readable content
- Using appropriate tone and style for the target audience
- Incorporating storytelling elements when relevant
- Ensuring content flows logically from section to section
- Using clear, concise language
Write in an engaging, professional tone. Use headings, subheadings, and bullet points appropriately.
Make complex topics accessible to your target audience.",
};

static SEO: PersonaConfig = PersonaConfig {
    persona: Persona::Seo,
    display_name: "SEO Specialist",
    icon: "📈",
    style: DisplayStyle::Seo,
    instructions: "You are an SEO expert specializing in blog content optimization.
Your role is to:
- Suggest relevant keywords and keyphrases
- Optimize meta descriptions and titles
- Improve content structure for search engines
- Suggest internal and external linking strategies
- Analyze competitor content and identify opportunities
- Ensure content meets search intent
Provide specific, actionable SEO recommendations.
Focus on both on-page and technical SEO aspects.",
};

static EDITOR: PersonaConfig = PersonaConfig {
    persona: Persona::Editor,
    display_name: "Editor",
    icon: "📝",
    style: DisplayStyle::Editing,
    instructions: "You are a professional editor with sharp attention to detail.
Your responsibilities include:
- Checking grammar, spelling, and punctuation
- Improving sentence structure and readability
- Ensuring consistent tone and style
- Verifying factual accuracy
- Improving flow and transitions
- Eliminating redundancy and wordiness
- Ensuring the content meets quality standards
Be thorough but constructive in your feedback.
Suggest specific improvements with explanations.",
};

static TECHNICAL: PersonaConfig = PersonaConfig {
    persona: Persona::Technical,
    display_name: "Technical Support",
    icon: "🛠️",
    style: DisplayStyle::Technical,
    instructions: "You are a technical support specialist focusing on technical aspects of onboarding.
You help with:
- Software installation and setup
- Technical configuration
- Integration with other tools
- API and developer documentation
- Troubleshooting technical issues
Provide clear, technical instructions. Include code examples when relevant.
Explain technical concepts in an accessible way.",
};

static ONBOARDING: PersonaConfig = PersonaConfig {
    persona: Persona::Onboarding,
    display_name: "Onboarding Specialist",
    icon: "🤝",
    style: DisplayStyle::Onboarding,
    instructions: "You are an expert onboarding specialist. Your role is to guide new users through the onboarding process.
You help with:
- Account setup and configuration
- Platform navigation and features
- Team introductions and collaboration
- Best practices and tips
- Troubleshooting common issues
Be friendly, patient, and thorough in your explanations. Ask clarifying questions when needed.
Provide step-by-step guidance and check for understanding.
Always maintain a professional yet approachable tone.",
};

static DEFAULT: PersonaConfig = PersonaConfig {
    persona: Persona::Default,
    display_name: "Assistant",
    icon: "🤖",
    style: DisplayStyle::Assistant,
    instructions: "You are a helpful writing and onboarding assistant. Answer the user's request clearly and concisely. \
Use markdown for structure when it helps readability.",
};

/// A named conversation participant outside the dispatch table, e.g. the
/// two comedians or the stock-report team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub name: String,
    pub system_prompt: String,
}

impl AgentProfile {
    pub fn new(name: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            system_prompt: system_prompt.into(),
        }
    }

    pub fn comedian(name: &str) -> Self {
        Self::new(
            name,
            format!(
                "Your name is {} and you are a stand-up comedian in a two-person comedy show.",
                name
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_persona_has_matching_config() {
        for persona in Persona::ALL {
            let config = persona.config();
            assert_eq!(config.persona, persona);
            assert!(!config.instructions.is_empty());
        }
    }

    #[test]
    fn test_persona_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Persona::Seo).unwrap(), "\"seo\"");
        let parsed: Persona = serde_json::from_str("\"technical\"").unwrap();
        assert_eq!(parsed, Persona::Technical);
    }

    #[test]
    fn test_comedian_prompt_uses_name() {
        let jack = AgentProfile::comedian("Jack");
        assert!(jack.system_prompt.starts_with("Your name is Jack"));
    }
}
