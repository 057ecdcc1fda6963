use crate::models::{Persona, PersonaSet};

/// One routing rule: any keyword contained in the lower-cased text selects
/// the persona.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub persona: Persona,
    pub keywords: &'static [&'static str],
}

// Evaluated top to bottom, first hit wins. Reordering these changes which
// persona answers mixed requests.
pub const RULES: [Rule; 6] = [
    Rule {
        persona: Persona::Researcher,
        keywords: &["research", "data", "facts", "statistics", "sources"],
    },
    Rule {
        persona: Persona::Editor,
        keywords: &["edit", "grammar", "proofread", "spelling", "tone", "feedback", "improve"],
    },
    Rule {
        persona: Persona::Writer,
        keywords: &["write", "content", "blog", "article", "draft", "outline"],
    },
    Rule {
        persona: Persona::Seo,
        keywords: &["seo", "keyword", "optimize", "search", "ranking", "meta description"],
    },
    Rule {
        persona: Persona::Technical,
        keywords: &["install", "api", "integration", "configure", "error", "bug", "code"],
    },
    Rule {
        persona: Persona::Onboarding,
        keywords: &["account", "profile", "team", "onboard", "getting started", "feature"],
    },
];

/// Ordered keyword router over a subset of [`RULES`].
#[derive(Debug, Clone)]
pub struct RoleDispatcher {
    rules: Vec<Rule>,
}

impl RoleDispatcher {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Rules for a persona set, keeping their global order.
    pub fn for_set(set: PersonaSet) -> Self {
        let allowed: &[Persona] = match set {
            PersonaSet::Blog => &[Persona::Researcher, Persona::Editor, Persona::Writer, Persona::Seo],
            PersonaSet::Onboarding => &[Persona::Technical, Persona::Onboarding],
            PersonaSet::All => &[
                Persona::Researcher,
                Persona::Editor,
                Persona::Writer,
                Persona::Seo,
                Persona::Technical,
                Persona::Onboarding,
            ],
        };
        Self::new(
            RULES
                .iter()
                .filter(|r| allowed.contains(&r.persona))
                .copied()
                .collect(),
        )
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn dispatch(&self, text: &str) -> Persona {
        let lowered = text.to_lowercase();
        if lowered.trim().is_empty() {
            return Persona::Default;
        }

        self.rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|kw| lowered.contains(kw)))
            .map(|rule| rule.persona)
            .unwrap_or(Persona::Default)
    }
}

impl Default for RoleDispatcher {
    fn default() -> Self {
        Self::for_set(PersonaSet::All)
    }
}

/// Routes with the full rule table.
pub fn dispatch(text: &str) -> Persona {
    RoleDispatcher::default().dispatch(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_keyword_routes_to_its_persona() {
        for rule in RULES {
            for kw in rule.keywords {
                let text = format!("Please {} now", kw.to_uppercase());
                assert_eq!(dispatch(&text), rule.persona, "keyword {:?}", kw);
            }
        }
    }

    #[test]
    fn test_no_match_and_empty_fall_back_to_default() {
        assert_eq!(dispatch(""), Persona::Default);
        assert_eq!(dispatch("   "), Persona::Default);
        assert_eq!(dispatch("hello there, how are you?"), Persona::Default);
    }

    #[test]
    fn test_editor_wins_over_writer() {
        assert_eq!(dispatch("help me fix grammar and tone"), Persona::Editor);
        assert_eq!(dispatch("improve the blog article"), Persona::Editor);
    }

    #[test]
    fn test_first_rule_in_order_wins() {
        // researcher precedes seo
        assert_eq!(dispatch("research keywords for my post"), Persona::Researcher);
        // writer precedes seo
        assert_eq!(dispatch("optimize my blog"), Persona::Writer);
        assert_eq!(dispatch("check the meta description"), Persona::Seo);
        // writer precedes technical
        assert_eq!(dispatch("write the api docs"), Persona::Writer);
    }

    #[test]
    fn test_matching_is_substring_based() {
        assert_eq!(dispatch("Proofreading please"), Persona::Editor);
        assert_eq!(dispatch("Our TEAMS need help"), Persona::Onboarding);
    }

    #[test]
    fn test_persona_sets_restrict_rules() {
        let onboarding = RoleDispatcher::for_set(PersonaSet::Onboarding);
        assert_eq!(onboarding.dispatch("how do I install the api client"), Persona::Technical);
        assert_eq!(onboarding.dispatch("write a blog"), Persona::Default);

        let blog = RoleDispatcher::for_set(PersonaSet::Blog);
        assert_eq!(blog.dispatch("set up my account"), Persona::Default);
        assert_eq!(blog.rules().len(), 4);
        assert_eq!(blog.rules()[0].persona, Persona::Researcher);
        assert_eq!(blog.rules()[2].persona, Persona::Writer);
        assert_eq!(blog.rules()[3].persona, Persona::Seo);
    }
}
