//! Supervisor: decides which agent handles a chat message.
//!
//! Keyword rules come first; only unclear messages cost an LLM call.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::agents::general::words;
use crate::agents::prompts::{SUPERVISOR_CLASSIFY_PROMPT, SUPERVISOR_INSTRUCTION};
use crate::agents::AgentKind;
use crate::llm_client::prompts::system_prompt;
use crate::llm_client::{CompletionRequest, CompletionService};

const SHORT_QUERY_WORDS: usize = 3;

const GREETINGS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "good morning",
    "good afternoon",
    "good evening",
    "howdy",
    "greetings",
];
const CASUAL: &[&str] = &[
    "how are you",
    "whats up",
    "what's up",
    "thanks",
    "thank you",
    "bye",
    "goodbye",
    "ok",
    "okay",
    "yes",
    "no",
];

const JOB_PHRASES: &[&str] = &[
    "find job",
    "find me job",
    "search job",
    "match job",
    "matching job",
    "show job",
    "get job",
    "jobs for",
    "jobs that match",
];
const RESUME_PHRASES: &[&str] = &[
    "review resume",
    "check resume",
    "improve resume",
    "feedback on resume",
    "resume review",
    "resume feedback",
];
const INTERVIEW_PHRASES: &[&str] = &[
    "interview prep",
    "interview question",
    "prepare interview",
    "interview help",
    "practice interview",
];
const JOB_WORDS: &[&str] = &[
    "job", "jobs", "position", "positions", "role", "roles", "opening", "openings", "vacancy",
];

/// Routing decided by keyword rules alone. `None` means the message is unclear.
///
/// Short phrases (three words or fewer) are matched as whole words so that
/// "find jobs now" is not mistaken for a casual "no".
pub fn keyword_route(query: &str) -> Option<AgentKind> {
    let lower = query.trim().to_lowercase();
    let tokens = words(query);
    let joined = tokens.join(" ");
    let contains_words = |phrase: &str| {
        let padded = format!(" {joined} ");
        padded.contains(&format!(" {phrase} "))
    };

    if tokens.len() <= SHORT_QUERY_WORDS
        && GREETINGS.iter().chain(CASUAL).any(|p| contains_words(p))
    {
        return Some(AgentKind::General);
    }

    if JOB_PHRASES.iter().any(|p| lower.contains(p)) {
        return Some(AgentKind::JobMatcher);
    }
    if RESUME_PHRASES.iter().any(|p| lower.contains(p)) {
        return Some(AgentKind::ResumeCoach);
    }
    if INTERVIEW_PHRASES.iter().any(|p| lower.contains(p)) {
        return Some(AgentKind::InterviewPrep);
    }

    if lower.contains("resume") && !lower.contains("job") {
        return Some(AgentKind::ResumeCoach);
    }
    if lower.contains("interview") {
        return Some(AgentKind::InterviewPrep);
    }
    if tokens.iter().any(|t| JOB_WORDS.contains(&t.as_str())) {
        return Some(AgentKind::JobMatcher);
    }

    None
}

/// Finds the first agent name mentioned in a classification answer.
fn parse_classification(answer: &str) -> Option<AgentKind> {
    let answer = answer.trim().to_lowercase();
    [
        AgentKind::JobMatcher,
        AgentKind::ResumeCoach,
        AgentKind::InterviewPrep,
        AgentKind::General,
    ]
    .into_iter()
    .find(|kind| answer.contains(kind.as_str()))
}

#[derive(Clone)]
pub struct Supervisor {
    llm: Arc<dyn CompletionService>,
    system_prompt: String,
}

impl Supervisor {
    pub fn new(llm: Arc<dyn CompletionService>) -> Self {
        Self {
            llm,
            system_prompt: system_prompt(SUPERVISOR_INSTRUCTION),
        }
    }

    /// Routes `query`. Never fails: classification errors fall back to `General`.
    pub async fn route(&self, query: &str) -> AgentKind {
        if let Some(kind) = keyword_route(query) {
            debug!(agent = %kind, "Routed by keyword");
            return kind;
        }

        let prompt = SUPERVISOR_CLASSIFY_PROMPT.replace("{query}", query);
        let request = CompletionRequest {
            system: &self.system_prompt,
            prompt: &prompt,
            temperature: 0.1,
            max_tokens: 10,
        };

        match self.llm.complete(&request).await {
            Ok(answer) => {
                let kind = parse_classification(&answer).unwrap_or(AgentKind::General);
                debug!(agent = %kind, answer = %answer.trim(), "Routed by LLM classification");
                kind
            }
            Err(e) => {
                warn!("LLM routing failed, defaulting to general: {e}");
                AgentKind::General
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::mock::ScriptedCompletion;

    #[test]
    fn test_keyword_routing_table() {
        let cases = [
            ("hello", AgentKind::General),
            ("thank you!", AgentKind::General),
            ("Which jobs match my resume?", AgentKind::JobMatcher),
            ("Find me jobs for a Rust developer", AgentKind::JobMatcher),
            ("Can you review my resume and suggest improvements?", AgentKind::ResumeCoach),
            ("My resume needs work, can you help?", AgentKind::ResumeCoach),
            ("Help me prepare for an interview at Google", AgentKind::InterviewPrep),
            ("Generate interview questions for a data scientist role", AgentKind::InterviewPrep),
            ("What are the best jobs for a Python developer?", AgentKind::JobMatcher),
            ("any openings in Berlin?", AgentKind::JobMatcher),
        ];
        for (query, expected) in cases {
            assert_eq!(keyword_route(query), Some(expected), "{query}");
        }
    }

    #[test]
    fn test_short_query_matches_whole_words_only() {
        assert_eq!(keyword_route("find jobs now"), Some(AgentKind::JobMatcher));
        assert_eq!(keyword_route("ok"), Some(AgentKind::General));
    }

    #[test]
    fn test_greeting_in_long_query_does_not_short_circuit() {
        assert_eq!(
            keyword_route("hi, please review resume formatting for me"),
            Some(AgentKind::ResumeCoach)
        );
    }

    #[test]
    fn test_unclear_query_has_no_keyword_route() {
        assert_eq!(keyword_route("What should I learn next to grow my career?"), None);
    }

    #[test]
    fn test_parse_classification() {
        assert_eq!(parse_classification(" Resume_Coach\n"), Some(AgentKind::ResumeCoach));
        assert_eq!(parse_classification("job_matcher."), Some(AgentKind::JobMatcher));
        assert_eq!(parse_classification("no idea"), None);
    }

    #[tokio::test]
    async fn test_llm_fallback_used_for_unclear_query() {
        let llm = Arc::new(ScriptedCompletion::always("interview_prep"));
        let supervisor = Supervisor::new(llm.clone());

        let kind = supervisor.route("What should I learn next to grow my career?").await;
        assert_eq!(kind, AgentKind::InterviewPrep);
        assert_eq!(llm.calls(), 1);
        assert!(llm.prompts()[0].contains("What should I learn next"));
    }

    #[tokio::test]
    async fn test_keyword_route_skips_llm() {
        let llm = Arc::new(ScriptedCompletion::always("general"));
        let supervisor = Supervisor::new(llm.clone());

        assert_eq!(supervisor.route("review resume please").await, AgentKind::ResumeCoach);
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_llm_failure_defaults_to_general() {
        let llm = Arc::new(ScriptedCompletion::queue(vec![Err("down")]));
        let supervisor = Supervisor::new(llm);
        assert_eq!(
            supervisor.route("What should I learn next to grow my career?").await,
            AgentKind::General
        );

        let unknown = Supervisor::new(Arc::new(ScriptedCompletion::always("banana")));
        assert_eq!(
            unknown.route("What should I learn next to grow my career?").await,
            AgentKind::General
        );
    }
}
