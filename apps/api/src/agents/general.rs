//! Canned replies for greetings, small talk and out-of-scope questions.
//! These never touch an LLM.

const GREETING: &str = "Hello! 👋 Welcome to your career assistant.

I can help you with:
🎯 **Job Matching** - find jobs that fit your skills and experience
📝 **Resume Review** - get feedback and optimisation tips
💼 **Interview Prep** - practise with personalised questions

What would you like to work on today?";

const HOW_ARE_YOU: &str = "I'm doing great, thanks for asking! 😊

I'm ready to help with your job search:
- Finding matching jobs
- Reviewing your resume
- Preparing for interviews

Just let me know!";

const THANKS: &str = "You're welcome! Ask any time you need something else. 😊";

const GOODBYE: &str = "Goodbye, and good luck with your job search! 🚀";

const OUT_OF_SCOPE: &str = "I only help with job searches, resumes and interviews, so I can't help with that topic.

I'd be happy to:
- Find jobs matching your skills
- Review and improve your resume
- Prepare you for interviews";

const CAPABILITIES: &str = "Here's what I can do:

🎯 **Job Matcher**
- Find jobs that semantically match your skills
- Explain each match with a score and evidence from your resume

📝 **Resume Coach**
- Give specific, actionable feedback
- Optimise for applicant tracking systems and recruiters

💼 **Interview Prep**
- Generate personalised questions
- Outline STAR answers from your own experience

Just ask naturally, like \"Find jobs for me\" or \"Review my resume\".";

const FALLBACK: &str = "I'm not sure how to help with that.

I specialise in:
• **Job matching** - try \"Find jobs that match my resume\"
• **Resume review** - try \"Review my resume\"
• **Interview prep** - try \"Help me prepare for an interview\"";

const GREETING_WORDS: &[&str] = &["hi", "hello", "hey", "morning", "evening", "afternoon", "howdy"];
const HOW_ARE_YOU_PHRASES: &[&str] = &["how are you", "whats up", "what's up", "how r u"];
const GOODBYE_PHRASES: &[&str] = &["bye", "goodbye", "see you"];
const OUT_OF_SCOPE_WORDS: &[&str] = &["weather", "news", "sports", "movie", "recipe", "game"];
const CAPABILITY_PHRASES: &[&str] = &[
    "what can you do",
    "help me",
    "what do you",
    "capabilities",
    "features",
];

/// Lowercased words of `text` with surrounding punctuation removed.
pub(crate) fn words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

/// Picks the canned reply for a query routed to the general agent.
pub fn general_reply(query: &str) -> &'static str {
    let lower = query.to_lowercase();
    let tokens = words(query);
    let has_word = |list: &[&str]| tokens.iter().any(|t| list.contains(&t.as_str()));
    let has_phrase = |list: &[&str]| list.iter().any(|p| lower.contains(p));

    if has_word(GREETING_WORDS) {
        GREETING
    } else if has_phrase(HOW_ARE_YOU_PHRASES) {
        HOW_ARE_YOU
    } else if lower.contains("thank") {
        THANKS
    } else if has_phrase(GOODBYE_PHRASES) {
        GOODBYE
    } else if has_word(OUT_OF_SCOPE_WORDS) {
        OUT_OF_SCOPE
    } else if has_phrase(CAPABILITY_PHRASES) {
        CAPABILITIES
    } else {
        FALLBACK
    }
}
