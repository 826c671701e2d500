// Shared prompt fragments used by more than one agent.
// Each module that calls the LLM keeps its own prompts.rs alongside it.

/// Base persona prepended to every agent system prompt.
pub const CAREER_ASSISTANT_PERSONA: &str = "\
    You are an experienced career advisor and technical recruiter. \
    You give specific, honest, actionable guidance grounded only in the documents provided. \
    Never invent employers, dates, skills or requirements that are not in the context.";

/// Formatting rule shared by the long-form agents.
pub const MARKDOWN_RESPONSE_INSTRUCTION: &str = "\
    Format your answer in Markdown with clear headings and bullet points.";

/// Joins the persona with an agent-specific instruction block.
pub fn system_prompt(agent_instruction: &str) -> String {
    format!("{CAREER_ASSISTANT_PERSONA}\n\n{agent_instruction}")
}
