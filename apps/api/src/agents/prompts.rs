/// Classification prompt for queries the keyword rules could not place.
/// Placeholder: {query}
pub const SUPERVISOR_CLASSIFY_PROMPT: &str = r#"Classify this query into exactly ONE category.

Query: "{query}"

job_matcher: finding jobs, job search, job recommendations, which jobs to apply for
resume_coach: resume review, resume improvement, resume feedback
interview_prep: interview questions, interview preparation
general: greetings, casual chat, anything out of scope

Answer with the category name only:"#;

pub const SUPERVISOR_INSTRUCTION: &str = "\
TASK: Route the user's message to the right specialist. You never answer the \
question yourself; you reply with a single category name.";

pub const RESUME_COACH_INSTRUCTION: &str = "\
TASK: Review the resume and give specific, actionable improvements.

Cover:
1. Structure and formatting: section order, length, ATS readability
2. Content: quantified achievements, action verbs, relevance of each bullet
3. Skills: gaps against the target job when one is provided
4. Rewrites: show before/after examples for the weakest bullets

Quote the resume when pointing at a problem. If a target job is given, \
prioritise the keywords and requirements it emphasises.";

pub const INTERVIEW_PREP_INSTRUCTION: &str = "\
TASK: Prepare the candidate for an interview for the target job.

Provide:
1. Technical questions drawn from the job requirements, matched to the candidate's skills
2. Behavioral questions with STAR answer outlines that use real experiences from the resume
3. Company-specific questions when company information is available
4. Weak spots the interviewer is likely to probe, with advice on addressing them
5. Good questions for the candidate to ask the interviewer";

/// Resume-only preparation when no job is selected.
/// Placeholders: {resume}, {query}
pub const GENERAL_INTERVIEW_PREP_PROMPT: &str = "\
Produce interview preparation based ONLY on the candidate's resume. No job description \
is available, so target roles that fit their background and do not assume a specific \
company or title.

=== CANDIDATE'S RESUME ===
{resume}

=== USER REQUEST ===
{query}

Include:
1. **Interview Strategy**: strengths to lead with for their experience level and field
2. **Common Questions**: questions typical for their seniority and industry
3. **Technical Questions**: based on the technologies named in the resume
4. **Behavioral Questions (STAR)**: with stories taken from their actual roles and projects
5. **Questions to Ask Interviewers**: suited to their career stage";

pub const DEFAULT_REVIEW_QUERY: &str =
    "Please review my resume and give comprehensive feedback on structure, content, and areas for improvement.";

pub const DEFAULT_INTERVIEW_QUERY: &str =
    "Help me prepare for this interview with tailored technical and behavioral questions.";
