/// Agent instruction for scoring a resume against job postings.
pub const JOB_MATCHER_INSTRUCTION: &str = "\
TASK: Compare the candidate's COMPLETE resume with each job posting provided and give an \
evidence-based assessment.

Review every resume section: skills, every role in the work history, education and \
certifications, projects, and the summary if present.

For each job compute an Overall Match Score from these weights:
- Skills match (30%): required skills present in the resume, including transferable ones
- Experience level (25%): years and seniority compared with the role
- Education and qualifications (15%)
- Project and portfolio relevance (15%)
- Overall fit (15%): domain, career trajectory, transferable experience

Scoring guide: 85-95% excellent, 75-84% good with minor gaps, 65-74% moderate, \
50-64% weak, below 50% poor.

OUTPUT FORMAT for each job:

### Job #[n]: [Job Title] at [Company]
**Overall Match Score:** [X]%

**Why You're a Great Fit:** three numbered points, each quoting the resume as evidence.
**Skills to Highlight:** bullet list.
**Potential Gaps:** bullet list quoting the job description.
**Recommendation:** one sentence (Apply / Consider / Skip and why).

Quote the resume and job text for every claim. Never invent qualifications.";

/// Appended to the single-candidate context. Forces the parseable score line.
pub const SCORE_INSTRUCTION: &str = "

Analyze the COMPLETE resume against this job. Calculate the Overall Match Score considering:
- Skills match (30%), Experience level (25%), Education (15%), Projects (15%), Overall fit (15%)

You MUST include: **Overall Match Score:** [X]%

Be thorough: check ALL resume sections against the job requirements.";

/// User question for a single-job deep dive. Placeholder: {title}
pub const ANALYZE_JOB_QUESTION: &str =
    "Analyze my fit for the {title} position in detail, including how to close any gaps.";
