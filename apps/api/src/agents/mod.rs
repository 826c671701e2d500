//! Chat agents: the supervisor routes each message to a specialist.

pub mod general;
pub mod handlers;
pub mod interview_prep;
pub mod prompts;
pub mod resume_coach;
pub mod supervisor;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::matching::{JobMatchRanker, MatchReport, MatchRequest};

pub use interview_prep::{InterviewCoach, InterviewPrepRequest};
pub use resume_coach::{ResumeCoach, ReviewRequest};
pub use supervisor::Supervisor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    JobMatcher,
    ResumeCoach,
    InterviewPrep,
    General,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::JobMatcher => "job_matcher",
            AgentKind::ResumeCoach => "resume_coach",
            AgentKind::InterviewPrep => "interview_prep",
            AgentKind::General => "general",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    pub resume_text: Option<String>,
    pub job_id: Option<String>,
    pub job_description: Option<String>,
    pub company_info: Option<String>,
    pub n_results: Option<usize>,
    pub min_match_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub agent: AgentKind,
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_report: Option<MatchReport>,
}

/// Everything needed to answer a chat message.
#[derive(Clone)]
pub struct Assistant {
    pub supervisor: Supervisor,
    pub ranker: JobMatchRanker,
    pub resume_coach: ResumeCoach,
    pub interview_coach: InterviewCoach,
}

fn missing_resume_reply(agent: AgentKind) -> &'static str {
    match agent {
        AgentKind::JobMatcher => {
            "Please upload your resume first so I can find jobs that match your background."
        }
        AgentKind::ResumeCoach => "Please upload your resume so I can review it.",
        AgentKind::InterviewPrep => {
            "Please upload your resume so I can tailor your interview preparation."
        }
        AgentKind::General => "Please upload your resume to get started.",
    }
}

impl Assistant {
    /// Routes `request.query` and answers it with the chosen agent.
    ///
    /// `n_results` and `min_match_score` must already be validated.
    pub async fn chat(
        &self,
        request: ChatRequest,
        n_results: usize,
        min_match_score: f64,
    ) -> Result<ChatResponse, AppError> {
        let agent = self.supervisor.route(&request.query).await;
        info!(%agent, "Chat message routed");

        let reply = |response: String, match_report: Option<MatchReport>| ChatResponse {
            agent,
            response,
            match_report,
        };

        if agent == AgentKind::General {
            return Ok(reply(general::general_reply(&request.query).to_string(), None));
        }

        let Some(resume_text) = request.resume_text.filter(|r| !r.trim().is_empty()) else {
            return Ok(reply(missing_resume_reply(agent).to_string(), None));
        };

        match agent {
            AgentKind::JobMatcher => {
                let report = self
                    .ranker
                    .find_matches(&MatchRequest {
                        n_results,
                        min_match_score,
                        user_query: Some(request.query),
                        ..MatchRequest::new(resume_text, self.ranker.config())
                    })
                    .await?;
                Ok(reply(report.render_markdown(), Some(report)))
            }
            AgentKind::ResumeCoach => {
                let feedback = self
                    .resume_coach
                    .review(&ReviewRequest {
                        resume_text,
                        query: Some(request.query),
                        job_id: request.job_id,
                        job_description: request.job_description,
                        focus_areas: Vec::new(),
                    })
                    .await?;
                Ok(reply(feedback, None))
            }
            AgentKind::InterviewPrep => {
                let prep = self
                    .interview_coach
                    .prepare(&InterviewPrepRequest {
                        resume_text,
                        query: Some(request.query),
                        job_id: request.job_id,
                        job_description: request.job_description,
                        company_info: request.company_info,
                    })
                    .await?;
                Ok(reply(prep, None))
            }
            AgentKind::General => Ok(reply(
                general::general_reply(&request.query).to_string(),
                None,
            )),
        }
    }
}
