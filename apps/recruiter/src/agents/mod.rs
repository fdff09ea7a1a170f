//! Recruitment agents.
//!
//! ```text
//! CV file
//!    │
//!    ▼
//! ┌──────────────┐
//! │  CV Parser   │  → ParsedCv (main schema call + languages call)
//! └──────────────┘
//!    │
//!    ▼
//! ┌──────────────┐
//! │   Matching   │  → MatchedJd (subject overlap + LLM extras + justification)
//! └──────────────┘
//!    │
//!    ▼
//! ┌──────────────┐
//! │  Interview   │  → Vec<QaPair> (count scaled by match score)
//! └──────────────┘
//! ```
//!
//! Every agent takes the `PipelineState` by value and hands it back. When
//! `stop_pipeline` is already set the state passes through untouched.

use async_trait::async_trait;
use thiserror::Error;

use crate::errors::AgentError;
use crate::models::PipelineState;

pub mod cv_parser;
pub mod interview;
pub mod matching;
pub mod normalizer;
pub mod prompts;

pub use cv_parser::CvParserAgent;
pub use interview::InterviewQuestionAgent;
pub use matching::MatchingAgent;

/// A stage failure. Hands the state back so the caller can mark it stopped.
#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
pub struct StageFailure {
    pub stage: &'static str,
    #[source]
    pub source: AgentError,
    pub state: Box<PipelineState>,
}

impl StageFailure {
    pub fn new(stage: &'static str, source: AgentError, state: PipelineState) -> Self {
        Self {
            stage,
            source,
            state: Box::new(state),
        }
    }
}

pub type StageResult = Result<PipelineState, StageFailure>;

#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, state: PipelineState) -> StageResult;
}
