//! Pipeline orchestrator.
//!
//! Flow: CV parsing → JD matching → interview questions.
//!
//! Stages run in order over one owned `PipelineState`. A stage failure is
//! logged, recorded in the report, and flips `stop_pipeline` so every later
//! stage passes the state through untouched.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::agents::{Agent, CvParserAgent, InterviewQuestionAgent, MatchingAgent};
use crate::extraction::TextExtractor;
use crate::llm_client::LanguageModel;
use crate::models::PipelineState;

pub use crate::agents::{StageFailure, StageResult};

/// Outcome of a single pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub state: PipelineState,
    /// `"<stage>: <CODE>: <message>"` per failed stage.
    pub failures: Vec<String>,
}

impl PipelineReport {
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty() && !self.state.stop_pipeline
    }
}

pub struct Pipeline {
    stages: Vec<Box<dyn Agent>>,
}

impl Pipeline {
    /// The standard three-stage pipeline sharing one model and extractor.
    pub fn new(llm: Arc<dyn LanguageModel>, extractor: Arc<dyn TextExtractor>) -> Self {
        Self::with_stages(vec![
            Box::new(CvParserAgent::new(llm.clone(), extractor)),
            Box::new(MatchingAgent::new(llm.clone())),
            Box::new(InterviewQuestionAgent::new(llm)),
        ])
    }

    pub fn with_stages(stages: Vec<Box<dyn Agent>>) -> Self {
        Self { stages }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub async fn run(&self, state: PipelineState) -> PipelineReport {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline", %run_id);

        async move {
            let started_at = Utc::now();
            info!(
                "Pipeline started for {} against {} job descriptions",
                state.cv_file_path.display(),
                state.jd_list.len()
            );

            let mut state = state;
            let mut failures = Vec::new();

            for stage in &self.stages {
                state = match stage.run(state).await {
                    Ok(next) => next,
                    Err(StageFailure { stage, source, state }) => {
                        error!("Stage {stage} failed: {source}");
                        failures.push(format!("{stage}: {}: {source}", source.code()));
                        let mut stopped = *state;
                        stopped.stop_pipeline = true;
                        stopped
                    }
                };
            }

            let finished_at = Utc::now();
            info!(
                "Pipeline finished in {}ms ({} failures)",
                (finished_at - started_at).num_milliseconds(),
                failures.len()
            );

            PipelineReport {
                run_id,
                started_at,
                finished_at,
                state,
                failures,
            }
        }
        .instrument(span)
        .await
    }
}
