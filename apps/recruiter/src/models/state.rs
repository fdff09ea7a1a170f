use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::{JobDescription, MatchedJd, ParsedCv, QaPair};

/// Context handed from stage to stage by value.
/// Once `stop_pipeline` is set, every later stage returns it untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineState {
    pub cv_file_path: PathBuf,
    pub position_applied_for: Option<String>,
    /// Replaces the email found on the CV (upload form field).
    pub override_email: Option<String>,
    pub stop_pipeline: bool,
    pub parsed_cv: Option<ParsedCv>,
    pub jd_list: Vec<JobDescription>,
    pub matched_jd: Option<MatchedJd>,
    pub interview_questions: Vec<QaPair>,
}

impl PipelineState {
    pub fn new(cv_file_path: impl Into<PathBuf>, jd_list: Vec<JobDescription>) -> Self {
        Self {
            cv_file_path: cv_file_path.into(),
            jd_list,
            ..Self::default()
        }
    }

    pub fn with_position(mut self, position: impl Into<String>) -> Self {
        self.position_applied_for = Some(position.into());
        self
    }

    pub fn with_override_email(mut self, email: impl Into<String>) -> Self {
        self.override_email = Some(email.into());
        self
    }
}
