use thiserror::Error;

use crate::llm_client::LlmError;

/// Agent-level error type.
/// Returned by stages whose failure must stop the pipeline; recoverable
/// degradations are logged inside the agents and never surface here.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Text extraction error: {0}")]
    Extraction(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AgentError {
    /// Short machine-readable code, used in pipeline reports.
    pub fn code(&self) -> &'static str {
        match self {
            AgentError::Parse(_) => "PARSE_ERROR",
            AgentError::Validation(_) => "VALIDATION_ERROR",
            AgentError::Extraction(_) => "EXTRACTION_ERROR",
            AgentError::Llm(_) => "LLM_ERROR",
            AgentError::Io(_) => "IO_ERROR",
        }
    }
}
