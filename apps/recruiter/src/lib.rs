//! CV screening pipeline: parse a CV, match it against job descriptions,
//! and draft interview questions for the best match.

pub mod agents;
pub mod cli;
pub mod config;
pub mod errors;
pub mod extraction;
pub mod llm_client;
pub mod models;
pub mod pipeline;

pub use errors::AgentError;
pub use pipeline::{Pipeline, PipelineReport};
