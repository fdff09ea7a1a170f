// Domain records exchanged between the agents.

pub mod candidate;
pub mod interview;
pub mod job;
pub mod state;

pub use candidate::{Cefr, DegreeLevel, Education, LanguageSkill, ParsedCv, UniversityEvaluation};
pub use interview::QaPair;
pub use job::{parse_job_descriptions, JobDescription, MatchedJd, SkillsRequired};
pub use state::PipelineState;
