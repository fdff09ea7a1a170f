//! CV Parser — turns extracted CV text into a `ParsedCv`.
//!
//! Two LLM calls: the main schema call (fatal on failure) and a narrow
//! `languages` call whose result overrides the main one only when it is a
//! non-empty, well-formed array.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::agents::prompts::{render, CV_PARSE_PROMPT_TEMPLATE, LANGUAGES_PROMPT_TEMPLATE};
use crate::agents::{Agent, StageFailure, StageResult};
use crate::errors::AgentError;
use crate::extraction::TextExtractor;
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::{strip_json_fences, LanguageModel};
use crate::models::{
    Cefr, DegreeLevel, Education, LanguageSkill, ParsedCv, PipelineState, UniversityEvaluation,
};

pub struct CvParserAgent {
    llm: Arc<dyn LanguageModel>,
    extractor: Arc<dyn TextExtractor>,
}

impl CvParserAgent {
    pub fn new(llm: Arc<dyn LanguageModel>, extractor: Arc<dyn TextExtractor>) -> Self {
        Self { llm, extractor }
    }

    /// Parses CV text. Only the main schema call can fail this method.
    pub async fn parse_text(&self, cv_text: &str) -> Result<ParsedCv, AgentError> {
        let prompt = build_prompt(CV_PARSE_PROMPT_TEMPLATE, cv_text);
        debug!("CV parse prompt: {} chars", prompt.len());

        let reply = self.llm.invoke_text(&prompt).await?;
        let mut parsed = parse_cv_reply(&reply)?;

        match self.extract_languages(cv_text).await {
            Ok(languages) if !languages.is_empty() => {
                debug!("Languages call returned {} entries", languages.len());
                parsed.languages = languages;
            }
            Ok(_) => debug!("Languages call returned nothing; keeping main-call languages"),
            Err(e) => warn!("Languages extraction failed, keeping main-call languages: {e}"),
        }

        Ok(parsed)
    }

    async fn extract_languages(&self, cv_text: &str) -> Result<Vec<LanguageSkill>, AgentError> {
        let prompt = build_prompt(LANGUAGES_PROMPT_TEMPLATE, cv_text);
        let reply = self.llm.invoke_text(&prompt).await?;
        parse_languages_reply(&reply)
    }

    async fn parse_state(&self, state: &PipelineState) -> Result<ParsedCv, AgentError> {
        let cv_text = self.extractor.extract(&state.cv_file_path).await?;
        let mut parsed = self.parse_text(&cv_text).await?;

        if let Some(email) = state
            .override_email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
        {
            parsed.email = Some(email.to_string());
        }

        Ok(parsed)
    }
}

#[async_trait]
impl Agent for CvParserAgent {
    fn name(&self) -> &'static str {
        "cv_parser"
    }

    async fn run(&self, mut state: PipelineState) -> StageResult {
        if state.stop_pipeline {
            debug!("Pipeline stopped, skipping CV parsing");
            return Ok(state);
        }

        match self.parse_state(&state).await {
            Ok(parsed) => {
                info!(
                    "Parsed CV for {}: {} skills, {} languages",
                    parsed.name.as_deref().unwrap_or("<unnamed>"),
                    parsed.skills.len(),
                    parsed.languages.len()
                );
                state.parsed_cv = Some(parsed);
                Ok(state)
            }
            Err(e) => Err(StageFailure::new(self.name(), e, state)),
        }
    }
}

fn build_prompt(template: &str, cv_text: &str) -> String {
    render(
        template,
        &[("json_only", JSON_ONLY_INSTRUCTION), ("cv_text", cv_text)],
    )
}

/// Parses the main-schema reply. Empty, non-JSON and non-object replies are
/// parse errors; everything else is coerced leniently.
pub fn parse_cv_reply(reply: &str) -> Result<ParsedCv, AgentError> {
    let cleaned = strip_json_fences(reply);
    if cleaned.is_empty() {
        return Err(AgentError::Parse("LLM returned an empty response".to_string()));
    }

    let value: Value = serde_json::from_str(cleaned)
        .map_err(|e| AgentError::Parse(format!("Invalid JSON from LLM after cleaning: {e}")))?;

    match value {
        Value::Object(obj) => Ok(coerce_parsed_cv(&obj)),
        other => Err(AgentError::Parse(format!(
            "Expected a JSON object from LLM, got {}",
            json_kind(&other)
        ))),
    }
}

/// Parses the languages reply: a bare array, or an object with a `languages`
/// array. Every element must name a language.
pub fn parse_languages_reply(reply: &str) -> Result<Vec<LanguageSkill>, AgentError> {
    let cleaned = strip_json_fences(reply);
    if cleaned.is_empty() {
        return Err(AgentError::Parse("LLM returned an empty response".to_string()));
    }

    let value: Value = serde_json::from_str(cleaned)
        .map_err(|e| AgentError::Parse(format!("Invalid languages JSON: {e}")))?;

    let items = match &value {
        Value::Array(items) => items,
        Value::Object(obj) => obj
            .get("languages")
            .and_then(Value::as_array)
            .ok_or_else(|| AgentError::Parse("Missing `languages` array".to_string()))?,
        other => {
            return Err(AgentError::Parse(format!(
                "Expected a languages array, got {}",
                json_kind(other)
            )))
        }
    };

    items
        .iter()
        .map(coerce_language)
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| AgentError::Parse("Languages array has malformed entries".to_string()))
}

fn coerce_parsed_cv(obj: &Map<String, Value>) -> ParsedCv {
    ParsedCv {
        name: opt_string(obj.get("name")),
        email: opt_string(obj.get("email")),
        skills: coerce_skills(obj.get("skills")),
        experience_years: opt_f64(obj.get("experience_years")).filter(|y| *y >= 0.0),
        education: coerce_education(obj.get("education")),
        highest_degree_level: opt_string(obj.get("highest_degree_level"))
            .map(|label| DegreeLevel::from_label(&label))
            .unwrap_or_default(),
        certifications: string_list(obj.get("certifications")),
        languages: obj
            .get("languages")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(coerce_language).collect())
            .unwrap_or_default(),
        university_evaluation: coerce_university_evaluation(obj.get("university_evaluation")),
    }
}

/// Skills stay strings; `{"subject": .., "score": ..}` objects are flattened
/// into `"subject: score"`.
fn coerce_skills(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return string_list(value);
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(obj) => {
                let subject = opt_string(obj.get("subject").or_else(|| obj.get("name")))?;
                match opt_f64(obj.get("score")) {
                    Some(score) => Some(format!("{subject}: {score}")),
                    None => Some(subject),
                }
            }
            other => opt_string(Some(other)),
        })
        .collect()
}

fn coerce_education(value: Option<&Value>) -> Vec<Education> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(obj) => Some(Education {
                institution: opt_string(obj.get("institution").or_else(|| obj.get("school"))),
                degree: opt_string(obj.get("degree")),
                field_of_study: opt_string(obj.get("field_of_study").or_else(|| obj.get("field"))),
                graduation_year: opt_f64(obj.get("graduation_year"))
                    .filter(|y| (1900.0..=2100.0).contains(y))
                    .map(|y| y as i32),
            }),
            Value::String(s) if !s.trim().is_empty() => Some(Education {
                institution: Some(s.trim().to_string()),
                ..Education::default()
            }),
            _ => None,
        })
        .filter(|edu| *edu != Education::default())
        .collect()
}

fn coerce_language(value: &Value) -> Option<LanguageSkill> {
    let obj = value.as_object()?;
    let language = opt_string(obj.get("language"))?;
    let proficiency_cefr = opt_string(obj.get("proficiency_cefr").or_else(|| obj.get("level")))
        .map(|label| Cefr::from_label(&label))
        .unwrap_or_default();
    Some(LanguageSkill {
        language,
        proficiency_cefr,
    })
}

fn coerce_university_evaluation(value: Option<&Value>) -> UniversityEvaluation {
    let Some(Value::Object(obj)) = value else {
        return UniversityEvaluation::default();
    };

    UniversityEvaluation {
        rank_tier: opt_string(obj.get("rank_tier")),
        estimated_score: opt_f64(obj.get("estimated_score")).map(|s| s.clamp(0.0, 100.0)),
        confidence: opt_f64(obj.get("confidence")).map(|c| c.clamp(0.0, 1.0)),
    }
}

fn opt_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn opt_f64(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(|v| opt_string(Some(v))).collect(),
        Some(v @ Value::String(_)) => opt_string(Some(v)).into_iter().collect(),
        _ => Vec::new(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
