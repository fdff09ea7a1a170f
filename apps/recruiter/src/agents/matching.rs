//! Matching. Scores the candidate against every JD and keeps the best one.
//!
//! Algorithm, per JD:
//! 1. Normalize CV and JD subject keys, dropping malformed tokens.
//! 2. Priority subject = highest required score (first listed on ties).
//! 3. For each JD subject the CV also has: pct = 0 below the requirement,
//!    else min(actual / required × 100, 100); weight 2.0 for the priority
//!    subject, 1.0 otherwise.
//! 4. subject_score = min(weighted_avg × 0.7, 70). No overlap ⇒ JD skipped.
//! 5. extras_score = LLM 0–100 × 0.3 (cap 30), only for the declared target
//!    position; any failure counts as 0.
//! 6. total = round(subject_score + extras_score, 2). A later JD replaces the
//!    running best only with a strictly greater total.
//!
//! JDs are scored concurrently; the reduction runs in list order afterwards.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::agents::normalizer::{parse_subject_scores, SubjectScores};
use crate::agents::prompts::{render, EXTRAS_SCORE_PROMPT_TEMPLATE, JUSTIFICATION_PROMPT_TEMPLATE};
use crate::agents::{Agent, StageResult};
use crate::errors::AgentError;
use crate::llm_client::prompts::BARE_VALUE_INSTRUCTION;
use crate::llm_client::{strip_json_fences, LanguageModel};
use crate::models::{JobDescription, MatchedJd, ParsedCv, PipelineState};

const PRIORITY_WEIGHT: f64 = 2.0;
const STANDARD_WEIGHT: f64 = 1.0;
const SUBJECT_SHARE: f64 = 0.7;
const SUBJECT_CAP: f64 = 70.0;
const EXTRAS_SHARE: f64 = 0.3;
const EXTRAS_CAP: f64 = 30.0;

/// Rule-based part of a JD score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectMatch {
    pub priority_subject: String,
    pub overlapping_subjects: usize,
    pub weighted_average: f64,
    pub subject_score: f64,
}

/// Score breakdown for one JD that had at least one overlapping subject.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JdScore {
    /// Position of the JD in the input list.
    pub index: usize,
    pub position: String,
    pub skills_required: Vec<String>,
    pub priority_subject: String,
    pub subject_score: f64,
    pub extras_score: f64,
    pub total_score: f64,
}

pub struct MatchingAgent {
    llm: Arc<dyn LanguageModel>,
}

impl MatchingAgent {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// Scores every JD. Skipped JDs (undecodable requirements, no overlap)
    /// are absent from the result; the rest keep input order.
    pub async fn score_all(
        &self,
        cv: &ParsedCv,
        jds: &[JobDescription],
        position_applied_for: Option<&str>,
    ) -> Vec<JdScore> {
        let cv_scores = parse_subject_scores(&cv.skills);
        let profile = profile_json(cv);

        let scoring = jds.iter().enumerate().map(|(index, jd)| {
            self.score_jd(index, jd, &cv_scores, &profile, position_applied_for)
        });

        join_all(scoring).await.into_iter().flatten().collect()
    }

    /// Picks the best JD and asks for a justification.
    /// Always returns a record; the fallback when nothing matched.
    pub async fn select_best(
        &self,
        cv: &ParsedCv,
        jds: &[JobDescription],
        position_applied_for: Option<&str>,
    ) -> MatchedJd {
        let scores = self.score_all(cv, jds, position_applied_for).await;

        let Some(best) = pick_best(&scores) else {
            info!("No matched JD found");
            return MatchedJd::fallback(position_applied_for);
        };

        let match_score = to_match_score(best.total_score);
        info!(
            "Best match: {} (total_score={:.2}, match_score={})",
            best.position, best.total_score, match_score
        );

        let jd = &jds[best.index];
        let justification = self.justify(best, match_score, &profile_json(cv)).await;

        MatchedJd {
            position: jd.position.clone(),
            skills_required: best.skills_required.clone(),
            level: jd.level.clone().unwrap_or_else(|| "Unknown".to_string()),
            match_score,
            justification,
        }
    }

    async fn score_jd(
        &self,
        index: usize,
        jd: &JobDescription,
        cv_scores: &SubjectScores,
        profile: &str,
        position_applied_for: Option<&str>,
    ) -> Option<JdScore> {
        let skills_required = match jd.skills_required.decode() {
            Ok(skills) => skills,
            Err(e) => {
                error!("Failed to decode skills_required for JD '{}': {e}", jd.position);
                return None;
            }
        };

        let jd_scores = parse_subject_scores(&skills_required);
        let Some(subjects) = compute_subject_score(cv_scores, &jd_scores) else {
            debug!("JD '{}' has no overlapping subjects, skipped", jd.position);
            return None;
        };

        let extras_score = if is_target_position(&jd.position, position_applied_for) {
            self.extras_score(profile).await
        } else {
            0.0
        };

        let total_score = round2(subjects.subject_score + extras_score);
        debug!(
            "JD '{}': priority={}, subject={:.2}, extras={:.2}, total={:.2}",
            jd.position, subjects.priority_subject, subjects.subject_score, extras_score, total_score
        );

        Some(JdScore {
            index,
            position: jd.position.clone(),
            skills_required,
            priority_subject: subjects.priority_subject,
            subject_score: subjects.subject_score,
            extras_score,
            total_score,
        })
    }

    /// LLM-judged extras (awards, projects, motivation) scaled into 0–30.
    async fn extras_score(&self, profile: &str) -> f64 {
        let prompt = render(
            EXTRAS_SCORE_PROMPT_TEMPLATE,
            &[("bare_value", BARE_VALUE_INSTRUCTION), ("profile_json", profile)],
        );

        let raw = match self.llm.invoke_text(&prompt).await {
            Ok(reply) => parse_llm_score(&reply),
            Err(e) => Err(AgentError::from(e)),
        };

        match raw {
            Ok(score) => (score * EXTRAS_SHARE).min(EXTRAS_CAP),
            Err(e) => {
                warn!("Extras score failed, counting 0: {e}");
                0.0
            }
        }
    }

    async fn justify(&self, best: &JdScore, match_score: u8, profile: &str) -> String {
        let requirements = serde_json::to_string_pretty(&best.skills_required).unwrap_or_default();
        let score = match_score.to_string();
        let prompt = render(
            JUSTIFICATION_PROMPT_TEMPLATE,
            &[
                ("match_score", score.as_str()),
                ("requirements_json", requirements.as_str()),
                ("position", best.position.as_str()),
                ("profile_json", profile),
            ],
        );

        match self.llm.invoke_text(&prompt).await {
            Ok(reply) => reply.trim().to_string(),
            Err(e) => {
                warn!("Justification call failed, leaving it empty: {e}");
                String::new()
            }
        }
    }
}

#[async_trait]
impl Agent for MatchingAgent {
    fn name(&self) -> &'static str {
        "matching"
    }

    async fn run(&self, mut state: PipelineState) -> StageResult {
        if state.stop_pipeline {
            debug!("Pipeline stopped, skipping matching");
            return Ok(state);
        }

        let position = state.position_applied_for.as_deref();
        let matched = match &state.parsed_cv {
            None => {
                warn!("No parsed CV found");
                MatchedJd::fallback(position)
            }
            Some(_) if state.jd_list.is_empty() => {
                warn!("No job descriptions available");
                MatchedJd::fallback(position)
            }
            Some(cv) => self.select_best(cv, &state.jd_list, position).await,
        };

        state.matched_jd = Some(matched);
        Ok(state)
    }
}

/// Weighted-priority subject score. `None` when the CV and the JD share no
/// subject.
pub fn compute_subject_score(cv: &SubjectScores, jd: &SubjectScores) -> Option<SubjectMatch> {
    let (priority_subject, _) = jd.top()?;

    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    let mut overlapping_subjects = 0;

    for (subject, required) in jd.iter() {
        let Some(actual) = cv.get(subject) else {
            continue;
        };
        let weight = if subject == priority_subject {
            PRIORITY_WEIGHT
        } else {
            STANDARD_WEIGHT
        };
        weighted_sum += subject_percentage(actual, required) * weight;
        weight_total += weight;
        overlapping_subjects += 1;
    }

    if weight_total == 0.0 {
        return None;
    }

    let weighted_average = weighted_sum / weight_total;
    Some(SubjectMatch {
        priority_subject: priority_subject.to_string(),
        overlapping_subjects,
        weighted_average,
        subject_score: (weighted_average * SUBJECT_SHARE).min(SUBJECT_CAP),
    })
}

/// 0 below the requirement, else the attained share capped at 100.
/// A non-positive requirement is always fully met.
pub fn subject_percentage(actual: f64, required: f64) -> f64 {
    if actual < required {
        0.0
    } else if required <= 0.0 {
        100.0
    } else {
        (actual / required * 100.0).min(100.0)
    }
}

/// Earliest JD with the highest total; later ties do not replace it.
pub fn pick_best(scores: &[JdScore]) -> Option<&JdScore> {
    scores.iter().fold(None, |best, score| match best {
        Some(current) if score.total_score <= current.total_score => Some(current),
        _ => Some(score),
    })
}

/// Parses a bare 0–100 score reply, clamping out-of-range values.
pub fn parse_llm_score(reply: &str) -> Result<f64, AgentError> {
    let cleaned = strip_json_fences(reply)
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | '.' | '`'));

    match cleaned.parse::<f64>() {
        Ok(score) if score.is_finite() => Ok(score.clamp(0.0, 100.0)),
        _ => Err(AgentError::Parse(format!(
            "Expected a bare number, got '{cleaned}'"
        ))),
    }
}

/// Integer match score in 0–100 (truncated).
pub fn to_match_score(total_score: f64) -> u8 {
    if total_score.is_nan() {
        return 0;
    }
    total_score.clamp(0.0, 100.0).trunc() as u8
}

fn is_target_position(position: &str, applied_for: Option<&str>) -> bool {
    match applied_for.map(str::trim) {
        Some(target) if !target.is_empty() => position.trim().to_lowercase() == target.to_lowercase(),
        _ => false,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn profile_json(cv: &ParsedCv) -> String {
    serde_json::to_string_pretty(cv).unwrap_or_default()
}
