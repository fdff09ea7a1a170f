//! Interview questions. One subject call, one generation call, then a parser
//! that never fails (strict JSON first, enumerated lines as the fallback).

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::agents::prompts::{
    render, GENERIC_SUBJECT_GUIDANCE, INTERVIEW_QUESTIONS_PROMPT_TEMPLATE,
    INTERVIEW_SUBJECT_PROMPT_TEMPLATE, SUBJECT_GUIDANCE_TEMPLATE,
};
use crate::agents::{Agent, StageResult};
use crate::llm_client::prompts::{BARE_VALUE_INSTRUCTION, JSON_ONLY_INSTRUCTION};
use crate::llm_client::{strip_json_fences, LanguageModel};
use crate::models::{MatchedJd, ParsedCv, PipelineState, QaPair};

const DEFAULT_CANDIDATE_NAME: &str = "học sinh";
const DEFAULT_MATCH_SCORE: u8 = 80;
const MIN_EXPECTED_QUESTIONS: usize = 3;

/// Number of questions for a match score: ≥90 → 8, 75–89 → 6, else 4.
pub fn question_count(match_score: u8) -> usize {
    match match_score {
        90..=u8::MAX => 8,
        75..=89 => 6,
        _ => 4,
    }
}

pub struct InterviewQuestionAgent {
    llm: Arc<dyn LanguageModel>,
}

impl InterviewQuestionAgent {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// Generates Q&A pairs. Missing inputs fall back to defaults and any LLM
    /// failure yields an empty list.
    pub async fn generate(&self, cv: Option<&ParsedCv>, matched: Option<&MatchedJd>) -> Vec<QaPair> {
        let name = cv
            .and_then(|c| c.name.as_deref())
            .unwrap_or(DEFAULT_CANDIDATE_NAME);
        let match_score = matched.map(|m| m.match_score).unwrap_or(DEFAULT_MATCH_SCORE);
        let position = matched.map(|m| m.position.as_str()).unwrap_or("");

        let subject = self.extract_subject(cv, matched).await;
        let count = question_count(match_score);
        debug!(
            "Candidate: {name}, subject: {subject:?}, match_score: {match_score}, questions: {count}"
        );

        let prompt = build_questions_prompt(name, position, &subject, count);
        let reply = match self.llm.invoke_text(&prompt).await {
            Ok(reply) if !reply.trim().is_empty() => reply,
            Ok(_) => {
                warn!("Question generation returned an empty response");
                return Vec::new();
            }
            Err(e) => {
                warn!("Question generation failed: {e}");
                return Vec::new();
            }
        };

        let pairs = parse_qa_pairs(&reply);
        info!("Generated {} Q&A pairs", pairs.len());
        if pairs.len() < MIN_EXPECTED_QUESTIONS {
            warn!(
                "Only {} questions generated (expected at least {MIN_EXPECTED_QUESTIONS})",
                pairs.len()
            );
        }
        pairs
    }

    /// Asks for one bare subject word. Empty on any failure.
    async fn extract_subject(&self, cv: Option<&ParsedCv>, matched: Option<&MatchedJd>) -> String {
        let profile = cv
            .and_then(|c| serde_json::to_string_pretty(c).ok())
            .unwrap_or_else(|| "{}".to_string());
        let jd = matched
            .and_then(|m| serde_json::to_string_pretty(m).ok())
            .unwrap_or_else(|| "{}".to_string());

        let prompt = render(
            INTERVIEW_SUBJECT_PROMPT_TEMPLATE,
            &[
                ("bare_value", BARE_VALUE_INSTRUCTION),
                ("jd_json", jd.as_str()),
                ("profile_json", profile.as_str()),
            ],
        );

        match self.llm.invoke_text(&prompt).await {
            Ok(reply) => {
                let subject = clean_subject(&reply);
                info!("Interview subject: {subject:?}");
                subject
            }
            Err(e) => {
                warn!("Subject extraction failed: {e}");
                String::new()
            }
        }
    }
}

#[async_trait]
impl Agent for InterviewQuestionAgent {
    fn name(&self) -> &'static str {
        "interview_questions"
    }

    async fn run(&self, mut state: PipelineState) -> StageResult {
        if state.stop_pipeline {
            debug!("Pipeline stopped, skipping question generation");
            return Ok(state);
        }

        state.interview_questions = self
            .generate(state.parsed_cv.as_ref(), state.matched_jd.as_ref())
            .await;
        Ok(state)
    }
}

fn build_questions_prompt(name: &str, position: &str, subject: &str, count: usize) -> String {
    let subject_guidance = if subject.is_empty() {
        GENERIC_SUBJECT_GUIDANCE.to_string()
    } else {
        render(SUBJECT_GUIDANCE_TEMPLATE, &[("subject", subject)])
    };

    let count = count.to_string();
    render(
        INTERVIEW_QUESTIONS_PROMPT_TEMPLATE,
        &[
            ("json_only", JSON_ONLY_INSTRUCTION),
            ("question_count", count.as_str()),
            ("subject_guidance", subject_guidance.as_str()),
            ("position", position),
            ("name", name),
        ],
    )
}

/// Trims quotes and punctuation and keeps the first word.
pub fn clean_subject(reply: &str) -> String {
    strip_json_fences(reply)
        .trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '*'))
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .find(|token| !token.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Parses Q&A pairs from a model reply. Never fails; an unusable reply
/// yields an empty list.
pub fn parse_qa_pairs(reply: &str) -> Vec<QaPair> {
    let cleaned = strip_json_fences(reply);

    let pairs = parse_json_pairs(cleaned);
    if !pairs.is_empty() {
        debug!("Parsed reply as Q&A JSON");
        return pairs;
    }

    warn!("Q&A reply is not a usable JSON array, falling back to line parsing");
    parse_enumerated_pairs(cleaned)
}

fn parse_json_pairs(text: &str) -> Vec<QaPair> {
    let Ok(Value::Array(items)) = serde_json::from_str::<Value>(text) else {
        return Vec::new();
    };

    items.iter().filter_map(json_pair).collect()
}

fn json_pair(item: &Value) -> Option<QaPair> {
    let question = item.get("question")?.as_str()?.trim();
    if question.is_empty() {
        return None;
    }

    let answers = match item.get("answers") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(values)) => values
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()?,
        Some(_) => return None,
    };

    Some(QaPair {
        question: question.to_string(),
        answers,
    })
}

fn parse_enumerated_pairs(text: &str) -> Vec<QaPair> {
    let mut pairs = Vec::new();
    let mut current: Option<QaPair> = None;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(question) = strip_question_marker(line) {
            if question.is_empty() {
                continue;
            }
            if let Some(done) = current.take() {
                pairs.push(done);
            }
            current = Some(QaPair {
                question: question.to_string(),
                answers: Vec::new(),
            });
        } else if let Some(open) = current.as_mut() {
            open.answers.push(line.to_string());
        }
    }

    pairs.extend(current);
    pairs
}

/// Strips a leading `1) `, `1. `, `1- `, `- `, `* ` or `• ` marker.
/// `None` when the line does not start a new question.
fn strip_question_marker(line: &str) -> Option<&str> {
    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    let rest = if digits > 0 {
        line[digits..].strip_prefix(['.', ')', '-'])?
    } else {
        line.strip_prefix(['-', '*', '•'])?
    };
    rest.starts_with(char::is_whitespace).then(|| rest.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedLlm;

    const SUBJECT_NEEDLE: &str = "single most appropriate major subject";
    const QUESTIONS_NEEDLE: &str = "Vietnamese-language interview questions";

    fn matched(score: u8) -> MatchedJd {
        MatchedJd {
            position: "Chuyên Toán".to_string(),
            skills_required: vec!["Toán: 8".to_string()],
            level: "Mid".to_string(),
            match_score: score,
            justification: "ok".to_string(),
        }
    }

    fn agent(llm: ScriptedLlm) -> (InterviewQuestionAgent, Arc<ScriptedLlm>) {
        let llm = Arc::new(llm);
        (InterviewQuestionAgent::new(llm.clone()), llm)
    }

    #[test]
    fn test_question_count_thresholds() {
        assert_eq!(question_count(92), 8);
        assert_eq!(question_count(90), 8);
        assert_eq!(question_count(89), 6);
        assert_eq!(question_count(80), 6);
        assert_eq!(question_count(75), 6);
        assert_eq!(question_count(74), 4);
        assert_eq!(question_count(50), 4);
        assert_eq!(question_count(0), 4);
    }

    #[test]
    fn test_parse_strict_json() {
        let reply = r#"[
            {"question": "Chứng minh √2 là số vô tỉ?", "answers": ["Phản chứng"]},
            {"question": "Định luật Newton thứ hai?", "answers": []},
            {"question": "", "answers": ["bỏ"]},
            {"question": "Sai kiểu?", "answers": [1, 2]},
            {"question": "Không có đáp án?"}
        ]"#;
        let pairs = parse_qa_pairs(reply);
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0].answers, vec!["Phản chứng"]);
        assert!(pairs[1].answers.is_empty());
        assert_eq!(pairs[2].question, "Không có đáp án?");
    }

    #[test]
    fn test_parse_fenced_json() {
        let reply = "```json\n[{\"question\": \"Q?\", \"answers\": [\"A\"]}]\n```";
        let pairs = parse_qa_pairs(reply);
        assert_eq!(pairs, vec![QaPair {
            question: "Q?".to_string(),
            answers: vec!["A".to_string()],
        }]);
    }

    #[test]
    fn test_fallback_on_enumerated_lines() {
        let pairs = parse_qa_pairs("1) What is X?\nAnswer A\n2) What is Y?\nAnswer B");
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].question, "What is X?");
        assert_eq!(pairs[0].answers, vec!["Answer A"]);
        assert_eq!(pairs[1].question, "What is Y?");
        assert_eq!(pairs[1].answers, vec!["Answer B"]);
    }

    #[test]
    fn test_fallback_marker_styles() {
        let reply = "Đây là câu hỏi:\n1. Câu một?\n   đáp án 1\n2- Câu hai?\n* Câu ba?\n• Câu bốn?\n- Câu năm?\n\nđáp án 5";
        let pairs = parse_qa_pairs(reply);
        let questions: Vec<_> = pairs.iter().map(|p| p.question.as_str()).collect();
        assert_eq!(questions, vec!["Câu một?", "Câu hai?", "Câu ba?", "Câu bốn?", "Câu năm?"]);
        assert_eq!(pairs[0].answers, vec!["đáp án 1"]);
        assert_eq!(pairs[4].answers, vec!["đáp án 5"]);
    }

    #[test]
    fn test_fallback_when_json_has_no_usable_pairs() {
        let reply = "[{\"q\": \"x\"}]\n1) Real question?\nanswer";
        let pairs = parse_qa_pairs(reply);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].question, "Real question?");
    }

    #[test]
    fn test_unusable_reply_yields_empty() {
        assert!(parse_qa_pairs("Xin lỗi, tôi không thể giúp.").is_empty());
        assert!(parse_qa_pairs("").is_empty());
        assert!(parse_qa_pairs("{\"question\": \"Q\"}").is_empty());
    }

    #[test]
    fn test_marker_requires_whitespace() {
        assert_eq!(strip_question_marker("12. Câu hỏi"), Some("Câu hỏi"));
        assert_eq!(strip_question_marker("• Câu hỏi"), Some("Câu hỏi"));
        assert_eq!(strip_question_marker("2024 là năm"), None);
        assert_eq!(strip_question_marker("3.14 là số pi"), None);
        assert_eq!(strip_question_marker("-5 độ"), None);
        assert_eq!(strip_question_marker("Câu hỏi"), None);
    }

    #[test]
    fn test_clean_subject_keeps_first_token() {
        assert_eq!(clean_subject("\"Toán học\""), "Toán");
        assert_eq!(clean_subject("  Physics.\n"), "Physics");
        assert_eq!(clean_subject("'Hóa'"), "Hóa");
        assert_eq!(clean_subject("```Physics\n```"), "Physics");
        assert_eq!(clean_subject("```text\nSinh học\n```"), "Sinh");
        assert_eq!(clean_subject(""), "");
        assert_eq!(clean_subject("***"), "");
    }

    #[tokio::test]
    async fn test_generate_uses_subject_and_count() {
        let llm = ScriptedLlm::new()
            .when(SUBJECT_NEEDLE, "\"Toán\"")
            .when(
                QUESTIONS_NEEDLE,
                r#"[{"question": "Q1?", "answers": ["A1"]},
                    {"question": "Q2?", "answers": ["A2"]},
                    {"question": "Q3?", "answers": ["A3"]}]"#,
            );
        let (agent, llm) = agent(llm);

        let pairs = agent.generate(None, Some(&matched(92))).await;
        assert_eq!(pairs.len(), 3);

        let prompts = llm.prompts();
        let question_prompt = prompts.iter().find(|p| p.contains(QUESTIONS_NEEDLE)).unwrap();
        assert!(question_prompt.contains("exactly 8"));
        assert!(question_prompt.contains("(related to Toán)"));
        assert!(question_prompt.contains("học sinh"));
        assert!(question_prompt.contains("\"Chuyên Toán\""));
    }

    #[tokio::test]
    async fn test_question_prompt_keeps_braces_in_candidate_name() {
        let llm = ScriptedLlm::new()
            .when(SUBJECT_NEEDLE, "Toán")
            .when(QUESTIONS_NEEDLE, "[]");
        let (agent, llm) = agent(llm);

        let cv = ParsedCv {
            name: Some("{position}".to_string()),
            ..ParsedCv::default()
        };
        agent.generate(Some(&cv), Some(&matched(80))).await;

        let prompts = llm.prompts();
        let question_prompt = prompts.iter().find(|p| p.contains(QUESTIONS_NEEDLE)).unwrap();
        assert!(question_prompt.contains("The candidate is {position}."));
        assert!(question_prompt.contains("\"Chuyên Toán\""));
    }

    #[tokio::test]
    async fn test_generate_defaults_to_score_80() {
        let llm = ScriptedLlm::new()
            .when(SUBJECT_NEEDLE, "Lý")
            .when(QUESTIONS_NEEDLE, "[]");
        let (agent, llm) = agent(llm);

        let pairs = agent.generate(None, None).await;
        assert!(pairs.is_empty());
        let prompts = llm.prompts();
        assert!(prompts.iter().any(|p| p.contains("exactly 6")));
    }

    #[tokio::test]
    async fn test_subject_failure_omits_guidance() {
        let llm = ScriptedLlm::new()
            .when_fail(SUBJECT_NEEDLE)
            .when(QUESTIONS_NEEDLE, "1) Câu hỏi?\nĐáp án");
        let (agent, llm) = agent(llm);

        let pairs = agent.generate(None, Some(&matched(50))).await;
        assert_eq!(pairs.len(), 1);

        let prompts = llm.prompts();
        let question_prompt = prompts.iter().find(|p| p.contains(QUESTIONS_NEEDLE)).unwrap();
        assert!(question_prompt.contains("exactly 4"));
        assert!(!question_prompt.contains("related to"));
    }

    #[tokio::test]
    async fn test_generation_failure_yields_empty_list() {
        let llm = ScriptedLlm::new()
            .when(SUBJECT_NEEDLE, "Toán")
            .when_fail(QUESTIONS_NEEDLE);
        let (agent, _) = agent(llm);

        let mut state = PipelineState::new("cv.txt", vec![]);
        state.matched_jd = Some(matched(95));
        let state = agent.run(state).await.unwrap();
        assert!(state.interview_questions.is_empty());
        assert!(!state.stop_pipeline);
    }

    #[tokio::test]
    async fn test_run_is_noop_when_stopped() {
        let (agent, llm) = agent(ScriptedLlm::new());
        let mut state = PipelineState::new("cv.txt", vec![]);
        state.stop_pipeline = true;

        let state = agent.run(state).await.unwrap();
        assert!(state.interview_questions.is_empty());
        assert_eq!(llm.calls(), 0);
    }
}
