use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::errors::AgentError;

const DEFAULT_LEVEL: &str = "Mid";
const DEFAULT_LOCATION: &str = "Ho Chi Minh City, Vietnam";

/// Required subject scores, as uploaded: either a list of `"subject: score"`
/// strings or the same list JSON-encoded into one string.
///
/// Non-string list elements are dropped one by one; `null` reads as an empty
/// list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SkillsRequired {
    List(Vec<String>),
    Encoded(String),
}

impl Default for SkillsRequired {
    fn default() -> Self {
        SkillsRequired::List(Vec::new())
    }
}

impl<'de> Deserialize<'de> for SkillsRequired {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(raw) => SkillsRequired::Encoded(raw),
            Value::Array(items) => SkillsRequired::List(string_items(items)),
            _ => SkillsRequired::default(),
        })
    }
}

impl SkillsRequired {
    /// Returns the requirement list, decoding the JSON-encoded form.
    /// Fails only when the encoded string is not a JSON list (or `null`).
    pub fn decode(&self) -> Result<Vec<String>, serde_json::Error> {
        match self {
            SkillsRequired::List(items) => Ok(items.clone()),
            SkillsRequired::Encoded(raw) => match serde_json::from_str::<Value>(raw)? {
                Value::Array(items) => Ok(string_items(items)),
                Value::Null => Ok(Vec::new()),
                other => Err(serde::de::Error::custom(format!(
                    "expected a list of skills, got {other}"
                ))),
            },
        }
    }
}

fn string_items(items: Vec<Value>) -> Vec<String> {
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s),
            _ => None,
        })
        .collect()
}

/// A job / program description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescription {
    pub position: String,
    #[serde(default)]
    pub skills_required: SkillsRequired,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// The matching decision for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedJd {
    pub position: String,
    pub skills_required: Vec<String>,
    pub level: String,
    /// 0 – 100
    pub match_score: u8,
    pub justification: String,
}

impl MatchedJd {
    /// Record used when no JD could be matched.
    pub fn fallback(position_applied_for: Option<&str>) -> Self {
        let position = position_applied_for
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or("Unknown");
        Self {
            position: position.to_string(),
            skills_required: Vec::new(),
            level: "Unknown".to_string(),
            match_score: 0,
            justification: String::new(),
        }
    }
}

/// Parses an uploaded JD document: one JD object or an array of them.
///
/// Applies the upload defaults (`level = "Mid"`, location = Ho Chi Minh City)
/// and rejects blank positions.
pub fn parse_job_descriptions(raw: &str) -> Result<Vec<JobDescription>, AgentError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| AgentError::Parse(format!("JD document is not valid JSON: {e}")))?;

    let items = match value {
        Value::Array(items) => items,
        obj @ Value::Object(_) => vec![obj],
        other => {
            return Err(AgentError::Validation(format!(
                "JD document must be an object or an array, got {other}"
            )))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            let mut jd: JobDescription = serde_json::from_value(item)
                .map_err(|e| AgentError::Parse(format!("JD #{idx} is malformed: {e}")))?;
            if jd.position.trim().is_empty() {
                return Err(AgentError::Validation(format!(
                    "JD #{idx}: position cannot be empty"
                )));
            }
            jd.level.get_or_insert_with(|| DEFAULT_LEVEL.to_string());
            jd.location.get_or_insert_with(|| DEFAULT_LOCATION.to_string());
            Ok(jd)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skills_required_plain_list() {
        let jd: JobDescription = serde_json::from_str(
            r#"{"position": "Chuyên Toán", "skills_required": ["Toán: 8", "Lý: 7"]}"#,
        )
        .unwrap();
        assert_eq!(jd.skills_required.decode().unwrap(), vec!["Toán: 8", "Lý: 7"]);
    }

    #[test]
    fn test_skills_required_json_encoded_string() {
        let jd: JobDescription = serde_json::from_str(
            r#"{"position": "Chuyên Lý", "skills_required": "[\"Lý: 9\"]"}"#,
        )
        .unwrap();
        assert!(matches!(jd.skills_required, SkillsRequired::Encoded(_)));
        assert_eq!(jd.skills_required.decode().unwrap(), vec!["Lý: 9"]);
    }

    #[test]
    fn test_skills_required_undecodable_string() {
        let skills = SkillsRequired::Encoded("Toán: 8".to_string());
        assert!(skills.decode().is_err());

        let skills = SkillsRequired::Encoded(r#"{"Toán": 8}"#.to_string());
        assert!(skills.decode().is_err());
    }

    #[test]
    fn test_encoded_list_drops_non_string_elements() {
        let skills = SkillsRequired::Encoded(r#"["Toán: 8", 9, null, "Lý: 7"]"#.to_string());
        assert_eq!(skills.decode().unwrap(), vec!["Toán: 8", "Lý: 7"]);
        assert!(SkillsRequired::Encoded("null".to_string()).decode().unwrap().is_empty());
    }

    #[test]
    fn test_plain_list_drops_non_string_elements() {
        let jds = parse_job_descriptions(
            r#"[{"position": "A", "skills_required": ["Toán: 8", 9, {"x": 1}]},
                {"position": "B", "skills_required": ["Lý: 7"]}]"#,
        )
        .unwrap();
        assert_eq!(jds.len(), 2);
        assert_eq!(jds[0].skills_required, SkillsRequired::List(vec!["Toán: 8".to_string()]));
        assert_eq!(jds[1].skills_required.decode().unwrap(), vec!["Lý: 7"]);
    }

    #[test]
    fn test_null_skills_required_is_empty_list() {
        let jds = parse_job_descriptions(r#"{"position": "A", "skills_required": null}"#).unwrap();
        assert_eq!(jds[0].skills_required, SkillsRequired::List(vec![]));
    }

    #[test]
    fn test_parse_single_object_applies_defaults() {
        let jds = parse_job_descriptions(r#"{"position": "Chuyên Hóa"}"#).unwrap();
        assert_eq!(jds.len(), 1);
        assert_eq!(jds[0].level.as_deref(), Some("Mid"));
        assert_eq!(jds[0].location.as_deref(), Some("Ho Chi Minh City, Vietnam"));
        assert_eq!(jds[0].skills_required, SkillsRequired::List(vec![]));
    }

    #[test]
    fn test_parse_array_keeps_order_and_explicit_level() {
        let jds = parse_job_descriptions(
            r#"[{"position": "A", "level": "Senior"}, {"position": "B"}]"#,
        )
        .unwrap();
        assert_eq!(jds[0].position, "A");
        assert_eq!(jds[0].level.as_deref(), Some("Senior"));
        assert_eq!(jds[1].position, "B");
    }

    #[test]
    fn test_parse_rejects_blank_position() {
        let err = parse_job_descriptions(r#"[{"position": "  "}]"#).unwrap_err();
        assert!(matches!(err, AgentError::Validation(_)));
    }

    #[test]
    fn test_parse_rejects_scalar_document() {
        assert!(parse_job_descriptions("42").is_err());
    }

    #[test]
    fn test_fallback_uses_declared_position() {
        let m = MatchedJd::fallback(Some("Chuyên Tin"));
        assert_eq!(m.position, "Chuyên Tin");
        assert_eq!(m.match_score, 0);
        assert_eq!(m.level, "Unknown");
        assert!(m.skills_required.is_empty());
        assert!(m.justification.is_empty());
    }

    #[test]
    fn test_fallback_without_position_is_unknown() {
        assert_eq!(MatchedJd::fallback(None).position, "Unknown");
        assert_eq!(MatchedJd::fallback(Some(" ")).position, "Unknown");
    }
}
