// LLM prompt templates for the recruitment agents.
// Placeholders in `{braces}` are filled by `render`; the JSON examples inside
// the templates are left alone because their braces never name a variable.

/// Fills `{name}` placeholders in one pass over the template. Substituted
/// values are never scanned again, so braces inside CV or JD text stay
/// literal. Unknown placeholders are kept as-is.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let key = &after[..close];
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (close, *value))
        });
        match value {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// CV extraction prompt. Replace `{cv_text}` and `{json_only}`.
pub const CV_PARSE_PROMPT_TEMPLATE: &str = r#"You are an ATS parser for high school and university admissions. The CV content is written in Vietnamese or English.

From the content below, extract a single JSON object with EXACTLY this schema:
{
  "name": "string or null",
  "email": "string or null",
  "skills": ["string"],
  "experience_years": 0,
  "education": [
    {"institution": "string", "degree": "string", "field_of_study": "string", "graduation_year": 2024}
  ],
  "highest_degree_level": "BACHELOR | MASTER | PHD | OTHER | UNKNOWN",
  "certifications": ["string"],
  "languages": [
    {"language": "string", "proficiency_cefr": "A1 | A2 | B1 | B2 | C1 | C2 | Unknown"}
  ],
  "university_evaluation": {"rank_tier": "string", "estimated_score": 0, "confidence": 0.0}
}

Rules for `skills` (one flat list):
- Academic scores in the format "Subject: score", e.g. "Toán học: 9.5", "Ngữ văn: 8.0", "Math: 9.0", "Physics: 8.5"
- Academic awards, competitions, or scholarships, e.g. "Giải Nhất HSG Toán cấp thành phố", "First Prize in Physics Olympiad"
- Exclude soft skills, traits, or general personal qualities.

Use null or an empty list for anything the CV does not state. Do NOT invent values.

CV Content:
{cv_text}

{json_only}"#;

/// Narrow prompt for the `languages` array only. Replace `{cv_text}` and `{json_only}`.
pub const LANGUAGES_PROMPT_TEMPLATE: &str = r#"List every language the candidate in the CV below can use, with a CEFR level.

Return a JSON array:
[
  {"language": "English", "proficiency_cefr": "B2"}
]

Rules:
- proficiency_cefr is one of "A1", "A2", "B1", "B2", "C1", "C2", or "Unknown".
- Map certificates to CEFR where the mapping is standard (e.g. IELTS 6.5 → B2, IELTS 7.5 → C1).
- Use "Unknown" when no level can be inferred.
- Return [] if no language is mentioned.

CV Content:
{cv_text}

{json_only}"#;

/// Extras scoring prompt. Replace `{profile_json}` and `{bare_value}`.
pub const EXTRAS_SCORE_PROMPT_TEMPLATE: &str = r#"You are evaluating a student's profile for admission. Based on the provided CV content, assess the candidate's overall academic potential, including:

- Academic awards or competitions
- Personal projects or portfolio
- Logical or critical thinking ability
- Learning motivation and independence

Score the candidate on a scale from 0 to 100 based on these aspects only (NOT subject scores).

CV Content:
{profile_json}

Return only a single integer number, like: 85
{bare_value}"#;

/// Match justification prompt.
/// Replace `{match_score}`, `{position}`, `{requirements_json}`, `{profile_json}`.
pub const JUSTIFICATION_PROMPT_TEMPLATE: &str = r#"A candidate was matched to the program "{position}" with a match score of {match_score}/100.

Program requirements:
{requirements_json}

Candidate profile:
{profile_json}

In 2-4 sentences, explain why this score was given: which requirements the candidate meets, which they fall short of, and any notable achievements. Refer to the score {match_score}/100 explicitly. Plain text only, no markdown."#;

/// Interview subject prompt. Replace `{profile_json}`, `{jd_json}`, `{bare_value}`.
pub const INTERVIEW_SUBJECT_PROMPT_TEMPLATE: &str = r#"Given the candidate profile and job description information below, identify the single most appropriate major subject (e.g. "Mathematics", "Physics", "Chemistry", "Biology", "Informatics") for the specialized interview.

Candidate info:
{profile_json}

Job description info:
{jd_json}

Only return the subject name (one word or short phrase). {bare_value}
Support both Vietnamese and English subjects, but prefer Vietnamese if the candidate's CV is in Vietnamese."#;

/// Subject line inserted into the question prompt when a subject is known.
/// Replace `{subject}`.
pub const SUBJECT_GUIDANCE_TEMPLATE: &str = "- Basic subject understanding (related to {subject})";

/// Subject line used when no subject could be derived.
pub const GENERIC_SUBJECT_GUIDANCE: &str = "- Basic subject understanding";

/// Question generation prompt.
/// Replace `{question_count}`, `{name}`, `{position}`, `{subject_guidance}`, `{json_only}`.
pub const INTERVIEW_QUESTIONS_PROMPT_TEMPLATE: &str = r#"You are a Vietnamese high school interviewer. The candidate is {name}. Write exactly {question_count} Vietnamese-language interview questions to assess the student's thinking and subject ability in the specialized program "{position}".

Each question should test:
- Thinking ability
{subject_guidance}
- Application or creative thinking

Then provide at least one sample answer for each question. Questions and answers must be written in Vietnamese.

Respond in this JSON format:
[
  {
    "question": "Câu hỏi bằng tiếng Việt?",
    "answers": ["Câu trả lời mẫu 1", "Câu trả lời mẫu 2 (nếu có)"]
  }
]

{json_only}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_fills_known_placeholders() {
        let out = render("{a} and {b}, {a}", &[("a", "1"), ("b", "2")]);
        assert_eq!(out, "1 and 2, 1");
    }

    #[test]
    fn test_render_keeps_json_and_unknown_braces() {
        let out = render(r#"{"name": "x"} {missing} {a}"#, &[("a", "1")]);
        assert_eq!(out, r#"{"name": "x"} {missing} 1"#);
    }

    #[test]
    fn test_render_does_not_rescan_values() {
        let out = render(
            JUSTIFICATION_PROMPT_TEMPLATE,
            &[
                ("match_score", "70"),
                ("requirements_json", r#"["{position}: 8"]"#),
                ("position", "Chuyên Toán"),
                ("profile_json", "{profile_json}"),
            ],
        );
        assert!(out.contains(r#"["{position}: 8"]"#));
        assert!(out.contains("\"Chuyên Toán\""));
        assert!(out.contains("{profile_json}"));
        assert!(out.contains("70/100"));
    }
}
