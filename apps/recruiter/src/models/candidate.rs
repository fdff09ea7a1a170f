use serde::{Deserialize, Serialize};

/// Highest academic degree found on the CV.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DegreeLevel {
    Bachelor,
    Master,
    Phd,
    Other,
    #[default]
    Unknown,
}

impl DegreeLevel {
    /// Lenient mapping from whatever label the model produced.
    /// Unrecognized labels map to `Unknown`.
    pub fn from_label(label: &str) -> Self {
        let key: String = label
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "bachelor" | "bachelors" | "bsc" | "ba" | "cunhan" | "undergraduate" => {
                DegreeLevel::Bachelor
            }
            "master" | "masters" | "msc" | "ma" | "mba" | "thacsi" => DegreeLevel::Master,
            "phd" | "doctorate" | "doctoral" | "tiensi" => DegreeLevel::Phd,
            "other" => DegreeLevel::Other,
            _ => DegreeLevel::Unknown,
        }
    }
}

/// CEFR language proficiency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cefr {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
    #[default]
    Unknown,
}

impl Cefr {
    /// Unrecognized labels map to `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "A1" => Cefr::A1,
            "A2" => Cefr::A2,
            "B1" => Cefr::B1,
            "B2" => Cefr::B2,
            "C1" => Cefr::C1,
            "C2" => Cefr::C2,
            _ => Cefr::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageSkill {
    pub language: String,
    pub proficiency_cefr: Cefr,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub institution: Option<String>,
    pub degree: Option<String>,
    pub field_of_study: Option<String>,
    pub graduation_year: Option<i32>,
}

/// Model-estimated standing of the candidate's institution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UniversityEvaluation {
    pub rank_tier: Option<String>,
    /// 0 – 100
    pub estimated_score: Option<f64>,
    /// 0.0 – 1.0
    pub confidence: Option<f64>,
}

/// Structured candidate record extracted from CV text.
///
/// `skills` mixes `"subject: score"` entries with free-text achievements;
/// only the former take part in subject matching.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedCv {
    pub name: Option<String>,
    pub email: Option<String>,
    pub skills: Vec<String>,
    pub experience_years: Option<f64>,
    pub education: Vec<Education>,
    pub highest_degree_level: DegreeLevel,
    pub certifications: Vec<String>,
    pub languages: Vec<LanguageSkill>,
    pub university_evaluation: UniversityEvaluation,
}
