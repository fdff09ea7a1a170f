//! Subject normalizer. Maps bilingual subject labels onto one canonical
//! Vietnamese vocabulary so CV scores and JD requirements can be compared.
//!
//! Lookup key: diacritics stripped (`đ` → `d`), lowercased, every
//! non-alphanumeric character removed. "Toán Học", "toan hoc" and "Math" all
//! fold onto "toán".

use std::collections::HashMap;
use std::sync::LazyLock;

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Canonical subject → folded aliases.
const SUBJECT_ALIASES: &[(&str, &[&str])] = &[
    ("toán", &["toan", "toanhoc", "math", "maths", "mathematics"]),
    ("lý", &["ly", "li", "vatly", "vatli", "physics", "phys"]),
    ("hóa", &["hoa", "hoahoc", "chemistry", "chem"]),
    ("sinh", &["sinh", "sinhhoc", "biology", "bio"]),
    ("văn", &["van", "nguvan", "vanhoc", "literature", "vietnamese"]),
    ("anh", &["anh", "tienganh", "anhvan", "english", "eng"]),
    ("sử", &["su", "lichsu", "history"]),
    ("địa", &["dia", "dialy", "diali", "geography", "geo"]),
    ("tin", &["tin", "tinhoc", "informatics", "computerscience", "it", "cs"]),
    ("gdcd", &["gdcd", "giaoduccongdan", "civiceducation", "civics"]),
    ("công nghệ", &["congnghe", "technology", "tech"]),
    ("khtn", &["khtn", "khoahoctunhien", "naturalscience", "science"]),
    ("tiếng pháp", &["tiengphap", "phap", "french"]),
    ("tiếng nhật", &["tiengnhat", "nhat", "japanese"]),
    ("tiếng trung", &["tiengtrung", "trung", "chinese"]),
];

static ALIAS_INDEX: LazyLock<HashMap<String, &'static str>> = LazyLock::new(|| {
    let mut index = HashMap::new();
    for (canonical, aliases) in SUBJECT_ALIASES {
        index.insert(fold(canonical), *canonical);
        for alias in *aliases {
            index.insert(alias.to_string(), *canonical);
        }
    }
    index
});

/// Strips diacritics, lowercases, and drops whitespace and separators.
pub fn fold(label: &str) -> String {
    label
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| match c {
            'đ' | 'Đ' => 'd',
            other => other,
        })
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Maps a subject label to its canonical key. Unmapped labels fall back to
/// their folded form so both sides of a comparison still agree; a label that
/// folds to nothing is returned trimmed.
pub fn normalize(label: &str) -> String {
    let folded = fold(label);
    match ALIAS_INDEX.get(folded.as_str()) {
        Some(canonical) => canonical.to_string(),
        None if folded.is_empty() => label.trim().to_string(),
        None => folded,
    }
}

/// Canonical-keyed subject scores in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubjectScores {
    entries: Vec<(String, f64)>,
}

impl SubjectScores {
    /// Inserts or overwrites; an overwrite keeps the original position.
    pub fn insert(&mut self, subject: String, score: f64) {
        match self.entries.iter_mut().find(|(s, _)| *s == subject) {
            Some(entry) => entry.1 = score,
            None => self.entries.push((subject, score)),
        }
    }

    pub fn get(&self, subject: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(s, _)| s == subject)
            .map(|(_, score)| *score)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(s, score)| (s.as_str(), *score))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Subject with the highest score; ties go to the first one listed.
    pub fn top(&self) -> Option<(&str, f64)> {
        self.iter().fold(None, |best, (subject, score)| match best {
            Some((_, best_score)) if score <= best_score => best,
            _ => Some((subject, score)),
        })
    }
}

/// Parses `"subject: score"` items into canonical-keyed scores.
/// Items without a colon, with an empty subject, or with a value that is not
/// a finite number are skipped one by one.
pub fn parse_subject_scores<S: AsRef<str>>(items: &[S]) -> SubjectScores {
    let mut scores = SubjectScores::default();
    for item in items {
        let Some((subject, value)) = item.as_ref().split_once(':') else {
            continue;
        };
        let subject = subject.trim();
        if subject.is_empty() {
            continue;
        }
        match value.trim().parse::<f64>() {
            Ok(score) if score.is_finite() => scores.insert(normalize(subject), score),
            _ => continue,
        }
    }
    scores
}
