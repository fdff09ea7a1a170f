use serde::{Deserialize, Serialize};

/// One interview question with its sample answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answers: Vec<String>,
}
