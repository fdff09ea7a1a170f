//! CV text extraction. PDFs go through `pdf-extract`; anything else is read
//! as UTF-8 text.

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::errors::AgentError;

#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, path: &Path) -> Result<String, AgentError>;
}

pub struct FileTextExtractor;

#[async_trait]
impl TextExtractor for FileTextExtractor {
    async fn extract(&self, path: &Path) -> Result<String, AgentError> {
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);

        let text = if is_pdf {
            let owned = path.to_path_buf();
            // pdf-extract is synchronous and CPU-bound
            tokio::task::spawn_blocking(move || pdf_extract::extract_text(&owned))
                .await
                .map_err(|e| AgentError::Extraction(format!("{}: {e}", path.display())))?
                .map_err(|e| AgentError::Extraction(format!("{}: {e}", path.display())))?
        } else {
            tokio::fs::read_to_string(path).await?
        };

        if text.trim().is_empty() {
            return Err(AgentError::Extraction(format!(
                "{}: no text could be extracted",
                path.display()
            )));
        }

        debug!("Extracted {} chars from {}", text.len(), path.display());
        Ok(text)
    }
}
