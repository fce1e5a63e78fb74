use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use super::{DocumentSource, render_pdf};
use crate::error::AcquisitionError;
use crate::models::config::PdfConfig;

/// Reads documents from the local filesystem.
///
/// `.txt` files are taken as already-extracted text; anything else is
/// rendered as a PDF.
pub struct FileSource {
    pdf: PdfConfig,
}

impl FileSource {
    pub fn new(pdf: &PdfConfig) -> Self {
        Self { pdf: pdf.clone() }
    }
}

fn is_text_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("txt"))
}

#[async_trait]
impl DocumentSource for FileSource {
    async fn acquire_text(&self, location: &str) -> Result<String, AcquisitionError> {
        let path = Path::new(location);
        let data = tokio::fs::read(path)
            .await
            .map_err(|source| AcquisitionError::Io {
                location: location.to_string(),
                source,
            })?;
        debug!("Read {} bytes from {}", data.len(), location);

        if is_text_file(path) {
            return Ok(String::from_utf8_lossy(&data).into_owned());
        }

        render_pdf(location, data, &self.pdf).await
    }
}
