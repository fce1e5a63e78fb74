//! Document acquisition: turn a URL or a path into document text.
//!
//! Acquisition is the only fallible step in front of the pipeline. A failure
//! here is fatal for that one document; the pipeline is never invoked on it.

mod file;
mod http;

pub use file::FileSource;
pub use http::HttpSource;

use async_trait::async_trait;

use crate::error::{AcquisitionError, PdfError};
use crate::models::config::{FetchConfig, PdfConfig};
use crate::pdf::pdf_to_text;

/// Something that can produce the text of a document from its location.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn acquire_text(&self, location: &str) -> Result<String, AcquisitionError>;
}

/// Whether `location` is fetched over HTTP(S).
pub fn is_remote(location: &str) -> bool {
    let lower = location.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Dispatches URLs to [`HttpSource`] and everything else to [`FileSource`].
pub struct DefaultSource {
    http: HttpSource,
    file: FileSource,
}

impl DefaultSource {
    pub fn new(fetch: &FetchConfig, pdf: &PdfConfig) -> Result<Self, AcquisitionError> {
        Ok(Self {
            http: HttpSource::new(fetch, pdf)?,
            file: FileSource::new(pdf),
        })
    }
}

#[async_trait]
impl DocumentSource for DefaultSource {
    async fn acquire_text(&self, location: &str) -> Result<String, AcquisitionError> {
        if is_remote(location) {
            self.http.acquire_text(location).await
        } else if location.contains("://") {
            Err(AcquisitionError::UnsupportedLocation(location.to_string()))
        } else {
            self.file.acquire_text(location).await
        }
    }
}

/// Render PDF bytes on the blocking pool.
async fn render_pdf(
    location: &str,
    data: Vec<u8>,
    config: &PdfConfig,
) -> Result<String, AcquisitionError> {
    let config = config.clone();
    let rendered = tokio::task::spawn_blocking(move || pdf_to_text(&data, &config))
        .await
        .map_err(|e| AcquisitionError::Pdf {
            location: location.to_string(),
            source: PdfError::TextExtraction(e.to_string()),
        })?;

    rendered.map_err(|source| AcquisitionError::Pdf {
        location: location.to_string(),
        source,
    })
}
