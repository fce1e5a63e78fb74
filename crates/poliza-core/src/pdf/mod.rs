//! PDF text layer extraction.

mod extractor;

pub use extractor::{PdfContent, PdfExtractor, PdfPage};

use crate::error::PdfError;
use crate::models::config::PdfConfig;

/// Type of PDF content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfType {
    /// Carries a usable text layer.
    Text,
    /// No usable text (scanned image or blank pages).
    Empty,
}

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Analyze the PDF to determine its type.
    fn analyze(&self) -> PdfType;

    /// Extract text from the document, pages in order.
    fn extract_text(&self) -> Result<String>;

    /// Extract text from a specific page (1-indexed).
    fn extract_page_text(&self, page: u32) -> Result<String>;
}

/// Render PDF bytes to text, failing when there is no text layer.
pub fn pdf_to_text(data: &[u8], config: &PdfConfig) -> Result<String> {
    let mut extractor = PdfExtractor::from_config(config);
    extractor.load(data)?;

    let text = extractor.extract_text()?;
    let chars = text.trim().chars().count();
    if chars < config.min_text_length {
        return Err(PdfError::NoTextLayer { chars });
    }

    Ok(text)
}
