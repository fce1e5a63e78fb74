//! PDF text extraction using lopdf and pdf-extract.

use lopdf::Document;
use tracing::{debug, warn};

use super::{PdfProcessor, PdfType, Result};
use crate::error::PdfError;
use crate::models::config::PdfConfig;

/// PDF text extractor using lopdf.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
    max_pages: usize,
    min_text_length: usize,
}

/// Extracted content from a PDF.
#[derive(Debug, Clone)]
pub struct PdfContent {
    /// Type of PDF content.
    pub pdf_type: PdfType,
    /// Page texts joined by a blank line.
    pub text: String,
    /// Pages with their content.
    pub pages: Vec<PdfPage>,
}

/// Content from a single PDF page.
#[derive(Debug, Clone)]
pub struct PdfPage {
    /// Page number (1-indexed).
    pub number: u32,
    /// Extracted text from this page.
    pub text: String,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        let defaults = PdfConfig::default();
        Self {
            document: None,
            raw_data: Vec::new(),
            max_pages: defaults.max_pages,
            min_text_length: defaults.min_text_length,
        }
    }

    pub fn from_config(config: &PdfConfig) -> Self {
        Self::new()
            .with_max_pages(config.max_pages)
            .with_min_text_length(config.min_text_length)
    }

    /// Read at most `max_pages` pages (0 = all).
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_min_text_length(mut self, min_text_length: usize) -> Self {
        self.min_text_length = min_text_length;
        self
    }

    /// Extract text page by page.
    pub fn extract_all(&self) -> Result<PdfContent> {
        let page_count = self.document()?.get_pages().len() as u32;
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        let pages: Vec<PdfPage> = self
            .page_numbers(page_count)
            .map(|number| PdfPage {
                number,
                text: self.extract_page_text(number).unwrap_or_default(),
            })
            .collect();

        let text = join_pages(pages.iter().map(|p| p.text.as_str()));
        let pdf_type = self.classify_text(&text);

        debug!(
            "PDF analysis: {} pages read, {} chars text -> {:?}",
            pages.len(),
            text.len(),
            pdf_type
        );

        Ok(PdfContent {
            pdf_type,
            text,
            pages,
        })
    }

    fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or_else(|| PdfError::Parse("No document loaded".to_string()))
    }

    fn page_numbers(&self, page_count: u32) -> impl Iterator<Item = u32> {
        let last = if self.max_pages == 0 {
            page_count
        } else {
            page_count.min(self.max_pages as u32)
        };
        1..=last
    }

    fn classify_text(&self, text: &str) -> PdfType {
        if text.trim().chars().count() >= self.min_text_length {
            PdfType::Text
        } else {
            PdfType::Empty
        }
    }

    fn extract_pages_text(&self) -> Result<String> {
        let page_count = self.page_count();
        let mut texts = Vec::new();
        for page in self.page_numbers(page_count) {
            texts.push(self.extract_page_text(page)?);
        }
        Ok(join_pages(texts.iter().map(String::as_str)))
    }
}

fn join_pages<'a>(pages: impl Iterator<Item = &'a str>) -> String {
    pages
        .map(str::trim_end)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // Save decrypted document to raw_data for pdf_extract
            let mut decrypted_data = Vec::new();
            doc.save_to(&mut decrypted_data)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted_data;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn analyze(&self) -> PdfType {
        let text = self.extract_text().unwrap_or_default();
        let pdf_type = self.classify_text(&text);
        debug!("PDF analysis: {} chars -> {:?}", text.len(), pdf_type);
        pdf_type
    }

    fn extract_text(&self) -> Result<String> {
        self.document()?;

        if self.max_pages > 0 {
            return self.extract_pages_text();
        }

        match pdf_extract::extract_text_from_mem(&self.raw_data) {
            Ok(text) => Ok(text),
            Err(e) => {
                warn!("pdf-extract failed ({}), falling back to per-page extraction", e);
                self.extract_pages_text()
            }
        }
    }

    fn extract_page_text(&self, page: u32) -> Result<String> {
        let doc = self.document()?;
        if page == 0 || page > self.page_count() {
            return Err(PdfError::TextExtraction(format!("page {} out of range", page)));
        }

        doc.extract_text(&[page])
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }
}
