//! Core library for insurance-document field extraction.
//!
//! This crate provides:
//! - A declarative document-type catalog (schemas, markers, field cascades, derivation rules)
//! - Marker-based document classification with a fixed priority order
//! - Regex cascade extraction, value normalization and derived-field resolution
//! - Schema-complete output records for policies and endorsements
//! - PDF text layer extraction and document acquisition (feature `native`)

pub mod catalog;
pub mod error;
pub mod extraction;
pub mod models;

#[cfg(feature = "native")]
pub mod acquire;
#[cfg(feature = "native")]
pub mod pdf;

pub use catalog::{Catalog, DocumentType, FieldSpec, Schema};
pub use error::{AcquisitionError, CatalogError, PdfError, PolizaError, Result};
pub use extraction::{Classifier, Diagnostic, ExtractionPipeline, PipelineOutput, TypeScore};
pub use models::{DocumentTypeId, OutputRecord, PolizaConfig, RecordKind};

#[cfg(feature = "native")]
pub use acquire::{DefaultSource, DocumentSource, FileSource, HttpSource};
#[cfg(feature = "native")]
pub use pdf::{PdfContent, PdfExtractor, PdfProcessor, PdfType};
