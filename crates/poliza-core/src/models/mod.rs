//! Data models shared across the pipeline and its callers.

pub mod config;
pub mod record;

pub use config::{ExtractionConfig, FetchConfig, PdfConfig, PolizaConfig, ServerConfig};
pub use record::{DocumentTypeId, ExtractionResult, NormalizedRecord, OutputRecord, RecordKind};
