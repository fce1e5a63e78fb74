//! Field extraction: classify, extract, normalize, resolve, assemble.

pub mod assembler;
pub mod classifier;
pub mod engine;
pub mod fixtures;
pub mod normalize;
mod patterns;
pub mod pipeline;
pub mod resolver;

pub use assembler::assemble;
pub use classifier::{Classifier, TypeScore};
pub use engine::extract;
pub use fixtures::{AppliedFixture, KnownFixture, KnownFixtures};
pub use normalize::{
    Normalized, normalize_date, normalize_enum, normalize_number, normalize_text, normalize_value,
};
pub use pipeline::ExtractionPipeline;
pub use resolver::{AppliedRule, Resolution, resolve};

use std::fmt;

use serde::Serialize;

use crate::models::record::{DocumentTypeId, OutputRecord, RecordKind};

/// Non-fatal finding reported alongside a pipeline result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Diagnostic {
    /// No document type met its threshold.
    ClassificationMiss,
    /// Every attempt for a field failed; it holds its sentinel.
    FieldMiss { field: String },
    /// A captured value did not parse as its declared kind and was kept as cleaned text.
    NormalizationMiss {
        field: String,
        value: String,
        kind: String,
    },
    /// A derivation rule filled a field.
    Derived { rule: String, field: String },
    /// A known-fixture override filled fields.
    FixtureApplied { fixture: String, fields: Vec<String> },
}

impl Diagnostic {
    /// Whether callers should surface this diagnostic as a warning.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Diagnostic::ClassificationMiss | Diagnostic::NormalizationMiss { .. }
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::ClassificationMiss => write!(f, "document type not recognized"),
            Diagnostic::FieldMiss { field } => write!(f, "{field}: not found"),
            Diagnostic::NormalizationMiss { field, value, kind } => {
                write!(f, "{field}: '{value}' is not a valid {kind}")
            }
            Diagnostic::Derived { rule, field } => write!(f, "{field}: derived by {rule}"),
            Diagnostic::FixtureApplied { fixture, fields } => {
                write!(f, "known fixture {fixture} filled {}", fields.join(", "))
            }
        }
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub document_type: DocumentTypeId,
    pub kind: RecordKind,
    pub record: OutputRecord,
    pub diagnostics: Vec<Diagnostic>,
    pub processing_time_ms: u64,
}

impl PipelineOutput {
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_warning())
    }
}
