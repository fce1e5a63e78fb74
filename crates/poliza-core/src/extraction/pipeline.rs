//! The extraction pipeline: Classify → Extract → Normalize → Resolve → Assemble.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::classifier::Classifier;
use super::normalize::normalize_value;
use super::{Diagnostic, PipelineOutput, assemble, extract, resolve};
use crate::catalog::{Catalog, Schema};
use crate::models::config::ExtractionConfig;
use crate::models::record::{DocumentTypeId, ExtractionResult, NormalizedRecord};

/// Runs documents through the catalog. Cheap to clone and safe to share.
#[derive(Debug, Clone)]
pub struct ExtractionPipeline {
    catalog: Arc<Catalog>,
    apply_known_fixtures: bool,
    report_field_misses: bool,
}

impl ExtractionPipeline {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            apply_known_fixtures: false,
            report_field_misses: true,
        }
    }

    pub fn from_config(catalog: Arc<Catalog>, config: &ExtractionConfig) -> Self {
        Self::new(catalog)
            .with_known_fixtures(config.apply_known_fixtures)
            .with_field_miss_reports(config.report_field_misses)
    }

    /// Enable or disable the known-fixture override table.
    pub fn with_known_fixtures(mut self, enabled: bool) -> Self {
        self.apply_known_fixtures = enabled;
        self
    }

    /// Enable or disable `FieldMiss` diagnostics.
    pub fn with_field_miss_reports(mut self, enabled: bool) -> Self {
        self.report_field_misses = enabled;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Run the full pipeline over one document's text. Never fails.
    pub fn run(&self, text: &str) -> PipelineOutput {
        let start = Instant::now();
        let mut diagnostics = Vec::new();

        let document_type = Classifier::new(&self.catalog).classify(text);
        if document_type.is_unknown() {
            info!("Document type not recognized; returning an empty record");
            diagnostics.push(Diagnostic::ClassificationMiss);
        } else {
            info!("Document classified as {}", document_type);
        }

        let kind = self.catalog.kind_for(&document_type);
        let schema = self.catalog.schema_for(kind);

        let raw = extract(text, self.catalog.fields_for(&document_type));
        debug!("Extracted {} raw fields", raw.len());

        let normalized = normalize_record(&raw, schema, &mut diagnostics);

        let resolution = resolve(&normalized, self.catalog.rules_for(&document_type), schema);
        diagnostics.extend(resolution.applied.into_iter().map(|applied| Diagnostic::Derived {
            rule: applied.rule,
            field: applied.field,
        }));
        let mut resolved = resolution.record;

        if self.apply_known_fixtures {
            let (patched, applied) = self.catalog.fixtures().apply(&resolved, schema);
            resolved = patched;
            diagnostics.extend(applied.into_iter().map(|applied| Diagnostic::FixtureApplied {
                fixture: applied.fixture,
                fields: applied.fields,
            }));
        }

        if self.report_field_misses {
            self.report_misses(&document_type, &resolved, schema, &mut diagnostics);
        }

        let record = assemble(&resolved, schema);

        let processing_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "Extraction finished: {} ({} diagnostics, {}ms)",
            document_type,
            diagnostics.len(),
            processing_time_ms
        );

        PipelineOutput {
            document_type,
            kind,
            record,
            diagnostics,
            processing_time_ms,
        }
    }

    fn report_misses(
        &self,
        document_type: &DocumentTypeId,
        record: &NormalizedRecord,
        schema: &Schema,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        let mut seen = HashSet::new();
        for spec in self.catalog.fields_for(document_type) {
            if !seen.insert(spec.field.as_str()) {
                continue;
            }
            if schema.is_unset(&spec.field, record.get(&spec.field)) {
                debug!("Field miss: {}", spec.field);
                diagnostics.push(Diagnostic::FieldMiss {
                    field: spec.field.clone(),
                });
            }
        }
    }
}

fn normalize_record(
    raw: &ExtractionResult,
    schema: &Schema,
    diagnostics: &mut Vec<Diagnostic>,
) -> NormalizedRecord {
    let mut record = NormalizedRecord::new();

    for (field, value) in raw.iter() {
        let Some(declared) = schema.field(field) else {
            continue;
        };

        // max_len is applied at assembly so derivations see the whole value
        let normalized = normalize_value(value, &declared.kind, None);
        if normalized.miss {
            warn!(
                "{}: could not normalize '{}' as {}",
                field,
                normalized.value,
                declared.kind.name()
            );
            diagnostics.push(Diagnostic::NormalizationMiss {
                field: field.to_string(),
                value: normalized.value.clone(),
                kind: declared.kind.name().to_string(),
            });
        }

        if !normalized.value.is_empty() {
            record.insert(field, normalized.value);
        }
    }

    record
}
