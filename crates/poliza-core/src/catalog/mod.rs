//! Document-type catalog: schemas, classification markers, field cascades
//! and derivation rules, compiled once from declarative JSON.
//!
//! The catalog is read-only after [`Catalog::compile`] returns and is shared
//! between threads behind an `Arc`.

mod definition;
pub mod types;

pub use definition::{
    AttemptDefinition, CatalogDefinition, DocumentTypeDefinition, FieldDefinition,
    FixtureDefinition, RuleDefinition, SchemaDefinitions, TransformDefinition,
};
pub use types::{
    Attempt, CompoundTarget, Condition, DerivationRule, DocumentType, EnumSpec, FieldSpec,
    GroupSelection, Schema, SchemaField, Transform, ValueKind,
};

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use regex::{Regex, RegexBuilder};
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::CatalogError;
use crate::extraction::fixtures::{KnownFixture, KnownFixtures};
use crate::extraction::normalize::normalize_value;
use crate::models::record::{DocumentTypeId, RecordKind};

/// The catalog shipped with the library.
pub const DEFAULT_CATALOG: &str = include_str!("../../catalog/default.json");

type Result<T> = std::result::Result<T, CatalogError>;

/// Compiled, immutable registry of document types and schemas.
#[derive(Debug, Clone)]
pub struct Catalog {
    document_types: Vec<DocumentType>,
    policy: Schema,
    endorsement: Schema,
    fixtures: KnownFixtures,
}

impl Catalog {
    /// Compile the embedded default catalog.
    pub fn builtin() -> Result<Self> {
        Self::from_json(DEFAULT_CATALOG)
    }

    /// Compile a catalog from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let definition: CatalogDefinition = serde_json::from_str(json)?;
        Self::compile(definition)
    }

    /// Compile a catalog from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Validate and compile a parsed definition.
    pub fn compile(definition: CatalogDefinition) -> Result<Self> {
        let CatalogDefinition {
            schemas,
            field_sets,
            rule_sets,
            document_types: type_definitions,
            known_fixtures,
        } = definition;

        let policy = build_schema(RecordKind::Policy, schemas.policy)?;
        let endorsement = build_schema(RecordKind::Endorsement, schemas.endorsement)?;

        let mut document_types = Vec::with_capacity(type_definitions.len());
        let mut ids = HashSet::new();

        for (priority, doc) in type_definitions.iter().enumerate() {
            if !ids.insert(doc.id.clone()) {
                return Err(CatalogError::DuplicateDocumentType(doc.id.clone()));
            }
            let schema = match doc.kind {
                RecordKind::Policy => &policy,
                RecordKind::Endorsement => &endorsement,
            };
            document_types.push(compile_document_type(
                priority,
                doc,
                schema,
                &field_sets,
                &rule_sets,
            )?);
        }

        let fixtures = compile_fixtures(&known_fixtures, &policy, &endorsement)?;

        debug!(
            "Compiled catalog: {} document types, {} policy keys, {} endorsement keys",
            document_types.len(),
            policy.len(),
            endorsement.len()
        );

        Ok(Self {
            document_types,
            policy,
            endorsement,
            fixtures,
        })
    }

    /// Document types in priority order.
    pub fn document_types(&self) -> &[DocumentType] {
        &self.document_types
    }

    pub fn document_type(&self, id: &DocumentTypeId) -> Option<&DocumentType> {
        match id {
            DocumentTypeId::Known(id) => self.document_types.iter().find(|d| &d.id == id),
            DocumentTypeId::Unknown => None,
        }
    }

    /// Field cascade for a document type; empty for `Unknown`.
    pub fn fields_for(&self, id: &DocumentTypeId) -> &[FieldSpec] {
        self.document_type(id)
            .map(|d| d.fields.as_slice())
            .unwrap_or(&[])
    }

    /// Derivation rules for a document type; empty for `Unknown`.
    pub fn rules_for(&self, id: &DocumentTypeId) -> &[DerivationRule] {
        self.document_type(id)
            .map(|d| d.rules.as_slice())
            .unwrap_or(&[])
    }

    /// Record kind produced for a document type. `Unknown` yields a policy record.
    pub fn kind_for(&self, id: &DocumentTypeId) -> RecordKind {
        self.document_type(id)
            .map(|d| d.kind)
            .unwrap_or(RecordKind::Policy)
    }

    pub fn schema_for(&self, kind: RecordKind) -> &Schema {
        match kind {
            RecordKind::Policy => &self.policy,
            RecordKind::Endorsement => &self.endorsement,
        }
    }

    pub fn fixtures(&self) -> &KnownFixtures {
        &self.fixtures
    }
}

fn build_schema(kind: RecordKind, fields: Vec<SchemaField>) -> Result<Schema> {
    let mut seen = HashSet::new();
    for field in &fields {
        if !seen.insert(field.key.as_str()) {
            return Err(CatalogError::DuplicateSchemaKey {
                kind: kind.to_string(),
                key: field.key.clone(),
            });
        }
    }
    Ok(Schema::new(kind, fields))
}

fn compile_pattern(pattern: &str, case_sensitive: bool, context: impl Fn() -> String) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(!case_sensitive)
        .build()
        .map_err(|source| CatalogError::InvalidPattern {
            context: context(),
            source,
        })
}

fn has_group(regex: &Regex, group: &str) -> bool {
    regex.capture_names().flatten().any(|name| name == group)
}

fn require_field(schema: &Schema, field: &str, context: impl Fn() -> String) -> Result<()> {
    if schema.contains(field) {
        Ok(())
    } else {
        Err(CatalogError::UnknownField {
            context: context(),
            field: field.to_string(),
            kind: schema.kind().to_string(),
        })
    }
}

fn compile_document_type(
    priority: usize,
    doc: &DocumentTypeDefinition,
    schema: &Schema,
    field_sets: &BTreeMap<String, Vec<FieldDefinition>>,
    rule_sets: &BTreeMap<String, Vec<RuleDefinition>>,
) -> Result<DocumentType> {
    if doc.markers.is_empty() {
        return Err(CatalogError::NoMarkers(doc.id.clone()));
    }
    if !(doc.threshold > 0.0 && doc.threshold <= 1.0) {
        return Err(CatalogError::ThresholdOutOfRange {
            doc_type: doc.id.clone(),
            threshold: doc.threshold,
        });
    }

    let markers = doc
        .markers
        .iter()
        .enumerate()
        .map(|(i, marker)| compile_pattern(marker, false, || format!("{} marker #{}", doc.id, i + 1)))
        .collect::<Result<Vec<_>>>()?;

    let mut fields = Vec::new();
    // Fields an earlier spec can fill, either as its own field or as a compound target
    let mut extracted: HashSet<String> = HashSet::new();

    for set_name in &doc.field_sets {
        let set = field_sets
            .get(set_name)
            .ok_or_else(|| CatalogError::UnknownFieldSet {
                doc_type: doc.id.clone(),
                name: set_name.clone(),
            })?;

        for field_def in set {
            let spec = compile_field(&doc.id, field_def, schema)?;

            for attempt in spec.attempts.iter().filter(|a| a.is_compound()) {
                for target in attempt.compound.iter().filter(|t| t.field != spec.field) {
                    if extracted.contains(&target.field) {
                        return Err(CatalogError::CompoundConflict {
                            doc_type: doc.id.clone(),
                            field: spec.field.clone(),
                            target: target.field.clone(),
                        });
                    }
                }
            }

            extracted.insert(spec.field.clone());
            for attempt in spec.attempts.iter().filter(|a| a.is_compound()) {
                extracted.extend(attempt.compound.iter().map(|t| t.field.clone()));
            }
            fields.push(spec);
        }
    }

    let mut rules = Vec::new();
    for set_name in &doc.rule_sets {
        let set = rule_sets
            .get(set_name)
            .ok_or_else(|| CatalogError::UnknownRuleSet {
                doc_type: doc.id.clone(),
                name: set_name.clone(),
            })?;

        for rule_def in set {
            rules.push(compile_rule(rule_def, schema)?);
        }
    }

    Ok(DocumentType {
        id: doc.id.clone(),
        name: doc.name.clone().unwrap_or_else(|| doc.id.clone()),
        kind: doc.kind,
        priority,
        markers,
        threshold: doc.threshold,
        fields,
        rules,
    })
}

fn compile_field(doc_id: &str, def: &FieldDefinition, schema: &Schema) -> Result<FieldSpec> {
    let field_context = || format!("{doc_id}/{}", def.field);
    require_field(schema, &def.field, field_context)?;

    let mut attempts = Vec::with_capacity(def.attempts.len());

    for (i, attempt) in def.attempts.iter().enumerate() {
        let context = || format!("{doc_id}/{} attempt #{}", def.field, i + 1);
        let pattern = compile_pattern(&attempt.pattern, attempt.case_sensitive, context)?;

        if let GroupSelection::Named(group) = &attempt.group {
            if !has_group(&pattern, group) {
                return Err(CatalogError::UnknownGroup {
                    context: context(),
                    group: group.clone(),
                });
            }
        }

        if !attempt.compound.is_empty() {
            if !attempt.compound.iter().any(|t| t.field == def.field) {
                return Err(CatalogError::CompoundWithoutOwnField {
                    context: context(),
                    field: def.field.clone(),
                });
            }
            for target in &attempt.compound {
                require_field(schema, &target.field, context)?;
                if !has_group(&pattern, &target.group) {
                    return Err(CatalogError::UnknownGroup {
                        context: context(),
                        group: target.group.clone(),
                    });
                }
            }
        }

        attempts.push(Attempt {
            pattern,
            selection: attempt.group.clone(),
            compound: attempt.compound.clone(),
        });
    }

    // require_field above guarantees the lookup succeeds
    let schema_field = schema
        .field(&def.field)
        .ok_or_else(|| CatalogError::UnknownField {
            context: field_context(),
            field: def.field.clone(),
            kind: schema.kind().to_string(),
        })?;

    Ok(FieldSpec {
        field: def.field.clone(),
        attempts,
        kind: schema_field.kind.clone(),
        sentinel: schema_field.sentinel.clone(),
        max_len: schema_field.max_len,
    })
}

fn compile_rule(def: &RuleDefinition, schema: &Schema) -> Result<DerivationRule> {
    let context = || format!("rule {}", def.name);
    require_field(schema, &def.target, context)?;

    for condition in &def.when {
        let field = match condition {
            Condition::IsSentinel(f) | Condition::NotSentinel(f) | Condition::ZeroOrSentinel(f) => f,
            Condition::OneOf { field, .. } => field,
        };
        require_field(schema, field, context)?;
    }

    let transform = match &def.transform {
        TransformDefinition::Copy { source } => Transform::Copy {
            source: source.clone(),
        },
        TransformDefinition::Sum { sources } => {
            if sources.is_empty() {
                return Err(CatalogError::InvalidRule {
                    rule: def.name.clone(),
                    reason: "sum needs at least one source".to_string(),
                });
            }
            Transform::Sum {
                sources: sources.clone(),
            }
        }
        TransformDefinition::Difference {
            minuend,
            subtrahends,
        } => Transform::Difference {
            minuend: minuend.clone(),
            subtrahends: subtrahends.clone(),
        },
        TransformDefinition::Divide { source, divisor } => {
            if *divisor == 0 {
                return Err(CatalogError::InvalidRule {
                    rule: def.name.clone(),
                    reason: "divisor must be non-zero".to_string(),
                });
            }
            Transform::Divide {
                source: source.clone(),
                divisor: Decimal::from(*divisor),
            }
        }
        TransformDefinition::SubExtract {
            source,
            pattern,
            group,
        } => {
            let pattern = compile_pattern(pattern, false, context)?;
            if let GroupSelection::Named(name) = group {
                if !has_group(&pattern, name) {
                    return Err(CatalogError::UnknownGroup {
                        context: context(),
                        group: name.clone(),
                    });
                }
            }
            Transform::SubExtract {
                source: source.clone(),
                pattern,
                selection: group.clone(),
            }
        }
    };

    for source in transform.sources() {
        require_field(schema, source, context)?;
    }

    Ok(DerivationRule {
        name: def.name.clone(),
        target: def.target.clone(),
        when: def.when.clone(),
        transform,
    })
}

fn compile_fixtures(
    definitions: &[FixtureDefinition],
    policy: &Schema,
    endorsement: &Schema,
) -> Result<KnownFixtures> {
    let lookup = |field: &str| policy.field(field).or_else(|| endorsement.field(field));

    let mut fixtures = Vec::with_capacity(definitions.len());
    for def in definitions {
        if lookup(&def.field).is_none() {
            return Err(CatalogError::UnknownFixtureField {
                fixture: def.name.clone(),
                field: def.field.clone(),
            });
        }

        let mut overrides = BTreeMap::new();
        for (field, value) in &def.overrides {
            let declared = lookup(field).ok_or_else(|| CatalogError::UnknownFixtureField {
                fixture: def.name.clone(),
                field: field.clone(),
            })?;
            let normalized = normalize_value(value, &declared.kind, None);
            if normalized.miss || normalized.value.is_empty() {
                return Err(CatalogError::InvalidFixtureValue {
                    fixture: def.name.clone(),
                    field: field.clone(),
                    value: value.clone(),
                    kind: declared.kind.name().to_string(),
                });
            }
            overrides.insert(field.clone(), normalized.value);
        }

        fixtures.push(KnownFixture {
            name: def.name.clone(),
            field: def.field.clone(),
            contains: def.contains.clone(),
            overrides,
        });
    }

    Ok(KnownFixtures::new(fixtures))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "schemas": {
            "policy": [
                {"key": "Número de póliza", "kind": "text", "sentinel": "No disponible"},
                {"key": "Clave Agente", "kind": "text", "sentinel": "No disponible"},
                {"key": "Nombre del agente", "kind": "text", "sentinel": "No disponible"}
            ],
            "endorsement": [
                {"key": "prima_neta", "kind": "currency", "sentinel": "0"}
            ]
        },
        "field_sets": {
            "poliza": [
                {"field": "Número de póliza", "attempts": [{"pattern": "P[óo]liza\\s+(\\w+)"}]}
            ]
        },
        "document_types": [
            {"id": "vida", "kind": "policy", "threshold": 0.5, "markers": ["VIDA", "P[ÓO]LIZA"], "field_sets": ["poliza"]}
        ]
    }"#;

    fn definition() -> CatalogDefinition {
        serde_json::from_str(MINIMAL).unwrap()
    }

    #[test]
    fn test_builtin_catalog_compiles() {
        let catalog = Catalog::builtin().unwrap();

        assert!(!catalog.document_types().is_empty());
        assert!(catalog.schema_for(RecordKind::Policy).contains("Número de póliza"));
        assert!(catalog.schema_for(RecordKind::Endorsement).contains("prima_neta"));

        for (i, doc) in catalog.document_types().iter().enumerate() {
            assert_eq!(doc.priority, i);
        }
    }

    #[test]
    fn test_builtin_schemas_do_not_overlap() {
        let catalog = Catalog::builtin().unwrap();
        let endorsement = catalog.schema_for(RecordKind::Endorsement);

        for key in catalog.schema_for(RecordKind::Policy).keys() {
            assert!(!endorsement.contains(key), "{key} appears in both schemas");
        }
    }

    #[test]
    fn test_unknown_lookups_are_empty() {
        let catalog = Catalog::from_json(MINIMAL).unwrap();

        assert!(catalog.fields_for(&DocumentTypeId::Unknown).is_empty());
        assert!(catalog.rules_for(&DocumentTypeId::Unknown).is_empty());
        assert!(catalog.fields_for(&DocumentTypeId::known("salud")).is_empty());
        assert_eq!(catalog.kind_for(&DocumentTypeId::Unknown), RecordKind::Policy);
        assert_eq!(catalog.fields_for(&DocumentTypeId::known("vida")).len(), 1);
    }

    #[test]
    fn test_field_spec_inherits_schema_sentinel() {
        let catalog = Catalog::from_json(MINIMAL).unwrap();
        let spec = &catalog.fields_for(&DocumentTypeId::known("vida"))[0];

        assert_eq!(spec.sentinel, "No disponible");
        assert_eq!(spec.kind, ValueKind::Text);
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let mut def = definition();
        def.field_sets.get_mut("poliza").unwrap()[0].attempts[0].pattern = "(unclosed".to_string();

        let err = Catalog::compile(def).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidPattern { .. }));
    }

    #[test]
    fn test_field_outside_schema_is_rejected() {
        let mut def = definition();
        def.field_sets.get_mut("poliza").unwrap()[0].field = "prima_neta".to_string();

        let err = Catalog::compile(def).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownField { .. }));
    }

    #[test]
    fn test_unknown_field_set_is_rejected() {
        let mut def = definition();
        def.document_types[0].field_sets.push("missing".to_string());

        let err = Catalog::compile(def).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownFieldSet { .. }));
    }

    #[test]
    fn test_threshold_out_of_range_is_rejected() {
        let mut def = definition();
        def.document_types[0].threshold = 1.5;

        let err = Catalog::compile(def).unwrap_err();
        assert!(matches!(err, CatalogError::ThresholdOutOfRange { .. }));
    }

    #[test]
    fn test_duplicate_document_type_is_rejected() {
        let mut def = definition();
        let copy = def.document_types[0].clone();
        def.document_types.push(copy);

        let err = Catalog::compile(def).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateDocumentType(id) if id == "vida"));
    }

    #[test]
    fn test_compound_target_extracted_earlier_is_rejected() {
        let mut def = definition();
        def.field_sets.insert(
            "agente".to_string(),
            serde_json::from_str(
                r#"[
                    {"field": "Nombre del agente", "attempts": [{"pattern": "Nombre:\\s*(\\w+)"}]},
                    {"field": "Clave Agente", "attempts": [{
                        "pattern": "Agente:\\s*(?P<clave>\\d+)\\s+(?P<nombre>\\w+)",
                        "compound": [
                            {"field": "Clave Agente", "group": "clave"},
                            {"field": "Nombre del agente", "group": "nombre"}
                        ]
                    }]}
                ]"#,
            )
            .unwrap(),
        );
        def.document_types[0].field_sets.push("agente".to_string());

        let err = Catalog::compile(def).unwrap_err();
        assert!(matches!(err, CatalogError::CompoundConflict { .. }));
    }

    #[test]
    fn test_compound_specs_sharing_a_target_are_rejected() {
        let mut def = definition();
        def.field_sets.insert(
            "agente".to_string(),
            serde_json::from_str(
                r#"[
                    {"field": "Clave Agente", "attempts": [{
                        "pattern": "Clave:\\s*(?P<clave>\\d+)\\s+(?P<nombre>\\w+)",
                        "compound": [
                            {"field": "Clave Agente", "group": "clave"},
                            {"field": "Nombre del agente", "group": "nombre"}
                        ]
                    }]},
                    {"field": "Número de póliza", "attempts": [{
                        "pattern": "Póliza\\s+(?P<numero>\\w+)\\s+(?P<nombre>\\w+)",
                        "compound": [
                            {"field": "Número de póliza", "group": "numero"},
                            {"field": "Nombre del agente", "group": "nombre"}
                        ]
                    }]}
                ]"#,
            )
            .unwrap(),
        );
        def.document_types[0].field_sets = vec!["agente".to_string()];

        let err = Catalog::compile(def).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::CompoundConflict { field, target, .. }
                if field == "Número de póliza" && target == "Nombre del agente"
        ));
    }

    #[test]
    fn test_fixture_overrides_are_normalized() {
        let mut def = definition();
        def.known_fixtures = serde_json::from_str(
            r#"[{"name": "endoso_7720015", "field": "Número de póliza", "contains": "7720015",
                 "overrides": {"prima_neta": "$ 1,200", "Nombre del agente": "  ANA   RUIZ "}}]"#,
        )
        .unwrap();

        let catalog = Catalog::compile(def).unwrap();
        let fixture = catalog.fixtures().iter().next().unwrap();
        assert_eq!(fixture.overrides["prima_neta"], "1200.00");
        assert_eq!(fixture.overrides["Nombre del agente"], "ANA RUIZ");
    }

    #[test]
    fn test_fixture_override_of_wrong_kind_is_rejected() {
        let mut def = definition();
        def.known_fixtures = serde_json::from_str(
            r#"[{"name": "endoso_7720015", "field": "Número de póliza", "contains": "7720015",
                 "overrides": {"prima_neta": "AMPARADA"}}]"#,
        )
        .unwrap();

        let err = Catalog::compile(def).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::InvalidFixtureValue { field, .. } if field == "prima_neta"
        ));
    }

    #[test]
    fn test_named_group_must_exist() {
        let mut def = definition();
        def.field_sets.get_mut("poliza").unwrap()[0].attempts[0].group =
            GroupSelection::Named("numero".to_string());

        let err = Catalog::compile(def).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownGroup { .. }));
    }
}
