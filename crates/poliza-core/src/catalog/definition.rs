//! Serialized shape of a catalog file.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::types::{CompoundTarget, Condition, GroupSelection, SchemaField};
use crate::models::record::RecordKind;

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogDefinition {
    pub schemas: SchemaDefinitions,
    #[serde(default)]
    pub field_sets: BTreeMap<String, Vec<FieldDefinition>>,
    #[serde(default)]
    pub rule_sets: BTreeMap<String, Vec<RuleDefinition>>,
    /// Checked in array order; earlier entries win.
    pub document_types: Vec<DocumentTypeDefinition>,
    #[serde(default)]
    pub known_fixtures: Vec<FixtureDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchemaDefinitions {
    pub policy: Vec<SchemaField>,
    pub endorsement: Vec<SchemaField>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentTypeDefinition {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub kind: RecordKind,
    pub threshold: f64,
    pub markers: Vec<String>,
    #[serde(default)]
    pub field_sets: Vec<String>,
    #[serde(default)]
    pub rule_sets: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldDefinition {
    pub field: String,
    pub attempts: Vec<AttemptDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttemptDefinition {
    pub pattern: String,
    #[serde(default)]
    pub group: GroupSelection,
    #[serde(default)]
    pub compound: Vec<CompoundTarget>,
    #[serde(default)]
    pub case_sensitive: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuleDefinition {
    pub name: String,
    pub target: String,
    #[serde(default)]
    pub when: Vec<Condition>,
    pub transform: TransformDefinition,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformDefinition {
    Copy {
        source: String,
    },
    Sum {
        sources: Vec<String>,
    },
    Difference {
        minuend: String,
        subtrahends: Vec<String>,
    },
    Divide {
        source: String,
        divisor: u32,
    },
    SubExtract {
        source: String,
        pattern: String,
        #[serde(default)]
        group: GroupSelection,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureDefinition {
    pub name: String,
    /// Field whose value identifies the document.
    pub field: String,
    /// Substring that must appear in that field.
    pub contains: String,
    pub overrides: BTreeMap<String, String>,
}
