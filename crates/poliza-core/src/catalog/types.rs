//! Compiled catalog entities. Immutable once the catalog is built.

use std::collections::{BTreeMap, HashMap};

use regex::{Captures, Regex};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::models::record::RecordKind;

/// Declared kind of a field value, deciding how it is normalized.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// Free text, whitespace-collapsed.
    Text,
    /// Currency or plain number, formatted with two decimals.
    Currency,
    /// Date, rendered as `dd/mm/yyyy`.
    Date,
    /// Closed vocabulary with synonyms.
    Enumerated(EnumSpec),
}

impl ValueKind {
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Text => "text",
            ValueKind::Currency => "currency",
            ValueKind::Date => "date",
            ValueKind::Enumerated(_) => "enumerated",
        }
    }
}

/// Allowed values of an enumerated field and the synonyms that map onto them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EnumSpec {
    pub values: Vec<String>,
    pub aliases: BTreeMap<String, String>,
}

/// How a matching attempt turns capture groups into a value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupSelection {
    /// First capture group, left to right, that matched something non-empty.
    #[default]
    #[serde(rename = "first_nonempty")]
    FirstNonEmpty,
    /// The capture group with this name.
    Named(String),
    /// The whole match.
    FullMatch,
}

impl GroupSelection {
    /// Select a trimmed, non-empty value from `caps`.
    pub fn select(&self, caps: &Captures<'_>) -> Option<String> {
        let picked = match self {
            GroupSelection::FirstNonEmpty => caps
                .iter()
                .skip(1)
                .flatten()
                .map(|m| m.as_str().trim())
                .find(|s| !s.is_empty()),
            GroupSelection::Named(name) => caps.name(name).map(|m| m.as_str().trim()),
            GroupSelection::FullMatch => caps.get(0).map(|m| m.as_str().trim()),
        };
        picked.filter(|s| !s.is_empty()).map(str::to_string)
    }
}

/// One output of a compound attempt.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompoundTarget {
    pub field: String,
    pub group: String,
}

/// One regex in a field's cascade.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub pattern: Regex,
    pub selection: GroupSelection,
    /// Non-empty for compound attempts; lists every field the match fills.
    pub compound: Vec<CompoundTarget>,
}

impl Attempt {
    /// Apply this attempt to `text`, returning every `(field, value)` it
    /// fills, or `None` if it does not match or a required group is empty.
    pub fn apply(&self, text: &str, field: &str) -> Option<Vec<(String, String)>> {
        let caps = self.pattern.captures(text)?;

        if self.compound.is_empty() {
            let value = self.selection.select(&caps)?;
            return Some(vec![(field.to_string(), value)]);
        }

        self.compound
            .iter()
            .map(|target| {
                GroupSelection::Named(target.group.clone())
                    .select(&caps)
                    .map(|value| (target.field.clone(), value))
            })
            .collect()
    }

    pub fn is_compound(&self) -> bool {
        !self.compound.is_empty()
    }
}

/// How one output field is extracted.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub field: String,
    pub attempts: Vec<Attempt>,
    pub kind: ValueKind,
    pub sentinel: String,
    pub max_len: Option<usize>,
}

/// A document template: markers for classification plus its field and rule tables.
#[derive(Debug, Clone)]
pub struct DocumentType {
    pub id: String,
    pub name: String,
    pub kind: RecordKind,
    /// Position in the global priority list (0 = checked first).
    pub priority: usize,
    pub markers: Vec<Regex>,
    /// Ratio of markers that must match.
    pub threshold: f64,
    pub fields: Vec<FieldSpec>,
    pub rules: Vec<DerivationRule>,
}

/// One key of a record schema.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SchemaField {
    pub key: String,
    pub kind: ValueKind,
    pub sentinel: String,
    #[serde(default)]
    pub max_len: Option<usize>,
}

impl SchemaField {
    /// Whether the sentinel is itself a member of the field's vocabulary.
    pub fn sentinel_is_value(&self) -> bool {
        match &self.kind {
            ValueKind::Enumerated(spec) => spec.values.iter().any(|v| v == &self.sentinel),
            _ => false,
        }
    }
}

/// The full key set of one record kind, in output order.
#[derive(Debug, Clone)]
pub struct Schema {
    kind: RecordKind,
    fields: Vec<SchemaField>,
    index: HashMap<String, usize>,
}

impl Schema {
    pub(crate) fn new(kind: RecordKind, fields: Vec<SchemaField>) -> Self {
        let index = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.key.clone(), i))
            .collect();
        Self { kind, fields, index }
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&SchemaField> {
        self.index.get(key).map(|&i| &self.fields[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.key.as_str())
    }

    pub fn sentinel(&self, key: &str) -> Option<&str> {
        self.field(key).map(|f| f.sentinel.as_str())
    }

    /// Whether `value` counts as "not extracted" for `key`.
    ///
    /// A sentinel that is also a legal value of its field (`Moneda` defaults
    /// to `MXN`) cannot mark absence, so for such keys only a missing or blank
    /// value is unset.
    pub fn is_unset(&self, key: &str, value: Option<&str>) -> bool {
        match value {
            None => true,
            Some(v) if v.trim().is_empty() => true,
            Some(v) => self
                .field(key)
                .is_some_and(|f| f.sentinel == v && !f.sentinel_is_value()),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Guard evaluated before a derivation rule fires.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Field is absent or at its sentinel.
    IsSentinel(String),
    /// Field holds an extracted value.
    NotSentinel(String),
    /// Field is unset or numerically zero.
    ZeroOrSentinel(String),
    /// Field is set and equal (accent/case-insensitively) to one of `values`.
    OneOf { field: String, values: Vec<String> },
}

/// What a derivation rule computes.
#[derive(Debug, Clone)]
pub enum Transform {
    Copy { source: String },
    Sum { sources: Vec<String> },
    Difference { minuend: String, subtrahends: Vec<String> },
    Divide { source: String, divisor: Decimal },
    SubExtract {
        source: String,
        pattern: Regex,
        selection: GroupSelection,
    },
}

impl Transform {
    /// Fields this transform reads.
    pub fn sources(&self) -> Vec<&str> {
        match self {
            Transform::Copy { source }
            | Transform::Divide { source, .. }
            | Transform::SubExtract { source, .. } => vec![source.as_str()],
            Transform::Sum { sources } => sources.iter().map(String::as_str).collect(),
            Transform::Difference {
                minuend,
                subtrahends,
            } => std::iter::once(minuend.as_str())
                .chain(subtrahends.iter().map(String::as_str))
                .collect(),
        }
    }
}

/// Cross-field fallback applied after normalization.
#[derive(Debug, Clone)]
pub struct DerivationRule {
    pub name: String,
    pub target: String,
    pub when: Vec<Condition>,
    pub transform: Transform,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(pattern: &str, selection: GroupSelection) -> Attempt {
        Attempt {
            pattern: Regex::new(pattern).unwrap(),
            selection,
            compound: Vec::new(),
        }
    }

    #[test]
    fn test_first_nonempty_skips_unmatched_groups() {
        let a = attempt(r"(?:A:(\d+))|(?:B:(\d+))", GroupSelection::FirstNonEmpty);
        assert_eq!(
            a.apply("B:42", "f"),
            Some(vec![("f".to_string(), "42".to_string())])
        );
    }

    #[test]
    fn test_named_group_missing_is_none() {
        let a = attempt(
            r"(?P<num>\d+)?x",
            GroupSelection::Named("num".to_string()),
        );
        assert_eq!(a.apply("x", "f"), None);
    }

    #[test]
    fn test_full_match_is_trimmed() {
        let a = attempt(r"\s*AUTOS\s*", GroupSelection::FullMatch);
        assert_eq!(
            a.apply("  AUTOS  ", "ramo"),
            Some(vec![("ramo".to_string(), "AUTOS".to_string())])
        );
    }

    #[test]
    fn test_compound_requires_every_group() {
        let a = Attempt {
            pattern: Regex::new(r"Agente:\s*(?P<clave>\d*)\s*(?P<nombre>[A-Z ]*)").unwrap(),
            selection: GroupSelection::FirstNonEmpty,
            compound: vec![
                CompoundTarget {
                    field: "Clave Agente".to_string(),
                    group: "clave".to_string(),
                },
                CompoundTarget {
                    field: "Nombre del agente".to_string(),
                    group: "nombre".to_string(),
                },
            ],
        };

        assert_eq!(a.apply("Agente: PEDRO", "Clave Agente"), None);
        assert_eq!(
            a.apply("Agente: 77 PEDRO", "Clave Agente"),
            Some(vec![
                ("Clave Agente".to_string(), "77".to_string()),
                ("Nombre del agente".to_string(), "PEDRO".to_string()),
            ])
        );
    }

    #[test]
    fn test_schema_is_unset() {
        let schema = Schema::new(
            RecordKind::Policy,
            vec![SchemaField {
                key: "Prima Neta".to_string(),
                kind: ValueKind::Currency,
                sentinel: "0".to_string(),
                max_len: None,
            }],
        );

        assert!(schema.is_unset("Prima Neta", None));
        assert!(schema.is_unset("Prima Neta", Some("0")));
        assert!(schema.is_unset("Prima Neta", Some("  ")));
        assert!(!schema.is_unset("Prima Neta", Some("0.00")));
    }

    #[test]
    fn test_vocabulary_sentinel_counts_as_set() {
        let schema = Schema::new(
            RecordKind::Policy,
            vec![SchemaField {
                key: "Moneda".to_string(),
                kind: ValueKind::Enumerated(EnumSpec {
                    values: vec!["MXN".to_string(), "USD".to_string()],
                    aliases: BTreeMap::new(),
                }),
                sentinel: "MXN".to_string(),
                max_len: None,
            }],
        );

        assert!(schema.is_unset("Moneda", None));
        assert!(schema.is_unset("Moneda", Some("")));
        assert!(!schema.is_unset("Moneda", Some("MXN")));
        assert!(!schema.is_unset("Moneda", Some("USD")));
    }

    #[test]
    fn test_value_kind_deserializes() {
        let kind: ValueKind = serde_json::from_str(r#""currency""#).unwrap();
        assert_eq!(kind, ValueKind::Currency);

        let kind: ValueKind =
            serde_json::from_str(r#"{"enumerated": {"values": ["MXN"], "aliases": {"PESOS": "MXN"}}}"#)
                .unwrap();
        assert_eq!(kind.name(), "enumerated");

        let selection: GroupSelection = serde_json::from_str(r#"{"named": "clave"}"#).unwrap();
        assert_eq!(selection, GroupSelection::Named("clave".to_string()));
    }
}
