//! Literal overrides for specific, known documents.
//!
//! These are kept apart from the derivation rules and only consulted when
//! `extraction.apply_known_fixtures` is enabled. An override never replaces
//! an extracted value; it only fills fields still at their sentinel.

use std::collections::BTreeMap;

use tracing::debug;

use super::normalize::fold;
use crate::catalog::Schema;
use crate::models::record::NormalizedRecord;

/// One override entry, matched by a substring of an identifying field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownFixture {
    pub name: String,
    pub field: String,
    pub contains: String,
    pub overrides: BTreeMap<String, String>,
}

impl KnownFixture {
    fn matches(&self, record: &NormalizedRecord) -> bool {
        record
            .get(&self.field)
            .is_some_and(|value| fold(value).contains(&fold(&self.contains)))
    }
}

/// A fixture that filled at least one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedFixture {
    pub fixture: String,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct KnownFixtures {
    entries: Vec<KnownFixture>,
}

impl KnownFixtures {
    pub fn new(entries: Vec<KnownFixture>) -> Self {
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = &KnownFixture> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fill sentinel fields of `record` from every matching fixture.
    pub fn apply(
        &self,
        record: &NormalizedRecord,
        schema: &Schema,
    ) -> (NormalizedRecord, Vec<AppliedFixture>) {
        let mut current = record.clone();
        let mut applied = Vec::new();

        for fixture in self.entries.iter().filter(|f| f.matches(record)) {
            let mut fields = Vec::new();
            for (field, value) in &fixture.overrides {
                if schema.contains(field) && schema.is_unset(field, current.get(field)) {
                    current.insert(field.clone(), value.clone());
                    fields.push(field.clone());
                }
            }

            if !fields.is_empty() {
                debug!("Known fixture {} filled {} fields", fixture.name, fields.len());
                applied.push(AppliedFixture {
                    fixture: fixture.name.clone(),
                    fields,
                });
            }
        }

        (current, applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::models::record::RecordKind;

    fn fixtures() -> KnownFixtures {
        KnownFixtures::new(vec![KnownFixture {
            name: "plan_1059331H".to_string(),
            field: "Número de póliza".to_string(),
            contains: "1059331h".to_string(),
            overrides: BTreeMap::from([
                ("Nombre del plan".to_string(), "VIDA TEMPORAL PROTGT 20".to_string()),
                ("Moneda".to_string(), "USD".to_string()),
            ]),
        }])
    }

    #[test]
    fn test_fixture_fills_only_sentinel_fields() {
        let catalog = Catalog::builtin().unwrap();
        let schema = catalog.schema_for(RecordKind::Policy);
        let record: NormalizedRecord = [("Número de póliza", "1059331H"), ("Moneda", "MXN")]
            .into_iter()
            .collect();

        let (updated, applied) = fixtures().apply(&record, schema);

        assert_eq!(updated.get("Nombre del plan"), Some("VIDA TEMPORAL PROTGT 20"));
        assert_eq!(updated.get("Moneda"), Some("MXN"));
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].fields, vec!["Nombre del plan".to_string()]);
    }

    #[test]
    fn test_fixture_ignores_other_documents() {
        let catalog = Catalog::builtin().unwrap();
        let schema = catalog.schema_for(RecordKind::Policy);
        let record: NormalizedRecord = [("Número de póliza", "7720015")].into_iter().collect();

        let (updated, applied) = fixtures().apply(&record, schema);
        assert_eq!(updated, record);
        assert!(applied.is_empty());
    }
}
