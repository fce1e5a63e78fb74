//! Schema-complete record assembly.

use super::normalize::normalize_text;
use crate::catalog::Schema;
use crate::models::record::{NormalizedRecord, OutputRecord};

/// Build an [`OutputRecord`] holding every key of `schema`, in schema order.
/// Missing or blank values take the key's sentinel; values of keys with a
/// `max_len` are truncated here.
pub fn assemble(record: &NormalizedRecord, schema: &Schema) -> OutputRecord {
    let entries = schema
        .fields()
        .iter()
        .map(|field| {
            let value = match record.get(&field.key).filter(|v| !v.trim().is_empty()) {
                Some(value) if field.max_len.is_some() => normalize_text(value, field.max_len),
                Some(value) => value.to_string(),
                None => field.sentinel.clone(),
            };
            (field.key.clone(), value)
        })
        .collect();

    OutputRecord::new(schema.kind(), entries)
}
