//! Cross-field derivation rules.
//!
//! Rules run once each, in declared order, over the normalized record. A rule
//! fires only when its target is unset and all of its guards hold; a value it
//! writes is visible to the rules after it but never overwritten by them.

use rust_decimal::Decimal;
use tracing::debug;

use super::normalize::{Normalized, fold, format_amount, normalize_value, parse_amount};
use crate::catalog::{Condition, DerivationRule, Schema, Transform};
use crate::models::record::NormalizedRecord;

/// A rule that wrote a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedRule {
    pub rule: String,
    pub field: String,
}

/// Output of [`resolve`].
#[derive(Debug, Clone)]
pub struct Resolution {
    pub record: NormalizedRecord,
    pub applied: Vec<AppliedRule>,
}

/// Apply `rules` to `record` in a single sweep.
pub fn resolve(record: &NormalizedRecord, rules: &[DerivationRule], schema: &Schema) -> Resolution {
    let mut current = record.clone();
    let mut applied = Vec::new();

    for rule in rules {
        if !schema.is_unset(&rule.target, current.get(&rule.target)) {
            continue;
        }
        if !rule.when.iter().all(|c| holds(c, &current, schema)) {
            continue;
        }

        let Some(value) = evaluate(rule, &current, schema) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }

        debug!("Rule {} set {} = {}", rule.name, rule.target, value);
        current = current.with(rule.target.clone(), value);
        applied.push(AppliedRule {
            rule: rule.name.clone(),
            field: rule.target.clone(),
        });
    }

    Resolution {
        record: current,
        applied,
    }
}

fn holds(condition: &Condition, record: &NormalizedRecord, schema: &Schema) -> bool {
    match condition {
        Condition::IsSentinel(field) => schema.is_unset(field, record.get(field)),
        Condition::NotSentinel(field) => !schema.is_unset(field, record.get(field)),
        Condition::ZeroOrSentinel(field) => {
            schema.is_unset(field, record.get(field))
                || record
                    .get(field)
                    .and_then(parse_amount)
                    .is_some_and(|amount| amount.is_zero())
        }
        Condition::OneOf { field, values } => match set_value(record, schema, field) {
            Some(value) => {
                let value = fold(value);
                values.iter().any(|candidate| fold(candidate) == value)
            }
            None => false,
        },
    }
}

fn set_value<'r>(record: &'r NormalizedRecord, schema: &Schema, field: &str) -> Option<&'r str> {
    let value = record.get(field);
    if schema.is_unset(field, value) {
        None
    } else {
        value
    }
}

fn amount(record: &NormalizedRecord, schema: &Schema, field: &str) -> Option<Decimal> {
    set_value(record, schema, field).and_then(parse_amount)
}

fn evaluate(rule: &DerivationRule, record: &NormalizedRecord, schema: &Schema) -> Option<String> {
    let target = schema.field(&rule.target)?;

    match &rule.transform {
        Transform::Copy { source } => {
            let value = set_value(record, schema, source)?;
            fitting(normalize_value(value, &target.kind, None))
        }
        Transform::Sum { sources } => {
            let total = sources
                .iter()
                .map(|s| amount(record, schema, s))
                .sum::<Option<Decimal>>()?;
            non_negative(total)
        }
        Transform::Difference {
            minuend,
            subtrahends,
        } => {
            let base = amount(record, schema, minuend)?;
            let deductions = subtrahends
                .iter()
                .map(|s| amount(record, schema, s))
                .sum::<Option<Decimal>>()?;
            non_negative(base - deductions)
        }
        Transform::Divide { source, divisor } => {
            let value = amount(record, schema, source)?;
            non_negative(value.checked_div(*divisor)?)
        }
        Transform::SubExtract {
            source,
            pattern,
            selection,
        } => {
            let value = set_value(record, schema, source)?;
            let caps = pattern.captures(value)?;
            let captured = selection.select(&caps)?;
            fitting(normalize_value(&captured, &target.kind, None))
        }
    }
}

/// A derived value is written only when it parses as the target's kind.
fn fitting(normalized: Normalized) -> Option<String> {
    if normalized.miss {
        None
    } else {
        Some(normalized.value)
    }
}

fn non_negative(amount: Decimal) -> Option<String> {
    if amount.is_sign_negative() && !amount.is_zero() {
        None
    } else {
        Some(format_amount(amount.abs()))
    }
}
