//! Field cascade execution.

use tracing::trace;

use crate::catalog::FieldSpec;
use crate::models::record::ExtractionResult;

/// Run every field cascade over `text`.
///
/// For each spec the first attempt that yields a value wins. Compound
/// attempts fill all of their fields from one match or none; one that would
/// touch an already filled field counts as not matching. A spec whose field
/// was already filled by an earlier compound attempt is skipped.
pub fn extract(text: &str, specs: &[FieldSpec]) -> ExtractionResult {
    let mut result = ExtractionResult::new();

    for spec in specs {
        if result.contains(&spec.field) {
            trace!("{} already filled, skipping its cascade", spec.field);
            continue;
        }

        let found = spec.attempts.iter().enumerate().find_map(|(i, attempt)| {
            let values = attempt.apply(text, &spec.field)?;
            if let Some((taken, _)) = values.iter().find(|(field, _)| result.contains(field)) {
                trace!("{} attempt #{} skipped: {} already filled", spec.field, i + 1, taken);
                return None;
            }
            Some((i, values))
        });

        match found {
            Some((index, values)) => {
                trace!("{} matched attempt #{}", spec.field, index + 1);
                for (field, value) in values {
                    result.insert(field, value);
                }
            }
            None => trace!("{}: no attempt matched", spec.field),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Attempt, CompoundTarget, GroupSelection, ValueKind};
    use pretty_assertions::assert_eq;
    use regex::Regex;

    fn spec(field: &str, attempts: Vec<Attempt>) -> FieldSpec {
        FieldSpec {
            field: field.to_string(),
            attempts,
            kind: ValueKind::Text,
            sentinel: "No disponible".to_string(),
            max_len: None,
        }
    }

    fn attempt(pattern: &str) -> Attempt {
        Attempt {
            pattern: Regex::new(pattern).unwrap(),
            selection: GroupSelection::FirstNonEmpty,
            compound: Vec::new(),
        }
    }

    fn agent_compound() -> Attempt {
        Attempt {
            pattern: Regex::new(r"Agente:\s*(?P<clave>\d+)[ \t]+(?P<nombre>[^\n]+)").unwrap(),
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
        }
    }

    #[test]
    fn test_first_successful_attempt_wins() {
        let specs = vec![spec(
            "Número de póliza",
            vec![
                attempt(r"Número de póliza:\s*(\w+)"),
                attempt(r"Póliza\s+(\w+)"),
                attempt(r"(\d{7}[A-Z])"),
            ],
        )];

        let result = extract("Póliza 1059331H\nRef 7654321Z", &specs);
        assert_eq!(result.get("Número de póliza"), Some("1059331H"));
    }

    #[test]
    fn test_empty_capture_falls_through() {
        let specs = vec![spec(
            "Plan",
            vec![attempt(r"Plan:[ \t]*([^\n]*)"), attempt(r"Producto:\s*([^\n]+)")],
        )];

        let result = extract("Plan:\nProducto: VIDA PLUS", &specs);
        assert_eq!(result.get("Plan"), Some("VIDA PLUS"));
    }

    #[test]
    fn test_no_match_leaves_field_absent() {
        let specs = vec![spec("RFC", vec![attempt(r"RFC:\s*(\w{13})")])];
        assert!(extract("sin datos", &specs).is_empty());
        assert!(extract("anything", &[]).is_empty());
    }

    #[test]
    fn test_compound_fills_all_fields_and_skips_later_spec() {
        let specs = vec![
            spec("Clave Agente", vec![agent_compound()]),
            spec(
                "Nombre del agente",
                vec![attempt(r"Promotor:\s*([^\n]+)")],
            ),
        ];

        let result = extract("Agente: 045821 MARIA LOPEZ\nPromotor: OTRO", &specs);
        assert_eq!(result.get("Clave Agente"), Some("045821"));
        assert_eq!(result.get("Nombre del agente"), Some("MARIA LOPEZ"));
    }

    #[test]
    fn test_compound_overlapping_filled_field_falls_through() {
        let compound = |field: &str, label: &str| Attempt {
            pattern: Regex::new(&format!(r"{label}=(?P<own>\w+) C=(?P<shared>\w+)")).unwrap(),
            selection: GroupSelection::FirstNonEmpty,
            compound: vec![
                CompoundTarget {
                    field: field.to_string(),
                    group: "own".to_string(),
                },
                CompoundTarget {
                    field: "C".to_string(),
                    group: "shared".to_string(),
                },
            ],
        };
        let specs = vec![
            spec("A", vec![compound("A", "A")]),
            spec("B", vec![compound("B", "B"), attempt(r"B=(\w+)")]),
        ];

        let result = extract("A=one C=first\nB=two C=second", &specs);
        assert_eq!(result.get("A"), Some("one"));
        assert_eq!(result.get("C"), Some("first"));
        // B's compound match is refused as a whole; its plain fallback fills B
        assert_eq!(result.get("B"), Some("two"));
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_partial_compound_match_populates_nothing() {
        let specs = vec![
            spec(
                "Clave Agente",
                vec![agent_compound(), attempt(r"Clave:\s*(\d+)")],
            ),
            spec(
                "Nombre del agente",
                vec![attempt(r"Promotor:\s*([^\n]+)")],
            ),
        ];

        // The compound regex does not match without a name, so the fallbacks run.
        let result = extract("Agente: 045821 \nClave: 99\nPromotor: ANA", &specs);
        assert_eq!(result.get("Clave Agente"), Some("99"));
        assert_eq!(result.get("Nombre del agente"), Some("ANA"));
    }
}
