//! Marker-based document classification.

use serde::Serialize;
use tracing::{debug, trace};

use crate::catalog::{Catalog, DocumentType};
use crate::models::record::DocumentTypeId;

// Absorbs float error when a threshold equals an exact marker ratio (e.g. 4/5 vs 0.8).
const SCORE_EPSILON: f64 = 1e-9;

/// Marker score of one document type against a text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeScore {
    pub id: String,
    pub priority: usize,
    pub matches: usize,
    pub total: usize,
    pub score: f64,
    pub threshold: f64,
    pub qualifies: bool,
}

/// Classifies text against the catalog's document types in priority order.
pub struct Classifier<'a> {
    catalog: &'a Catalog,
}

impl<'a> Classifier<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Return the first document type, in priority order, whose score meets
    /// its threshold. Later types are not scored once one qualifies.
    pub fn classify(&self, text: &str) -> DocumentTypeId {
        for doc in self.catalog.document_types() {
            let score = score(doc, text);
            trace!(
                "{}: {}/{} markers (score {:.2}, threshold {:.2})",
                doc.id, score.matches, score.total, score.score, doc.threshold
            );
            if score.qualifies {
                debug!("Classified as {} (score {:.2})", doc.id, score.score);
                return DocumentTypeId::known(doc.id.clone());
            }
        }

        debug!("No document type reached its threshold");
        DocumentTypeId::Unknown
    }

    /// Score every document type, in priority order.
    pub fn scores(&self, text: &str) -> Vec<TypeScore> {
        self.catalog
            .document_types()
            .iter()
            .map(|doc| score(doc, text))
            .collect()
    }
}

fn score(doc: &DocumentType, text: &str) -> TypeScore {
    let matches = doc.markers.iter().filter(|m| m.is_match(text)).count();
    let total = doc.markers.len();
    let score = if total == 0 {
        0.0
    } else {
        matches as f64 / total as f64
    };

    TypeScore {
        id: doc.id.clone(),
        priority: doc.priority,
        matches,
        total,
        score,
        threshold: doc.threshold,
        qualifies: score + SCORE_EPSILON >= doc.threshold,
    }
}
