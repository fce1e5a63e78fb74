use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use poliza_core::RecordKind;
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/document-types", get(list_document_types))
}

#[derive(Debug, Serialize)]
pub struct DocumentTypeSummary {
    pub priority: usize,
    pub id: String,
    pub name: String,
    pub kind: RecordKind,
    pub threshold: f64,
    pub markers: usize,
    pub fields: Vec<String>,
    pub rules: Vec<String>,
}

/// Document types in classification priority order.
async fn list_document_types(State(state): State<AppState>) -> impl IntoResponse {
    let summaries: Vec<DocumentTypeSummary> = state
        .pipeline
        .catalog()
        .document_types()
        .iter()
        .map(|t| DocumentTypeSummary {
            priority: t.priority,
            id: t.id.clone(),
            name: t.name.clone(),
            kind: t.kind,
            threshold: t.threshold,
            markers: t.markers.len(),
            fields: t.fields.iter().map(|f| f.field.clone()).collect(),
            rules: t.rules.iter().map(|r| r.name.clone()).collect(),
        })
        .collect();

    Json(summaries)
}
