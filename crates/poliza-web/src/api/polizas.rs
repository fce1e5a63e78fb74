//! Extraction endpoints: one document, or a batch processed concurrently.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use futures_util::{StreamExt, stream};
use poliza_core::{AcquisitionError, DocumentTypeId, OutputRecord, PipelineOutput, RecordKind};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/polizas", post(extract_poliza))
        .route("/batch", post(extract_batch))
}

#[derive(Debug, Deserialize)]
pub struct PolizaRequest {
    pub pdf_url: String,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub pdf_urls: Vec<String>,
}

/// Outcome for one document. Serialized with a `status` tag.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentResult {
    Success {
        pdf_url: String,
        document_type: DocumentTypeId,
        kind: RecordKind,
        data: OutputRecord,
        warnings: Vec<String>,
        processing_time_ms: u64,
    },
    Error {
        pdf_url: String,
        error: String,
    },
}

impl DocumentResult {
    fn from_outcome(pdf_url: String, outcome: Result<PipelineOutput, AcquisitionError>) -> Self {
        match outcome {
            Ok(output) => DocumentResult::Success {
                pdf_url,
                warnings: output.warnings().map(ToString::to_string).collect(),
                document_type: output.document_type,
                kind: output.kind,
                data: output.record,
                processing_time_ms: output.processing_time_ms,
            },
            Err(e) => DocumentResult::Error {
                pdf_url,
                error: e.to_string(),
            },
        }
    }

    fn is_success(&self) -> bool {
        matches!(self, DocumentResult::Success { .. })
    }
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<DocumentResult>,
}

fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"status": "error", "error": message.into()})),
    )
        .into_response()
}

/// Acquire the text, then run the pipeline. Only acquisition can fail.
async fn process_document(
    state: &AppState,
    pdf_url: String,
) -> DocumentResult {
    let outcome = match state.source.acquire_text(&pdf_url).await {
        Ok(text) => Ok(state.pipeline.run(&text)),
        Err(e) => {
            warn!("Acquisition failed for {}: {}", pdf_url, e);
            Err(e)
        }
    };
    DocumentResult::from_outcome(pdf_url, outcome)
}

async fn extract_poliza(
    State(state): State<AppState>,
    body: Result<Json<PolizaRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    if request.pdf_url.trim().is_empty() {
        return bad_request("pdf_url must not be empty");
    }

    let result = process_document(&state, request.pdf_url).await;
    let status = if result.is_success() {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    };

    (status, Json(result)).into_response()
}

async fn extract_batch(
    State(state): State<AppState>,
    body: Result<Json<BatchRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    let total = request.pdf_urls.len();
    if total == 0 {
        return bad_request("pdf_urls must not be empty");
    }
    if total > state.config.max_batch_size {
        return bad_request(format!(
            "batch of {} exceeds the limit of {}",
            total, state.config.max_batch_size
        ));
    }

    let results: Vec<DocumentResult> = stream::iter(request.pdf_urls)
        .map(|pdf_url| process_document(&state, pdf_url))
        .buffered(state.config.batch_concurrency.max(1))
        .collect()
        .await;

    let succeeded = results.iter().filter(|r| r.is_success()).count();
    info!("Batch finished: {}/{} succeeded", succeeded, total);

    Json(BatchResponse {
        total,
        succeeded,
        failed: total - succeeded,
        results,
    })
    .into_response()
}
