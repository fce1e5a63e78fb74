//! Error types for the poliza-core library.
//!
//! Data-quality problems (a field that is not found, a value that does not
//! parse) are never errors: they surface as [`Diagnostic`]s on the pipeline
//! output. Only catalog compilation and document acquisition fail.
//!
//! [`Diagnostic`]: crate::extraction::Diagnostic

use thiserror::Error;

/// Main error type for the poliza library.
#[derive(Error, Debug)]
pub enum PolizaError {
    /// Catalog loading or compilation error.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Document acquisition error.
    #[error("acquisition error: {0}")]
    Acquisition(#[from] AcquisitionError),

    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while compiling a catalog into a registry.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The catalog JSON could not be parsed.
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    /// The catalog file could not be read.
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    /// A regex in the catalog failed to compile.
    #[error("invalid pattern in {context}: {source}")]
    InvalidPattern {
        context: String,
        #[source]
        source: regex::Error,
    },

    /// A document type references a field set that does not exist.
    #[error("document type {doc_type} references unknown field set {name}")]
    UnknownFieldSet { doc_type: String, name: String },

    /// A document type references a rule set that does not exist.
    #[error("document type {doc_type} references unknown rule set {name}")]
    UnknownRuleSet { doc_type: String, name: String },

    /// A field or rule names a key that is not part of the record schema.
    #[error("{context}: field {field} is not declared in the {kind} schema")]
    UnknownField {
        context: String,
        field: String,
        kind: String,
    },

    /// A selection policy names a capture group the pattern does not define.
    #[error("{context}: pattern has no capture group named {group}")]
    UnknownGroup { context: String, group: String },

    /// Two document types share an id.
    #[error("duplicate document type id: {0}")]
    DuplicateDocumentType(String),

    /// A document type declares no markers.
    #[error("document type {0} declares no markers")]
    NoMarkers(String),

    /// Threshold must be a ratio in (0, 1].
    #[error("document type {doc_type} has threshold {threshold} outside (0, 1]")]
    ThresholdOutOfRange { doc_type: String, threshold: f64 },

    /// A compound attempt targets a field that an earlier spec already extracts.
    #[error(
        "document type {doc_type}: compound attempt for {field} also fills {target}, which is extracted earlier"
    )]
    CompoundConflict {
        doc_type: String,
        field: String,
        target: String,
    },

    /// A compound attempt must fill the field it belongs to.
    #[error("{context}: compound attempt does not fill its own field {field}")]
    CompoundWithoutOwnField { context: String, field: String },

    /// A derivation rule is malformed.
    #[error("rule {rule}: {reason}")]
    InvalidRule { rule: String, reason: String },

    /// A schema declares the same key twice.
    #[error("{kind} schema declares {key} twice")]
    DuplicateSchemaKey { kind: String, key: String },

    /// A fixture names a field outside every schema.
    #[error("known fixture {fixture}: unknown field {field}")]
    UnknownFixtureField { fixture: String, field: String },

    /// A fixture override does not parse as its field's kind.
    #[error("known fixture {fixture}: '{value}' is not a valid {kind} for {field}")]
    InvalidFixtureValue {
        fixture: String,
        field: String,
        value: String,
        kind: String,
    },
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// The PDF carries no text layer (scanned image).
    #[error("PDF has no text layer ({chars} characters extracted)")]
    NoTextLayer { chars: usize },
}

/// Failure to obtain a document's text. Fatal for that document only.
#[derive(Error, Debug)]
pub enum AcquisitionError {
    /// The remote server answered with a non-success status.
    #[error("HTTP {status} fetching {location}")]
    HttpStatus { location: String, status: u16 },

    /// The request could not be completed.
    #[error("failed to fetch {location}: {reason}")]
    Network { location: String, reason: String },

    /// The document exceeds the configured size cap.
    #[error("{location} exceeds {limit} bytes")]
    TooLarge { location: String, limit: u64 },

    /// The location is not a supported URL or path.
    #[error("unsupported document location: {0}")]
    UnsupportedLocation(String),

    /// Local file access failed.
    #[error("failed to read {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    /// The bytes were fetched but no text could be produced.
    #[error("failed to render {location}: {source}")]
    Pdf {
        location: String,
        #[source]
        source: PdfError,
    },
}

/// Result type for the poliza library.
pub type Result<T> = std::result::Result<T, PolizaError>;
