//! Subcommands and the helpers they share.

pub mod batch;
pub mod catalog;
pub mod config;
pub mod extract;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use poliza_core::extraction::{ExtractionPipeline, PipelineOutput};
use poliza_core::{Catalog, OutputRecord, PolizaConfig};
use tracing::debug;

/// Output format for extracted records.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output (header row plus one record row)
    Csv,
    /// Plain text, one field per line
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("poliza")
        .join("config.json")
}

/// Path given with `--config`, or the per-user default.
pub fn config_path(explicit: Option<&str>) -> PathBuf {
    explicit.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load configuration. An explicit path must exist; the default path is optional.
pub fn load_config(explicit: Option<&str>) -> anyhow::Result<PolizaConfig> {
    if let Some(path) = explicit {
        return Ok(PolizaConfig::from_file(Path::new(path))?);
    }

    let path = default_config_path();
    if path.exists() {
        debug!("Loading config from {}", path.display());
        Ok(PolizaConfig::from_file(&path)?)
    } else {
        Ok(PolizaConfig::default())
    }
}

pub fn load_catalog(config: &PolizaConfig) -> anyhow::Result<Catalog> {
    let catalog = match &config.extraction.catalog_path {
        Some(path) => {
            debug!("Loading catalog from {}", path.display());
            Catalog::from_file(path)?
        }
        None => Catalog::builtin()?,
    };
    Ok(catalog)
}

pub fn build_pipeline(config: &PolizaConfig) -> anyhow::Result<ExtractionPipeline> {
    let catalog = load_catalog(config)?;
    Ok(ExtractionPipeline::from_config(
        Arc::new(catalog),
        &config.extraction,
    ))
}

pub fn format_record(record: &OutputRecord, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(record)?),
        OutputFormat::Csv => format_csv(record),
        OutputFormat::Text => Ok(format_text(record)),
    }
}

/// Like [`format_record`], but JSON and text also carry the document type and diagnostics.
pub fn format_output(output: &PipelineOutput, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(output)?),
        OutputFormat::Csv => format_csv(&output.record),
        OutputFormat::Text => {
            let mut text = format!(
                "Document type: {} ({})\n\n",
                output.document_type, output.kind
            );
            text.push_str(&format_text(&output.record));
            if !output.diagnostics.is_empty() {
                text.push_str("\nDiagnostics:\n");
                for diagnostic in &output.diagnostics {
                    text.push_str(&format!("  - {}\n", diagnostic));
                }
            }
            Ok(text)
        }
    }
}

fn format_csv(record: &OutputRecord) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(record.keys())?;
    wtr.write_record(record.iter().map(|(_, value)| value))?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(record: &OutputRecord) -> String {
    let width = record.keys().map(|k| k.chars().count()).max().unwrap_or(0);
    let mut output = String::new();
    for (key, value) in record.iter() {
        let pad = width - key.chars().count();
        output.push_str(&format!("{}:{} {}\n", key, " ".repeat(pad), value));
    }
    output
}
