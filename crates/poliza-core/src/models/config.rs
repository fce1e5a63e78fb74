//! Configuration structures for the extraction pipeline and its collaborators.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for poliza.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolizaConfig {
    /// Extraction pipeline configuration.
    pub extraction: ExtractionConfig,

    /// PDF text configuration.
    pub pdf: PdfConfig,

    /// Remote document fetching.
    pub fetch: FetchConfig,

    /// HTTP service configuration.
    pub server: ServerConfig,
}

/// Extraction pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Catalog JSON to load instead of the embedded one.
    pub catalog_path: Option<PathBuf>,

    /// Apply the catalog's known-fixture overrides.
    pub apply_known_fixtures: bool,

    /// Report fields that stayed at their sentinel as diagnostics.
    pub report_field_misses: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            apply_known_fixtures: false,
            report_field_misses: true,
        }
    }
}

/// PDF text configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Maximum pages to read (0 = unlimited).
    pub max_pages: usize,

    /// Minimum text length to consider the PDF as having a text layer.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            max_pages: 0,
            min_text_length: 20,
        }
    }
}

/// Remote document fetching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// User agent sent with downloads.
    pub user_agent: String,

    /// Largest accepted document in bytes.
    pub max_bytes: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            user_agent: format!("poliza/{}", env!("CARGO_PKG_VERSION")),
            max_bytes: 50 * 1024 * 1024,
        }
    }
}

/// HTTP service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    pub bind: String,

    /// Documents processed concurrently within one batch request.
    pub batch_concurrency: usize,

    /// Largest accepted batch.
    pub max_batch_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
            batch_concurrency: 4,
            max_batch_size: 50,
        }
    }
}

impl PolizaConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: PolizaConfig =
            serde_json::from_str(r#"{"server": {"batch_concurrency": 8}}"#).unwrap();

        assert_eq!(config.server.batch_concurrency, 8);
        assert_eq!(config.server.max_batch_size, 50);
        assert!(!config.extraction.apply_known_fixtures);
        assert!(config.extraction.report_field_misses);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = PolizaConfig::default();
        config.extraction.apply_known_fixtures = true;
        config.pdf.max_pages = 3;
        config.save(&path).unwrap();

        let loaded = PolizaConfig::from_file(&path).unwrap();
        assert!(loaded.extraction.apply_known_fixtures);
        assert_eq!(loaded.pdf.max_pages, 3);
    }
}
