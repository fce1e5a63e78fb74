use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use tracing::{debug, info};

use super::{DocumentSource, render_pdf};
use crate::error::AcquisitionError;
use crate::models::config::{FetchConfig, PdfConfig};

/// Downloads PDFs over HTTP(S) and renders their text layer.
pub struct HttpSource {
    client: reqwest::Client,
    max_bytes: u64,
    pdf: PdfConfig,
}

impl HttpSource {
    pub fn new(fetch: &FetchConfig, pdf: &PdfConfig) -> Result<Self, AcquisitionError> {
        let client = reqwest::Client::builder()
            .user_agent(&fetch.user_agent)
            .timeout(Duration::from_secs(fetch.timeout_secs))
            .build()
            .map_err(|e| AcquisitionError::Network {
                location: "client".to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            max_bytes: fetch.max_bytes,
            pdf: pdf.clone(),
        })
    }

    /// Download `url` into memory, enforcing the size cap.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, AcquisitionError> {
        let network = |e: reqwest::Error| AcquisitionError::Network {
            location: url.to_string(),
            reason: e.to_string(),
        };
        let too_large = || AcquisitionError::TooLarge {
            location: url.to_string(),
            limit: self.max_bytes,
        };

        let response = self.client.get(url).send().await.map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AcquisitionError::HttpStatus {
                location: url.to_string(),
                status: status.as_u16(),
            });
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_bytes {
                return Err(too_large());
            }
            debug!("Downloading {} ({} bytes)", url, content_length);
        }

        let mut data = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(network)?;
            if (data.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(too_large());
            }
            data.extend_from_slice(&chunk);
        }

        info!("Downloaded {} bytes from {}", data.len(), url);
        Ok(data)
    }
}

#[async_trait]
impl DocumentSource for HttpSource {
    async fn acquire_text(&self, location: &str) -> Result<String, AcquisitionError> {
        let data = self.fetch_bytes(location).await?;
        render_pdf(location, data, &self.pdf).await
    }
}
