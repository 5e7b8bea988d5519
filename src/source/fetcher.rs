//! Feature service fetcher

use super::types::{Feature, FeatureCollection};
use crate::config::SourceConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig, RequestConfig};
use tracing::{debug, info, warn};

/// Reads features from an ArcGIS feature-service query endpoint
#[derive(Debug, Clone)]
pub struct FeatureServiceSource {
    config: SourceConfig,
}

impl FeatureServiceSource {
    /// Create a source for the given query settings
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }

    /// Query settings
    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Build an unauthenticated HTTP client suited to this source
    pub fn http_client(&self) -> Result<HttpClient> {
        let config = HttpClientConfig::builder()
            .timeout(self.config.timeout())
            .build();
        HttpClient::with_config(config)
    }

    /// Fetch every feature
    ///
    /// Without a page size this is exactly one GET. With one, pages are
    /// requested by `resultOffset` until the service stops reporting
    /// `exceededTransferLimit` or returns an empty page.
    pub async fn fetch_records(&self, client: &HttpClient) -> Result<Vec<Feature>> {
        info!("Fetching features from {}", self.config.url);

        let Some(page_size) = self.config.page_size else {
            let collection = self.fetch_page(client, None).await?;
            let truncated = collection.exceeded_transfer_limit();
            let features = extract_features(collection)?;
            if truncated {
                warn!(
                    "Feature service truncated the result at {} records; set source.page_size to page through it",
                    features.len()
                );
            }
            info!("Fetched {} features", features.len());
            return Ok(features);
        };

        let mut features = Vec::new();
        let mut offset: u64 = 0;
        loop {
            let collection = self.fetch_page(client, Some((offset, page_size))).await?;
            let more = collection.exceeded_transfer_limit();
            let page = extract_features(collection)?;
            debug!("Page at offset {} returned {} features", offset, page.len());

            let page_len = page.len() as u64;
            features.extend(page);

            if !more || page_len == 0 {
                break;
            }
            offset += page_len;
        }

        info!("Fetched {} features", features.len());
        Ok(features)
    }

    /// Issue one query request
    async fn fetch_page(
        &self,
        client: &HttpClient,
        page: Option<(u64, u32)>,
    ) -> Result<FeatureCollection> {
        let mut request = RequestConfig::new();
        for (key, value) in &self.config.params {
            request = request.query(key, value);
        }
        if let Some((offset, size)) = page {
            request = request
                .query("resultOffset", offset.to_string())
                .query("resultRecordCount", size.to_string());
        }

        let collection: FeatureCollection =
            client.get_json_with_config(&self.config.url, request).await?;

        if let Some(error) = &collection.error {
            return Err(Error::SourceService {
                code: error.code,
                message: error.full_message(),
            });
        }

        Ok(collection)
    }
}

fn extract_features(collection: FeatureCollection) -> Result<Vec<Feature>> {
    collection.features.ok_or_else(|| Error::RecordExtraction {
        path: "features".to_string(),
        message: "response has no 'features' array".to_string(),
    })
}
