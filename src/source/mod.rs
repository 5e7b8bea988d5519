//! Feature service source
//!
//! Fetches GeoJSON features from an ArcGIS feature-service `query` endpoint.
//!
//! # Overview
//!
//! - `FeatureServiceSource::fetch_records` issues the query (one request by
//!   default, offset paging when a page size is configured)
//! - Non-success statuses, service error bodies and payloads without a
//!   `features` array are reported as errors

mod fetcher;
mod types;

pub use fetcher::FeatureServiceSource;
pub use types::{Feature, FeatureCollection, ServiceError, IDENTIFIER_KEY};
