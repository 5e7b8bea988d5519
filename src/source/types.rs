//! GeoJSON response types

use crate::types::{JsonObject, JsonValue};
use serde::Deserialize;

/// Field name read from the feature's top level instead of `properties`
pub const IDENTIFIER_KEY: &str = "id";

/// `FeatureCollection` envelope returned by `f=geojson` queries
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeatureCollection {
    /// Features; absent when the service answered with something else
    #[serde(default)]
    pub features: Option<Vec<Feature>>,

    /// Collection-level properties (ArcGIS puts `exceededTransferLimit` here)
    #[serde(default)]
    pub properties: Option<JsonObject>,

    /// Top-level transfer limit flag, used by some server versions
    #[serde(default, rename = "exceededTransferLimit")]
    pub exceeded_transfer_limit: Option<bool>,

    /// Error object; ArcGIS reports query errors with HTTP 200
    #[serde(default)]
    pub error: Option<ServiceError>,
}

impl FeatureCollection {
    /// Whether the service truncated the result set
    pub fn exceeded_transfer_limit(&self) -> bool {
        if self.exceeded_transfer_limit == Some(true) {
            return true;
        }
        self.properties
            .as_ref()
            .and_then(|props| props.get("exceededTransferLimit"))
            .and_then(JsonValue::as_bool)
            .unwrap_or(false)
    }
}

/// Error payload of a failed ArcGIS query
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Vec<String>,
}

impl ServiceError {
    /// Message with details appended
    pub fn full_message(&self) -> String {
        if self.details.is_empty() {
            self.message.clone()
        } else {
            format!("{} ({})", self.message, self.details.join("; "))
        }
    }
}

/// One GeoJSON feature
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Feature {
    /// Attribute map; may be null on the wire
    #[serde(default)]
    pub properties: Option<JsonObject>,

    /// Every other top-level member (`id`, `type`, `geometry`, ...)
    #[serde(flatten)]
    pub members: JsonObject,
}

impl Feature {
    /// Look up a field: the identifier from the top level, anything else
    /// from `properties`
    pub fn get(&self, field: &str) -> Option<&JsonValue> {
        if field == IDENTIFIER_KEY {
            self.members.get(field)
        } else {
            self.properties.as_ref().and_then(|props| props.get(field))
        }
    }

    /// Top-level feature id
    pub fn id(&self) -> Option<&JsonValue> {
        self.members.get(IDENTIFIER_KEY)
    }
}
