use serde::{Deserialize, Serialize};

/// A WGS84 longitude/latitude pair, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinates {
    #[must_use]
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Placeholder for records whose source row carried no usable
    /// coordinates. Never special-cased by the pipeline.
    #[must_use]
    pub const fn unset() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl Default for Coordinates {
    fn default() -> Self {
        Self::unset()
    }
}

/// A support service in canonical form.
///
/// Produced by [`crate::normalize::normalize`]; read-only within the
/// pipeline. `distance_miles` is attached per-query by the distance ranker
/// and is never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub name: String,
    pub description: String,
    pub address: String,
    pub postcode: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub donate_url: String,
    pub service_types: Vec<String>,
    pub specialisms: Vec<String>,
    #[serde(default)]
    pub local_authority: String,
    pub approved: bool,
    pub location: Coordinates,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub distance_miles: Option<f64>,
}
