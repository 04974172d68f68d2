//! GeoJSON serialization of the result set: one Point feature per service,
//! with the service's fields in the properties bag.

use serde::Serialize;

use havenmap_core::distance::display_miles;
use havenmap_core::Service;

#[derive(Debug, Serialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub geometry: Geometry,
    pub properties: FeatureProperties,
}

#[derive(Debug, Serialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// GeoJSON position order: `[longitude, latitude]`.
    pub coordinates: [f64; 2],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureProperties {
    pub name: String,
    pub description: String,
    pub address: String,
    pub postcode: String,
    pub email: String,
    pub website: String,
    pub phone: String,
    pub donate_url: String,
    pub service_types: Vec<String>,
    pub specialisms: Vec<String>,
    pub local_authority: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_miles: Option<f64>,
}

impl FeatureCollection {
    pub fn from_services(services: &[Service]) -> Self {
        Self {
            kind: "FeatureCollection",
            features: services.iter().map(Feature::from).collect(),
        }
    }
}

impl From<&Service> for Feature {
    fn from(service: &Service) -> Self {
        Self {
            kind: "Feature",
            geometry: Geometry {
                kind: "Point",
                coordinates: [service.location.longitude, service.location.latitude],
            },
            properties: FeatureProperties {
                name: service.name.clone(),
                description: service.description.clone(),
                address: service.address.clone(),
                postcode: service.postcode.clone(),
                email: service.email.clone(),
                website: service.website.clone(),
                phone: service.phone.clone(),
                donate_url: service.donate_url.clone(),
                service_types: service.service_types.clone(),
                specialisms: service.specialisms.clone(),
                local_authority: service.local_authority.clone(),
                // Full precision drives sorting upstream; the wire gets 2 dp.
                distance_miles: service.distance_miles.map(display_miles),
            },
        }
    }
}
