//! Normalization of heterogeneous raw service records into the canonical
//! [`Service`] shape.
//!
//! Source data arrives in inconsistent shapes: set-valued fields may be
//! arrays, comma-joined strings, or bare scalars; coordinates may be numbers
//! or numeric strings; scalar fields may be missing entirely. This module is
//! the single chokepoint that absorbs all of that. [`normalize`] never fails:
//! any field-level parse problem degrades to a documented default rather than
//! dropping the record.

use serde::Deserialize;
use serde_json::Value;

use crate::service::{Coordinates, Service};

/// A service record as the data store (or a raw export) hands it over,
/// before normalization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub description: Option<Value>,
    #[serde(default)]
    pub address: Option<Value>,
    #[serde(default)]
    pub postcode: Option<Value>,
    #[serde(default)]
    pub email: Option<Value>,
    #[serde(default)]
    pub website: Option<Value>,
    #[serde(default)]
    pub phone: Option<Value>,
    #[serde(default, alias = "donate_url")]
    pub donate_url: Option<Value>,
    #[serde(default, alias = "service_types", alias = "serviceType")]
    pub service_types: Option<Value>,
    #[serde(default, alias = "specialism")]
    pub specialisms: Option<Value>,
    #[serde(default, alias = "local_authority")]
    pub local_authority: Option<Value>,
    #[serde(default)]
    pub approved: Option<Value>,
    #[serde(default, alias = "longitude", alias = "lon")]
    pub lng: Option<Value>,
    #[serde(default, alias = "latitude")]
    pub lat: Option<Value>,
}

/// Converts a raw record into the canonical [`Service`] shape.
///
/// Missing scalar fields default to the empty string, missing `approved`
/// to `false`, and unparseable coordinates to `(0.0, 0.0)`.
#[must_use]
pub fn normalize(raw: &RawRecord) -> Service {
    Service {
        name: coerce_string(raw.name.as_ref()),
        description: coerce_string(raw.description.as_ref()),
        address: coerce_string(raw.address.as_ref()),
        postcode: coerce_string(raw.postcode.as_ref()),
        email: coerce_string(raw.email.as_ref()),
        website: coerce_string(raw.website.as_ref()),
        phone: coerce_string(raw.phone.as_ref()),
        donate_url: coerce_string(raw.donate_url.as_ref()),
        service_types: coerce_string_list(raw.service_types.as_ref()),
        specialisms: coerce_string_list(raw.specialisms.as_ref()),
        local_authority: coerce_string(raw.local_authority.as_ref()),
        approved: coerce_bool(raw.approved.as_ref()),
        location: Coordinates::new(coerce_f64(raw.lng.as_ref()), coerce_f64(raw.lat.as_ref())),
        distance_miles: None,
    }
}

impl From<&Service> for RawRecord {
    /// Re-raws a canonical service. Set-valued fields come back comma-joined,
    /// which is also how the store persists them.
    fn from(service: &Service) -> Self {
        Self {
            name: Some(Value::from(service.name.clone())),
            description: Some(Value::from(service.description.clone())),
            address: Some(Value::from(service.address.clone())),
            postcode: Some(Value::from(service.postcode.clone())),
            email: Some(Value::from(service.email.clone())),
            website: Some(Value::from(service.website.clone())),
            phone: Some(Value::from(service.phone.clone())),
            donate_url: Some(Value::from(service.donate_url.clone())),
            service_types: Some(Value::from(service.service_types.join(", "))),
            specialisms: Some(Value::from(service.specialisms.join(", "))),
            local_authority: Some(Value::from(service.local_authority.clone())),
            approved: Some(Value::from(service.approved)),
            lng: Some(Value::from(service.location.longitude)),
            lat: Some(Value::from(service.location.latitude)),
        }
    }
}

fn coerce_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn coerce_string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| coerce_string(Some(item)))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .map(ToOwned::to_owned)
            .collect(),
        Some(Value::Number(n)) => vec![n.to_string()],
        Some(Value::Bool(true)) => vec!["true".to_string()],
        _ => Vec::new(),
    }
}

fn coerce_f64(value: Option<&Value>) -> f64 {
    value
        .and_then(|v| {
            v.as_f64()
                .or_else(|| v.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
        })
        .unwrap_or(0.0)
}

fn coerce_bool(value: Option<&Value>) -> bool {
    value
        .and_then(|v| {
            v.as_bool()
                .or_else(|| v.as_str().map(|s| s.trim().eq_ignore_ascii_case("true")))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_from_json(value: Value) -> RawRecord {
        serde_json::from_value(value).expect("raw record should deserialize")
    }

    #[test]
    fn comma_joined_string_splits_into_trimmed_entries() {
        let raw = raw_from_json(json!({
            "name": "Haven East",
            "serviceTypes": "Refuge , Outreach,, Helpline ",
        }));

        let service = normalize(&raw);
        assert_eq!(service.service_types, vec!["Refuge", "Outreach", "Helpline"]);
    }

    #[test]
    fn array_entries_are_trimmed_and_empties_dropped() {
        let raw = raw_from_json(json!({
            "specialisms": [" LGBT+ ", "", "Disabled people"],
        }));

        let service = normalize(&raw);
        assert_eq!(service.specialisms, vec!["LGBT+", "Disabled people"]);
    }

    #[test]
    fn scalar_set_field_becomes_single_element() {
        let raw = raw_from_json(json!({ "serviceTypes": 24 }));
        assert_eq!(normalize(&raw).service_types, vec!["24"]);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let service = normalize(&RawRecord::default());

        assert_eq!(service.name, "");
        assert_eq!(service.email, "");
        assert!(service.service_types.is_empty());
        assert!(!service.approved);
        assert_eq!(service.location, Coordinates::unset());
        assert!(service.distance_miles.is_none());
    }

    #[test]
    fn coordinates_accept_numbers_and_numeric_strings() {
        let raw = raw_from_json(json!({ "lng": "-0.1419", "lat": 51.501 }));
        let service = normalize(&raw);

        assert!((service.location.longitude - (-0.1419)).abs() < f64::EPSILON);
        assert!((service.location.latitude - 51.501).abs() < f64::EPSILON);
    }

    #[test]
    fn unparseable_coordinates_degrade_to_zero() {
        let raw = raw_from_json(json!({ "lng": "not-a-number", "lat": {"nested": true} }));
        assert_eq!(normalize(&raw).location, Coordinates::unset());
    }

    #[test]
    fn approved_accepts_bool_and_string_forms() {
        assert!(normalize(&raw_from_json(json!({ "approved": true }))).approved);
        assert!(normalize(&raw_from_json(json!({ "approved": "True" }))).approved);
        assert!(!normalize(&raw_from_json(json!({ "approved": "no" }))).approved);
        assert!(!normalize(&raw_from_json(json!({}))).approved);
    }

    #[test]
    fn snake_case_aliases_are_accepted() {
        let raw = raw_from_json(json!({
            "service_types": ["Refuge"],
            "local_authority": "Hackney",
            "longitude": -0.07,
            "latitude": 51.51,
        }));
        let service = normalize(&raw);

        assert_eq!(service.service_types, vec!["Refuge"]);
        assert_eq!(service.local_authority, "Hackney");
        assert!((service.location.latitude - 51.51).abs() < f64::EPSILON);
    }

    #[test]
    fn normalization_is_idempotent() {
        let raw = raw_from_json(json!({
            "name": "  Safe Harbour ",
            "serviceTypes": "Refuge, Advocacy",
            "specialisms": ["Women", " Children "],
            "approved": "true",
            "lng": "-1.25",
            "lat": "52.95",
        }));

        let once = normalize(&raw);
        let twice = normalize(&RawRecord::from(&once));
        assert_eq!(once, twice);
    }
}
