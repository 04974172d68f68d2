//! Distinct facet vocabularies for populating filter controls.

use std::collections::HashSet;

use crate::service::Service;

/// Flattens a set-valued field across all services into the ordered list of
/// distinct values, preserving first-appearance order and excluding empties.
///
/// Pure and idempotent: calling it twice on the same input yields the same
/// ordered output.
#[must_use]
pub fn distinct_values<F>(services: &[Service], select: F) -> Vec<String>
where
    F: Fn(&Service) -> &[String],
{
    let mut seen = HashSet::new();
    let mut ordered = Vec::new();

    for service in services {
        for value in select(service) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            if seen.insert(value.to_string()) {
                ordered.push(value.to_string());
            }
        }
    }

    ordered
}

/// Distinct service types across the record set, in first-appearance order.
#[must_use]
pub fn service_types(services: &[Service]) -> Vec<String> {
    distinct_values(services, |s| &s.service_types)
}

/// Distinct specialisms across the record set, in first-appearance order.
#[must_use]
pub fn specialisms(services: &[Service]) -> Vec<String> {
    distinct_values(services, |s| &s.specialisms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::Coordinates;

    fn service(name: &str, types: &[&str], specs: &[&str]) -> Service {
        Service {
            name: name.to_string(),
            description: String::new(),
            address: String::new(),
            postcode: String::new(),
            email: String::new(),
            website: String::new(),
            phone: String::new(),
            donate_url: String::new(),
            service_types: types.iter().map(ToString::to_string).collect(),
            specialisms: specs.iter().map(ToString::to_string).collect(),
            local_authority: String::new(),
            approved: true,
            location: Coordinates::unset(),
            distance_miles: None,
        }
    }

    #[test]
    fn preserves_first_appearance_order_and_dedupes() {
        let services = vec![
            service("a", &["Refuge", "Helpline"], &[]),
            service("b", &["Outreach", "Refuge"], &[]),
        ];

        assert_eq!(
            service_types(&services),
            vec!["Refuge", "Helpline", "Outreach"]
        );
    }

    #[test]
    fn excludes_empty_values() {
        let services = vec![service("a", &["", "  ", "Advocacy"], &[])];
        assert_eq!(service_types(&services), vec!["Advocacy"]);
    }

    #[test]
    fn is_idempotent() {
        let services = vec![
            service("a", &[], &["Women", "Children"]),
            service("b", &[], &["Children", "Men"]),
        ];

        let first = specialisms(&services);
        let second = specialisms(&services);
        assert_eq!(first, second);
        assert_eq!(first, vec!["Women", "Children", "Men"]);
    }
}
