//! Facet filtering over the normalized record set.
//!
//! Three facets compose by logical AND: service type, specialism, and free
//! text. Within the specialism facet, selected values combine by OR. An
//! empty facet is the identity filter. Because each facet is a pure set
//! predicate, application order never changes the result — only how much
//! work later facets see.

use crate::service::Service;

/// Applies the service-type, specialism, and free-text facets.
///
/// `service_type: None` (or empty), an empty `specialisms` slice, and
/// `text: None` (or empty) are all no-ops.
#[must_use]
pub fn apply_facets(
    services: &[Service],
    service_type: Option<&str>,
    specialisms: &[String],
    text: Option<&str>,
) -> Vec<Service> {
    services
        .iter()
        .filter(|service| matches_service_type(service, service_type))
        .filter(|service| matches_specialisms(service, specialisms))
        .filter(|service| matches_text(service, text))
        .cloned()
        .collect()
}

fn matches_service_type(service: &Service, facet: Option<&str>) -> bool {
    match facet.map(str::trim) {
        None | Some("") => true,
        Some(wanted) => service
            .service_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(wanted)),
    }
}

fn matches_specialisms(service: &Service, selected: &[String]) -> bool {
    if selected.is_empty() {
        return true;
    }
    // OR across the selection: any overlap keeps the record.
    selected.iter().any(|wanted| {
        service
            .specialisms
            .iter()
            .any(|s| s.eq_ignore_ascii_case(wanted.trim()))
    })
}

fn matches_text(service: &Service, query: Option<&str>) -> bool {
    match query.map(str::trim) {
        None | Some("") => true,
        Some(query) => {
            let query = query.to_lowercase();
            service.name.to_lowercase().contains(&query)
                || service.address.to_lowercase().contains(&query)
                || service.local_authority.to_lowercase().contains(&query)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::Coordinates;

    fn service(name: &str, types: &[&str], specs: &[&str]) -> Service {
        Service {
            name: name.to_string(),
            description: String::new(),
            address: format!("{name} House, 1 High Street"),
            postcode: "E1 6AN".to_string(),
            email: String::new(),
            website: String::new(),
            phone: String::new(),
            donate_url: String::new(),
            service_types: types.iter().map(ToString::to_string).collect(),
            specialisms: specs.iter().map(ToString::to_string).collect(),
            local_authority: "Tower Hamlets".to_string(),
            approved: true,
            location: Coordinates::unset(),
            distance_miles: None,
        }
    }

    fn fixture() -> Vec<Service> {
        vec![
            service("City Refuge", &["Refuge"], &["Women"]),
            service("Open Door Outreach", &["Outreach"], &["Children"]),
            service("North Helpline", &["Helpline", "Refuge"], &["Men"]),
        ]
    }

    #[test]
    fn empty_facets_are_identity() {
        let services = fixture();
        let result = apply_facets(&services, None, &[], None);
        assert_eq!(result, services);

        let result = apply_facets(&services, Some(""), &[], Some("  "));
        assert_eq!(result, services);
    }

    #[test]
    fn service_type_facet_keeps_members_only() {
        let services = fixture();
        let result = apply_facets(&services, Some("Refuge"), &[], None);
        let names: Vec<&str> = result.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["City Refuge", "North Helpline"]);
    }

    #[test]
    fn specialism_facet_is_or_across_selection() {
        let services = fixture();
        let selected = vec!["Women".to_string(), "Men".to_string()];
        let result = apply_facets(&services, None, &selected, None);
        let names: Vec<&str> = result.iter().map(|s| s.name.as_str()).collect();
        // Records satisfying only one selected value each are both kept.
        assert_eq!(names, vec!["City Refuge", "North Helpline"]);
    }

    #[test]
    fn free_text_matches_name_case_insensitively() {
        let services = fixture();
        let result = apply_facets(&services, None, &[], Some("refuge"));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "City Refuge");
        assert!(result[0].distance_miles.is_none());
    }

    #[test]
    fn free_text_matches_local_authority() {
        let services = fixture();
        let result = apply_facets(&services, None, &[], Some("tower hamlets"));
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn facets_compose_by_and() {
        let services = fixture();
        let selected = vec!["Men".to_string()];
        let result = apply_facets(&services, Some("Refuge"), &selected, None);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "North Helpline");
    }

    #[test]
    fn facet_application_order_is_commutative() {
        let services = fixture();
        let selected = vec!["Women".to_string(), "Men".to_string()];

        let combined = apply_facets(&services, Some("Refuge"), &selected, Some("refuge"));

        // Same facets applied one at a time, in a different order.
        let step1 = apply_facets(&services, None, &[], Some("refuge"));
        let step2 = apply_facets(&step1, None, &selected, None);
        let step3 = apply_facets(&step2, Some("Refuge"), &[], None);

        assert_eq!(combined, step3);
    }
}
