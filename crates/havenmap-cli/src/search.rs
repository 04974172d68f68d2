//! Terminal front-end for the search pipeline, against the live store.

use havenmap_core::distance::display_miles;
use havenmap_core::search::{SearchPhase, SearchQuery, SearchSession};
use havenmap_postcodes::{Geocoder, PostcodesClient};

pub async fn run(
    query_text: &str,
    radius: f64,
    service_type: Option<String>,
    specialisms: Vec<String>,
) -> anyhow::Result<()> {
    let pool = havenmap_db::connect_pool_from_env().await?;
    let services = havenmap_db::fetch_approved_services(&pool).await?;

    let geocoder = Geocoder::new(PostcodesClient::new(10)?);

    let mut query = SearchQuery::new(query_text).with_radius(radius);
    query.service_type = service_type.filter(|value| !value.trim().is_empty());
    query.specialisms = specialisms;

    let session = SearchSession::new();
    let Some(state) = session.search(&services, &query, &geocoder).await else {
        anyhow::bail!("search was superseded before completing");
    };

    match state.phase {
        SearchPhase::Failed(failure) => {
            println!("search failed: {failure}");
        }
        _ => {
            if state.results.is_empty() {
                println!("no services matched");
            }
            for service in &state.results {
                match service.distance_miles {
                    Some(distance) => println!(
                        "{:>6.2} mi  {} — {} ({})",
                        display_miles(distance),
                        service.name,
                        service.address,
                        service.postcode
                    ),
                    None => println!(
                        "          {} — {} ({})",
                        service.name, service.address, service.postcode
                    ),
                }
            }
        }
    }

    Ok(())
}
