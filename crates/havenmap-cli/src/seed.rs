//! Seed import: read a heterogeneous service export, normalize it through
//! the canonical chokepoint, and insert it into the store.

use std::path::Path;

use futures::StreamExt;

use havenmap_core::{normalize, Coordinates, RawRecord};
use havenmap_db::NewService;
use havenmap_postcodes::{Geocoder, PostcodesClient};

/// Parallel geocode lookups during the backfill pass.
const GEOCODE_CONCURRENCY: usize = 4;

pub async fn run(path: &Path, geocode: bool, approve: bool) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(path)?;
    let records: Vec<RawRecord> = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => serde_yaml::from_str(&raw)?,
        _ => serde_json::from_str(&raw)?,
    };
    tracing::info!(count = records.len(), file = %path.display(), "loaded export");

    let pool = havenmap_db::connect_pool_from_env().await?;
    havenmap_db::run_migrations(&pool).await?;

    let mut inserted = 0usize;
    let mut skipped = 0usize;
    for record in &records {
        let service = normalize(record);
        if service.name.is_empty() {
            skipped += 1;
            continue;
        }

        let has_location = service.location != Coordinates::unset();
        let new_service = NewService {
            name: service.name.clone(),
            description: service.description.clone(),
            address: service.address.clone(),
            postcode: service.postcode.clone(),
            email: service.email.clone(),
            website: service.website.clone(),
            phone: service.phone.clone(),
            donate_url: service.donate_url.clone(),
            service_types: service.service_types.join(", "),
            specialisms: service.specialisms.join(", "),
            local_authority: service.local_authority.clone(),
            latitude: has_location.then_some(service.location.latitude),
            longitude: has_location.then_some(service.location.longitude),
        };

        let row = havenmap_db::insert_service(&pool, &new_service).await?;
        if approve || service.approved {
            havenmap_db::approve_service(&pool, row.public_id).await?;
        }
        inserted += 1;
    }
    tracing::info!(inserted, skipped, "seed import complete");

    if geocode {
        geocode_missing(&pool).await?;
    }

    Ok(())
}

/// Backfills coordinates for rows that imported without any, so approved
/// data never carries the `(0,0)` placeholder into distance ranking.
async fn geocode_missing(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let geocoder = Geocoder::new(PostcodesClient::new(10)?);
    let pending = havenmap_db::list_services_missing_coordinates(pool).await?;
    tracing::info!(count = pending.len(), "geocoding rows without coordinates");

    let outcomes: Vec<_> = futures::stream::iter(pending.into_iter().map(|row| {
        let geocoder = &geocoder;
        async move { (row.id, row.postcode.clone(), geocoder.geocode(&row.postcode).await) }
    }))
    .buffer_unordered(GEOCODE_CONCURRENCY)
    .collect()
    .await;

    let mut located = 0usize;
    for (id, postcode, outcome) in outcomes {
        match outcome {
            Ok(coordinates) => {
                havenmap_db::set_service_coordinates(
                    pool,
                    id,
                    coordinates.longitude,
                    coordinates.latitude,
                )
                .await?;
                located += 1;
            }
            Err(failure) => {
                tracing::warn!(id, postcode, failure = %failure, "could not geocode row");
            }
        }
    }
    tracing::info!(located, "geocode backfill complete");

    Ok(())
}
