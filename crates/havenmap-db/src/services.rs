//! Database operations for the `services` table.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use havenmap_core::{normalize, RawRecord, Service};

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// Input record for inserting a service.
///
/// Set-valued fields arrive comma-joined, exactly as the import pipeline
/// produced them; the canonical split happens on read.
#[derive(Debug, Clone, Default)]
pub struct NewService {
    pub name: String,
    pub description: String,
    pub address: String,
    pub postcode: String,
    pub email: String,
    pub website: String,
    pub phone: String,
    pub donate_url: String,
    pub service_types: String,
    pub specialisms: String,
    pub local_authority: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A row from the `services` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ServiceRow {
    pub id: i64,
    pub public_id: Uuid,
    pub name: String,
    pub description: String,
    pub address: String,
    pub postcode: String,
    pub email: String,
    pub website: String,
    pub phone: String,
    pub donate_url: String,
    pub service_types: String,
    pub specialisms: String,
    pub local_authority: String,
    pub approved: bool,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Identifiers of a freshly inserted service.
#[derive(Debug, Clone, Copy)]
pub struct InsertedService {
    pub id: i64,
    pub public_id: Uuid,
}

/// A row still waiting for coordinates, as the seed geocoding pass sees it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UnlocatedService {
    pub id: i64,
    pub postcode: String,
}

impl From<ServiceRow> for RawRecord {
    /// Re-raws a store row for the normalization chokepoint. Coordinates are
    /// `NUMERIC(9,6)` in the store; a lossless `f64` conversion always
    /// exists at that precision.
    fn from(row: ServiceRow) -> Self {
        Self {
            name: Some(Value::from(row.name)),
            description: Some(Value::from(row.description)),
            address: Some(Value::from(row.address)),
            postcode: Some(Value::from(row.postcode)),
            email: Some(Value::from(row.email)),
            website: Some(Value::from(row.website)),
            phone: Some(Value::from(row.phone)),
            donate_url: Some(Value::from(row.donate_url)),
            service_types: Some(Value::from(row.service_types)),
            specialisms: Some(Value::from(row.specialisms)),
            local_authority: Some(Value::from(row.local_authority)),
            approved: Some(Value::from(row.approved)),
            lng: row.longitude.and_then(|d| d.to_f64()).map(Value::from),
            lat: row.latitude.and_then(|d| d.to_f64()).map(Value::from),
        }
    }
}

// ---------------------------------------------------------------------------
// Read operations
// ---------------------------------------------------------------------------

/// Lists all approved service rows, ordered by name for stable display.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_approved_services(pool: &PgPool) -> Result<Vec<ServiceRow>, sqlx::Error> {
    sqlx::query_as::<_, ServiceRow>(
        "SELECT id, public_id, name, description, address, postcode, email, website, phone, \
                donate_url, service_types, specialisms, local_authority, approved, \
                latitude, longitude, created_at, updated_at \
         FROM services WHERE approved = TRUE ORDER BY name, id",
    )
    .fetch_all(pool)
    .await
}

/// The pipeline's boundary with the data store: fetches approved rows and
/// normalizes them into canonical [`Service`] values. Unapproved records
/// never leave this function.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`](crate::DbError) if the query fails; the caller
/// decides whether to degrade to an empty set.
pub async fn fetch_approved_services(pool: &PgPool) -> Result<Vec<Service>, crate::DbError> {
    let rows = list_approved_services(pool).await?;
    Ok(rows
        .into_iter()
        .map(|row| normalize(&RawRecord::from(row)))
        .collect())
}

/// Lists approved rows that have no stored coordinates yet, for the seed
/// geocoding pass.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_services_missing_coordinates(
    pool: &PgPool,
) -> Result<Vec<UnlocatedService>, sqlx::Error> {
    sqlx::query_as::<_, UnlocatedService>(
        "SELECT id, postcode FROM services \
         WHERE (latitude IS NULL OR longitude IS NULL) AND postcode <> '' \
         ORDER BY id",
    )
    .fetch_all(pool)
    .await
}

// ---------------------------------------------------------------------------
// Write operations
// ---------------------------------------------------------------------------

/// Inserts a new service row. Rows are always created unapproved and stay
/// invisible to the read path until approved out-of-band.
///
/// Latitude and longitude are bound as `Option<f64>` and cast to
/// `NUMERIC(9,6)` inside the SQL statement so that the database engine
/// performs the type coercion consistently.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the insert fails.
pub async fn insert_service(
    pool: &PgPool,
    service: &NewService,
) -> Result<InsertedService, sqlx::Error> {
    let row: (i64, Uuid) = sqlx::query_as(
        "INSERT INTO services \
             (name, description, address, postcode, email, website, phone, donate_url, \
              service_types, specialisms, local_authority, approved, latitude, longitude) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, FALSE, \
                 $12::NUMERIC(9,6), $13::NUMERIC(9,6)) \
         RETURNING id, public_id",
    )
    .bind(&service.name)
    .bind(&service.description)
    .bind(&service.address)
    .bind(&service.postcode)
    .bind(&service.email)
    .bind(&service.website)
    .bind(&service.phone)
    .bind(&service.donate_url)
    .bind(&service.service_types)
    .bind(&service.specialisms)
    .bind(&service.local_authority)
    .bind(service.latitude)
    .bind(service.longitude)
    .fetch_one(pool)
    .await?;

    Ok(InsertedService {
        id: row.0,
        public_id: row.1,
    })
}

/// Marks a service as approved, admitting it to the read path.
///
/// Returns `true` if a row was updated.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the update fails.
pub async fn approve_service(pool: &PgPool, public_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE services SET approved = TRUE, updated_at = NOW() WHERE public_id = $1",
    )
    .bind(public_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Stores geocoded coordinates against a row.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the update fails.
pub async fn set_service_coordinates(
    pool: &PgPool,
    id: i64,
    longitude: f64,
    latitude: f64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE services \
         SET longitude = $2::NUMERIC(9,6), latitude = $3::NUMERIC(9,6), updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(longitude)
    .bind(latitude)
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_new_service(name: &str, postcode: &str) -> NewService {
        NewService {
            name: name.to_string(),
            description: "Confidential support".to_string(),
            address: "1 High Street".to_string(),
            postcode: postcode.to_string(),
            service_types: "Refuge, Helpline".to_string(),
            specialisms: "Women, Children".to_string(),
            local_authority: "Westminster".to_string(),
            latitude: Some(51.5010),
            longitude: Some(-0.1419),
            ..NewService::default()
        }
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn inserted_services_start_unapproved_and_hidden(pool: PgPool) {
        let inserted = insert_service(&pool, &sample_new_service("Haven East", "E1 6AN"))
            .await
            .expect("insert");

        let visible = fetch_approved_services(&pool).await.expect("fetch");
        assert!(visible.is_empty(), "unapproved rows must stay hidden");

        let approved = approve_service(&pool, inserted.public_id)
            .await
            .expect("approve");
        assert!(approved);

        let visible = fetch_approved_services(&pool).await.expect("fetch");
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "Haven East");
        assert!(visible[0].approved);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn fetched_rows_come_back_normalized(pool: PgPool) {
        let inserted = insert_service(&pool, &sample_new_service("City Refuge", "SW1A 1AA"))
            .await
            .expect("insert");
        approve_service(&pool, inserted.public_id)
            .await
            .expect("approve");

        let services = fetch_approved_services(&pool).await.expect("fetch");
        assert_eq!(services.len(), 1);
        let service = &services[0];

        // Comma-joined storage splits back into canonical sets.
        assert_eq!(service.service_types, vec!["Refuge", "Helpline"]);
        assert_eq!(service.specialisms, vec!["Women", "Children"]);
        assert!((service.location.latitude - 51.5010).abs() < 1e-6);
        assert!((service.location.longitude - (-0.1419)).abs() < 1e-6);
        assert!(service.distance_miles.is_none());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn missing_coordinates_are_listed_and_settable(pool: PgPool) {
        let mut unlocated = sample_new_service("North Helpline", "M1 1AE");
        unlocated.latitude = None;
        unlocated.longitude = None;
        let inserted = insert_service(&pool, &unlocated).await.expect("insert");

        let pending = list_services_missing_coordinates(&pool)
            .await
            .expect("list pending");
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].postcode, "M1 1AE");

        set_service_coordinates(&pool, inserted.id, -2.2374, 53.4808)
            .await
            .expect("set coordinates");

        let pending = list_services_missing_coordinates(&pool)
            .await
            .expect("list pending");
        assert!(pending.is_empty());
    }
}
