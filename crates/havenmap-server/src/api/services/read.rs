//! Read handlers: the GeoJSON service listing and the facet vocabulary.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use havenmap_core::search::{SearchPhase, SearchQuery, SearchSession, DEFAULT_RADIUS_MILES};
use havenmap_core::{postcode, vocabulary, GeocodeFailure};

use crate::middleware::RequestId;

use super::super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};
use super::geojson::FeatureCollection;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicesQuery {
    pub postcode: Option<String>,
    pub radius: Option<f64>,
    pub service_type: Option<String>,
    /// Comma-joined, matching the address-bar state format.
    pub specialisms: Option<String>,
    pub q: Option<String>,
}

/// GET /api/v1/services — the filtered (and, given a postcode, distance-
/// ranked) result set as a GeoJSON `FeatureCollection`.
///
/// Store trouble degrades to an empty collection rather than failing the
/// page; malformed and unresolvable postcodes are 400s with distinct codes.
pub async fn list_services(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<ServicesQuery>,
) -> Result<Json<FeatureCollection>, ApiError> {
    if let Some(raw) = params.postcode.as_deref() {
        if !postcode::is_postcode_shaped(raw) {
            return Err(ApiError::new(
                req_id.0,
                "invalid_postcode",
                format!("'{raw}' is not a valid UK postcode"),
            ));
        }
    }

    let services = match havenmap_db::fetch_approved_services(&state.pool).await {
        Ok(services) => services,
        Err(e) => {
            tracing::error!(error = %e, "failed to fetch services; serving empty result set");
            Vec::new()
        }
    };

    let raw_input = params
        .postcode
        .clone()
        .or_else(|| params.q.clone())
        .unwrap_or_default();

    let mut query = SearchQuery::new(raw_input).with_radius(
        params.radius.unwrap_or(DEFAULT_RADIUS_MILES),
    );
    query.service_type = params
        .service_type
        .clone()
        .filter(|value| !value.trim().is_empty());
    query.specialisms = params
        .specialisms
        .as_deref()
        .map(split_csv)
        .unwrap_or_default();

    let session = SearchSession::new();
    let outcome = session
        .search(&services, &query, state.geocoder.as_ref())
        .await
        .ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                "internal_error",
                "search was superseded before completing",
            )
        })?;

    match outcome.phase {
        SearchPhase::Failed(GeocodeFailure::InvalidFormat) => Err(ApiError::new(
            req_id.0,
            "invalid_postcode",
            "the supplied postcode is not a valid UK postcode",
        )),
        SearchPhase::Failed(GeocodeFailure::NotFound) => Err(ApiError::new(
            req_id.0,
            "postcode_not_found",
            "no location found for that postcode; try a nearby one",
        )),
        SearchPhase::Failed(GeocodeFailure::Transient) => Err(ApiError::new(
            req_id.0,
            "internal_error",
            "postcode lookup is temporarily unavailable; please retry",
        )),
        _ => Ok(Json(FeatureCollection::from_services(&outcome.results))),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetsData {
    pub service_types: Vec<String>,
    pub specialisms: Vec<String>,
}

/// GET /api/v1/services/facets — distinct service types and specialisms
/// across the approved set, in first-appearance order, for filter controls.
pub async fn list_facets(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<FacetsData>>, ApiError> {
    let services = havenmap_db::fetch_approved_services(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: FacetsData {
            service_types: vocabulary::service_types(&services),
            specialisms: vocabulary::specialisms(&services),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_csv_trims_and_drops_empties() {
        assert_eq!(
            split_csv("Women, Children,,  LGBT+ "),
            vec!["Women", "Children", "LGBT+"]
        );
        assert!(split_csv("").is_empty());
    }
}
