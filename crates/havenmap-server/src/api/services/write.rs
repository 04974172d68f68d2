//! Admin write path: create a service record.

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use havenmap_core::postcode;
use havenmap_db::NewService;

use crate::middleware::RequestId;

use super::super::{ApiError, ApiResponse, AppState, ResponseMeta};

// Required fields are Options so that absence surfaces as our own
// validation_error rather than a body-rejection from the extractor.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub postcode: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub donate_url: String,
    #[serde(default)]
    pub service_types: Vec<String>,
    #[serde(default)]
    pub specialisms: Vec<String>,
    #[serde(default)]
    pub local_authority: String,
}

#[derive(Debug, serde::Serialize)]
pub struct CreateServiceResponse {
    pub id: Uuid,
}

/// POST /api/v1/services — create a service record.
///
/// Requires `name`, `address`, and a shape-valid `postcode`. New records are
/// stored unapproved and stay out of the read path until approved
/// out-of-band.
pub async fn create_service(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateServiceRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreateServiceResponse>>), ApiError> {
    let rid = req_id.0.as_str();

    let name = body.name.as_deref().map(str::trim).unwrap_or_default();
    let address = body.address.as_deref().map(str::trim).unwrap_or_default();
    let postcode_value = body.postcode.as_deref().map(str::trim).unwrap_or_default();

    let mut missing = Vec::new();
    if name.is_empty() {
        missing.push("name");
    }
    if address.is_empty() {
        missing.push("address");
    }
    if postcode_value.is_empty() {
        missing.push("postcode");
    }
    if !missing.is_empty() {
        return Err(ApiError::new(
            rid,
            "validation_error",
            format!("missing required fields: {}", missing.join(", ")),
        ));
    }

    if !postcode::is_postcode_shaped(postcode_value) {
        return Err(ApiError::new(
            rid,
            "validation_error",
            format!("'{postcode_value}' is not a valid UK postcode"),
        ));
    }

    let new_service = NewService {
        name: name.to_owned(),
        description: body.description.trim().to_owned(),
        address: address.to_owned(),
        postcode: postcode_value.to_owned(),
        email: body.email.trim().to_owned(),
        website: body.website.trim().to_owned(),
        phone: body.phone.trim().to_owned(),
        donate_url: body.donate_url.trim().to_owned(),
        service_types: body.service_types.join(", "),
        specialisms: body.specialisms.join(", "),
        local_authority: body.local_authority.trim().to_owned(),
        latitude: None,
        longitude: None,
    };

    let inserted = havenmap_db::insert_service(&state.pool, &new_service)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "failed to store new service");
            ApiError::new(rid, "internal_error", "failed to store service")
        })?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: CreateServiceResponse {
                id: inserted.public_id,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}
