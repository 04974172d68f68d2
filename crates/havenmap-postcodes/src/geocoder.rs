//! Validation-guarded geocoder adapter over [`PostcodesClient`].

use async_trait::async_trait;

use havenmap_core::postcode;
use havenmap_core::{Coordinates, GeocodeFailure, PostcodeResolver};

use crate::client::PostcodesClient;
use crate::error::PostcodesError;

/// Turns free-form input into coordinates, or a typed failure.
///
/// Input that is not postcode-shaped never reaches the network. Transport
/// errors are logged here, at the collaborator boundary, and surface to the
/// pipeline only as [`GeocodeFailure::Transient`].
pub struct Geocoder {
    client: PostcodesClient,
}

impl Geocoder {
    #[must_use]
    pub fn new(client: PostcodesClient) -> Self {
        Self { client }
    }

    /// Resolves a postcode to coordinates.
    ///
    /// # Errors
    ///
    /// - [`GeocodeFailure::InvalidFormat`] when the input is not
    ///   postcode-shaped (no network call is made).
    /// - [`GeocodeFailure::NotFound`] when the API has no match.
    /// - [`GeocodeFailure::Transient`] on network or API trouble.
    pub async fn geocode(&self, input: &str) -> Result<Coordinates, GeocodeFailure> {
        let trimmed = input.trim();
        if !postcode::is_postcode_shaped(trimmed) {
            return Err(GeocodeFailure::InvalidFormat);
        }

        match self.client.lookup(trimmed).await {
            Ok(Some(coordinates)) => Ok(coordinates),
            Ok(None) => Err(GeocodeFailure::NotFound),
            Err(error) => {
                match &error {
                    PostcodesError::Http(e) => {
                        tracing::warn!(error = %e, postcode = trimmed, "postcode lookup failed");
                    }
                    PostcodesError::ApiError(_) | PostcodesError::Deserialize { .. } => {
                        tracing::error!(error = %error, postcode = trimmed, "postcode API misbehaved");
                    }
                }
                Err(GeocodeFailure::Transient)
            }
        }
    }
}

#[async_trait]
impl PostcodeResolver for Geocoder {
    async fn resolve(&self, postcode: &str) -> Result<Coordinates, GeocodeFailure> {
        self.geocode(postcode).await
    }
}
