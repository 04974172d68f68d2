//! HTTP client and geocoder adapter for the postcodes.io lookup API.
//!
//! [`PostcodesClient`] wraps `reqwest` with typed error handling, a
//! base-URL override for tests, and retry with back-off on transient
//! failures. [`Geocoder`] layers the UK-postcode validation guard on top and
//! maps transport outcomes onto the pipeline's
//! [`GeocodeFailure`](havenmap_core::GeocodeFailure) taxonomy.

mod client;
mod error;
mod geocoder;
mod retry;

pub use client::PostcodesClient;
pub use error::PostcodesError;
pub use geocoder::Geocoder;
