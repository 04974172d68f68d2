//! The `/services` surface: GeoJSON read path, facet vocabulary, and the
//! admin write path.

mod geojson;
mod read;
mod write;

pub use read::{list_facets, list_services};
pub use write::create_service;
