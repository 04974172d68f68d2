//! Search orchestration: query classification, stage composition, and the
//! per-submission state machine.
//!
//! A submission moves `Idle → Validating → {Geocoding → Ranking → Done} |
//! {TextFiltering → Done} | Failed`. `Failed` is reachable only from
//! `Geocoding` and is terminal until the next submission. The geocode call is
//! the only suspension point; a later submission supersedes an earlier one,
//! and a resolution carrying a stale generation is discarded rather than
//! applied, so out-of-order completions can never display distances for the
//! wrong postcode.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use thiserror::Error;

use crate::distance::rank_by_distance;
use crate::filter::apply_facets;
use crate::postcode;
use crate::service::{Coordinates, Service};

/// Default search radius in miles; the UI exposes 1–10.
pub const DEFAULT_RADIUS_MILES: f64 = 10.0;
pub const MIN_RADIUS_MILES: f64 = 1.0;
pub const MAX_RADIUS_MILES: f64 = 10.0;

/// Maximum number of distance-ranked results.
pub const RESULT_LIMIT: usize = 10;

/// Page size for the list rendering of the result set.
pub const PAGE_SIZE: usize = 10;

/// Why a postcode-shaped query produced no coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeocodeFailure {
    #[error("not a valid UK postcode")]
    InvalidFormat,
    #[error("postcode not found")]
    NotFound,
    #[error("postcode lookup temporarily unavailable")]
    Transient,
}

/// The one async collaborator seam in the pipeline: postcode → coordinates.
#[async_trait]
pub trait PostcodeResolver: Send + Sync {
    async fn resolve(&self, postcode: &str) -> Result<Coordinates, GeocodeFailure>;
}

/// One user query, as submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub raw_input: String,
    pub service_type: Option<String>,
    pub specialisms: Vec<String>,
    pub radius_miles: f64,
    pub page: usize,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            raw_input: String::new(),
            service_type: None,
            specialisms: Vec::new(),
            radius_miles: DEFAULT_RADIUS_MILES,
            page: 0,
        }
    }
}

impl SearchQuery {
    #[must_use]
    pub fn new(raw_input: impl Into<String>) -> Self {
        Self {
            raw_input: raw_input.into(),
            ..Self::default()
        }
    }

    /// Sets the radius, clamped to the supported 1–10 mile range.
    #[must_use]
    pub fn with_radius(mut self, radius_miles: f64) -> Self {
        self.radius_miles = radius_miles.clamp(MIN_RADIUS_MILES, MAX_RADIUS_MILES);
        self
    }

    /// Whether the input classifies as a postcode rather than free text.
    #[must_use]
    pub fn is_postcode(&self) -> bool {
        postcode::is_postcode_shaped(&self.raw_input)
    }
}

/// Where a submission currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    Validating,
    Geocoding,
    Ranking,
    TextFiltering,
    Done,
    Failed(GeocodeFailure),
}

impl SearchPhase {
    /// Terminal phases stay on screen until the next submission resets the
    /// machine; the in-flight phases are what a UI shows as loading states.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Idle | Self::Done | Self::Failed(_))
    }
}

/// The full search state after a transition: phase, query, and result set.
///
/// Returned immutably from each orchestrator run; callers replace their
/// previous state wholesale, so a failed refinement can never leave a
/// partially updated mix on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
    pub phase: SearchPhase,
    pub query: SearchQuery,
    pub results: Vec<Service>,
    pub used_distance_ranking: bool,
    pub origin: Option<Coordinates>,
}

impl SearchState {
    /// The initial state: no query, no results.
    #[must_use]
    pub fn idle() -> Self {
        Self {
            phase: SearchPhase::Idle,
            query: SearchQuery::default(),
            results: Vec::new(),
            used_distance_ranking: false,
            origin: None,
        }
    }

    /// The requested page of the result set, for the list rendering.
    #[must_use]
    pub fn page(&self, page: usize) -> &[Service] {
        let start = page.saturating_mul(PAGE_SIZE);
        if start >= self.results.len() {
            return &[];
        }
        let end = (start + PAGE_SIZE).min(self.results.len());
        &self.results[start..end]
    }

    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.results.len().div_ceil(PAGE_SIZE)
    }
}

/// Orchestrates submissions and guarantees at most one live resolution.
///
/// Each submission takes a fresh generation; when a pipeline run finishes,
/// its result is applied only if no newer submission has started since.
#[derive(Debug, Default)]
pub struct SearchSession {
    generation: AtomicU64,
}

impl SearchSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs one submission through the pipeline.
    ///
    /// Returns `None` when a newer submission superseded this one while its
    /// geocode resolution was in flight; the caller keeps its last good
    /// state in that case.
    pub async fn search(
        &self,
        services: &[Service],
        query: &SearchQuery,
        resolver: &dyn PostcodeResolver,
    ) -> Option<SearchState> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let trimmed = query.raw_input.trim();
        tracing::debug!(generation, phase = ?SearchPhase::Validating, input = trimmed);

        let state = if postcode::is_postcode_shaped(trimmed) {
            tracing::debug!(generation, phase = ?SearchPhase::Geocoding);
            match resolver.resolve(trimmed).await {
                Ok(origin) => {
                    tracing::debug!(generation, phase = ?SearchPhase::Ranking);
                    let filtered = apply_facets(
                        services,
                        query.service_type.as_deref(),
                        &query.specialisms,
                        None,
                    );
                    let ranked =
                        rank_by_distance(&filtered, origin, query.radius_miles, RESULT_LIMIT);
                    SearchState {
                        phase: SearchPhase::Done,
                        query: query.clone(),
                        results: ranked,
                        used_distance_ranking: true,
                        origin: Some(origin),
                    }
                }
                // No silent fall-back to text search: a postcode-shaped query
                // that cannot resolve fails explicitly, with empty results.
                Err(failure) => SearchState {
                    phase: SearchPhase::Failed(failure),
                    query: query.clone(),
                    results: Vec::new(),
                    used_distance_ranking: false,
                    origin: None,
                },
            }
        } else {
            tracing::debug!(generation, phase = ?SearchPhase::TextFiltering);
            let text = (!trimmed.is_empty()).then_some(trimmed);
            let results = apply_facets(
                services,
                query.service_type.as_deref(),
                &query.specialisms,
                text,
            );
            SearchState {
                phase: SearchPhase::Done,
                query: query.clone(),
                results,
                used_distance_ranking: false,
                origin: None,
            }
        };

        if self.generation.load(Ordering::SeqCst) == generation {
            Some(state)
        } else {
            tracing::debug!(generation, "discarding superseded search resolution");
            None
        }
    }

    /// Explicit clear: resets facets to defaults and returns to `Idle`.
    /// Also supersedes any in-flight resolution.
    pub fn clear(&self) -> SearchState {
        self.generation.fetch_add(1, Ordering::SeqCst);
        SearchState::idle()
    }
}
