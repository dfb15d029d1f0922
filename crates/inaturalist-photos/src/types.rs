//! Data types for iNaturalist API responses and fetch results
//!
//! The response structs only carry the fields this crate reads; everything
//! else in the upstream payload is ignored by serde.

use serde::{Deserialize, Serialize};

/// Numeric taxon identifier assigned by iNaturalist
pub type TaxonId = u64;

/// Numeric observation identifier, also used as the pagination cursor
pub type ObservationId = u64;

/// Generic `{ "results": [...] }` envelope returned by the v1 API
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    pub results: Vec<T>,
}

/// Candidate from `GET /taxa?q=...`
#[derive(Debug, Clone, Deserialize)]
pub struct TaxonCandidate {
    pub id: TaxonId,
    /// Higher values are more general ranks (kingdom = 70, species = 10)
    #[serde(default)]
    pub rank_level: Option<f64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rank: Option<String>,
}

/// Observation from `GET /observations`
#[derive(Debug, Clone, Deserialize)]
pub struct Observation {
    pub id: ObservationId,
    #[serde(default)]
    pub observed_on: Option<String>,
    #[serde(default)]
    pub photos: Vec<Photo>,
}

/// Photo attached to an observation
#[derive(Debug, Clone, Deserialize)]
pub struct Photo {
    pub id: u64,
    pub url: String,
}

/// One page of image URLs with the observation each came from
///
/// `urls` and `observation_ids` are parallel: entry `i` of both describes the
/// same photo. `cursor` is the id of the last observation in the page, or 0
/// when nothing was found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageBatch {
    pub cursor: ObservationId,
    pub urls: Vec<String>,
    pub observation_ids: Vec<ObservationId>,
}

impl ImageBatch {
    /// The `(0, [], [])` result returned when a taxon has no usable observations
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Iterate `(url, observation_id)` pairs in upstream order
    pub fn iter(&self) -> impl Iterator<Item = (&str, ObservationId)> + '_ {
        self.urls
            .iter()
            .map(String::as_str)
            .zip(self.observation_ids.iter().copied())
    }
}

/// Memo cache counters for the taxon resolver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: u64,
    pub hits: u64,
    pub misses: u64,
}
