//! iNaturalist specimen photo source
//!
//! Resolves a taxon name to an iNaturalist taxon id and pages through that
//! taxon's research-grade, licensed observations, returning medium-size image
//! URLs together with the observation each photo belongs to. The caller keeps
//! the returned cursor and passes it back in to get the next page.
//!
//! # Example
//!
//! ```no_run
//! use inaturalist_photos::{build_http_client, InatConfig, PhotoSource};
//!
//! # async fn example() -> Result<(), inaturalist_photos::InatError> {
//! let config = InatConfig::default();
//! let http = build_http_client(&config)?;
//! let source = PhotoSource::new(config);
//!
//! let batch = source.fetch(&http, "Vanessa atalanta", 0).await?;
//! for (url, observation_id) in batch.iter() {
//!     println!("{observation_id}: {url}");
//! }
//!
//! // Next page starts after the last observation seen
//! let next = source.fetch(&http, "Vanessa atalanta", batch.cursor).await?;
//! # let _ = next;
//! # Ok(())
//! # }
//! ```
//!
//! # API Coverage
//!
//! - `GET /v1/taxa?q=` - taxon name search
//! - `GET /v1/observations` - research-grade observations with licensed photos

mod cache;
mod config;
mod error;
mod fetcher;
mod report;
mod resolver;
mod transport;
mod types;

pub use cache::{new_taxon_cache, MokaTaxonCache, TaxonIdCache};
pub use config::{InatConfig, DEFAULT_COUNT};
pub use error::{InatError, Result};
pub use fetcher::{photo_extension, PhotoSource};
pub use report::{AnomalyReporter, TracingReporter};
pub use resolver::{most_general, TaxonResolver};
pub use transport::{build_http_client, Transport};
pub use types::{
    CacheStats, ImageBatch, ListResponse, Observation, ObservationId, Photo, TaxonCandidate,
    TaxonId,
};
