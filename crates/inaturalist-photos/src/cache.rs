//! Memo cache for taxon name lookups

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;

use crate::config::InatConfig;
use crate::error::{InatError, Result};
use crate::types::TaxonId;

/// Default memo backing store
pub type MokaTaxonCache = Cache<String, Option<TaxonId>>;

/// Process-wide memo of `taxon name -> resolved id`
///
/// The outer `Option` of [`TaxonIdCache::get`] is the cache miss; the inner
/// one is a remembered "no such taxon".
#[async_trait]
pub trait TaxonIdCache: Send + Sync {
    async fn get(&self, taxon: &str) -> Option<Option<TaxonId>>;

    /// Return the memoized id for `taxon`, running `init` on a miss
    ///
    /// Concurrent callers for the same name wait on a single `init`. An
    /// error from `init` is returned and nothing is stored.
    async fn get_or_try_insert_with<F>(&self, taxon: &str, init: F) -> Result<Option<TaxonId>>
    where
        F: Future<Output = Result<Option<TaxonId>>> + Send;

    fn entry_count(&self) -> u64;
}

#[async_trait]
impl TaxonIdCache for MokaTaxonCache {
    async fn get(&self, taxon: &str) -> Option<Option<TaxonId>> {
        Cache::get(self, taxon).await
    }

    async fn get_or_try_insert_with<F>(&self, taxon: &str, init: F) -> Result<Option<TaxonId>>
    where
        F: Future<Output = Result<Option<TaxonId>>> + Send,
    {
        Cache::try_get_with_by_ref(self, taxon, init)
            .await
            .map_err(|err| Arc::try_unwrap(err).unwrap_or_else(InatError::Shared))
    }

    fn entry_count(&self) -> u64 {
        Cache::entry_count(self)
    }
}

/// moka cache sized and aged from the config
///
/// A zero capacity leaves the cache unbounded and a missing or zero TTL keeps
/// entries until capacity eviction.
pub fn new_taxon_cache(config: &InatConfig) -> MokaTaxonCache {
    let mut builder = Cache::builder();
    if config.cache_capacity > 0 {
        builder = builder.max_capacity(config.cache_capacity);
    }
    if let Some(ttl) = config.cache_ttl_secs.filter(|&secs| secs > 0) {
        builder = builder.time_to_live(Duration::from_secs(ttl));
    }
    builder.build()
}
