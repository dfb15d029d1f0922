//! Taxon name resolution with memoization

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::cache::{new_taxon_cache, MokaTaxonCache, TaxonIdCache};
use crate::config::InatConfig;
use crate::error::Result;
use crate::transport::Transport;
use crate::types::{CacheStats, ListResponse, TaxonCandidate, TaxonId};

/// Pick the candidate with the highest rank level, first one wins on ties
///
/// Higher rank levels are *more general* ranks, so a genus beats a species
/// when both match the query. Candidates without a rank level lose to any
/// candidate that has one.
pub fn most_general(candidates: &[TaxonCandidate]) -> Option<&TaxonCandidate> {
    candidates
        .iter()
        .fold(None, |best: Option<&TaxonCandidate>, candidate| match best {
            Some(b) if rank_key(candidate) <= rank_key(b) => Some(b),
            _ => Some(candidate),
        })
}

fn rank_key(candidate: &TaxonCandidate) -> f64 {
    candidate.rank_level.unwrap_or(f64::NEG_INFINITY)
}

/// Resolves free-text taxon names to iNaturalist taxon ids
pub struct TaxonResolver<C = MokaTaxonCache> {
    config: InatConfig,
    cache: C,
    lookups: AtomicU64,
    misses: AtomicU64,
}

impl TaxonResolver {
    pub fn new(config: InatConfig) -> Self {
        let cache = new_taxon_cache(&config);
        Self::with_cache(config, cache)
    }
}

impl<C: TaxonIdCache> TaxonResolver<C> {
    pub fn with_cache(config: InatConfig, cache: C) -> Self {
        Self {
            config,
            cache,
            lookups: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        let lookups = self.lookups.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        CacheStats {
            entries: self.cache.entry_count(),
            hits: lookups.saturating_sub(misses),
            misses,
        }
    }

    /// Resolve `taxon` to a taxon id, or `None` if nothing matches
    ///
    /// Results (including misses) are memoized by name, and concurrent calls
    /// for the same name share one upstream request. Transport errors are
    /// returned and are not cached.
    pub async fn resolve<T>(&self, taxon: &str, transport: &T) -> Result<Option<TaxonId>>
    where
        T: Transport + ?Sized,
    {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.cache
            .get_or_try_insert_with(taxon, async {
                self.misses.fetch_add(1, Ordering::Relaxed);
                self.query_taxon_id(taxon, transport).await
            })
            .await
    }

    async fn query_taxon_id<T>(&self, taxon: &str, transport: &T) -> Result<Option<TaxonId>>
    where
        T: Transport + ?Sized,
    {
        let body = transport.get_text(&self.config.taxa_url(taxon)).await?;
        let data: ListResponse<TaxonCandidate> = serde_json::from_str(&body)?;

        let chosen = most_general(&data.results);
        if let Some(c) = chosen {
            debug!(
                taxon,
                taxon_id = c.id,
                rank = c.rank.as_deref().unwrap_or("unknown"),
                candidates = data.results.len(),
                "Resolved taxon"
            );
        }
        Ok(chosen.map(|c| c.id))
    }
}
