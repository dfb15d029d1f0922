use std::env;

use crate::types::{ObservationId, TaxonId};

const DEFAULT_API_BASE_URL: &str = "https://api.inaturalist.org/v1";
const DEFAULT_IMAGE_BASE_URL: &str = "https://inaturalist-open-data.s3.amazonaws.com";
const DEFAULT_USER_AGENT: &str = "inaturalist-photos-rs/0.1";

/// Number of observations requested per page when the caller does not say
pub const DEFAULT_COUNT: u32 = 5;

/// Endpoint and cache configuration for the photo source
#[derive(Debug, Clone)]
pub struct InatConfig {
    pub api_base_url: String,
    pub image_base_url: String,
    pub default_count: u32,
    /// Maximum memoized taxon names; 0 means unbounded
    pub cache_capacity: u64,
    /// Memo entry lifetime; `None` keeps entries until evicted for capacity
    pub cache_ttl_secs: Option<u64>,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for InatConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
            default_count: DEFAULT_COUNT,
            cache_capacity: 10_000,
            cache_ttl_secs: None,
            request_timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl InatConfig {
    /// Parse configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any `key -> value` source
    ///
    /// Zero or unparseable numbers fall back to the defaults, so the taxon
    /// memo can never be sized or aged down to nothing.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_base_url = lookup("INAT_API_URL").unwrap_or(defaults.api_base_url);
        let image_base_url = lookup("INAT_IMAGE_URL").unwrap_or(defaults.image_base_url);

        let default_count = lookup("INAT_PER_PAGE")
            .and_then(|s| s.parse::<u32>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(defaults.default_count);

        let cache_capacity = lookup("INAT_CACHE_CAPACITY")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(defaults.cache_capacity);

        let cache_ttl_secs = lookup("INAT_CACHE_TTL_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|&n| n > 0)
            .or(defaults.cache_ttl_secs);

        let request_timeout_secs = lookup("INAT_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(defaults.request_timeout_secs);

        let user_agent = lookup("INAT_USER_AGENT").unwrap_or(defaults.user_agent);

        Self {
            api_base_url,
            image_base_url,
            default_count,
            cache_capacity,
            cache_ttl_secs,
            request_timeout_secs,
            user_agent,
        }
    }

    /// `GET /taxa` search URL for a free-text name
    pub fn taxa_url(&self, taxon: &str) -> String {
        format!(
            "{}/taxa?q={}",
            self.api_base_url.trim_end_matches('/'),
            urlencoding::encode(taxon)
        )
    }

    /// `GET /observations` URL for research-grade, licensed photos in ascending id order
    ///
    /// A missing taxon id or cursor is sent as an empty parameter.
    pub fn observations_url(
        &self,
        taxon_id: Option<TaxonId>,
        count: u32,
        id_above: Option<ObservationId>,
    ) -> String {
        let taxon_id = taxon_id.map(|id| id.to_string()).unwrap_or_default();
        let id_above = id_above.map(|id| id.to_string()).unwrap_or_default();
        format!(
            "{}/observations?photos=true&photo_licensed=true&taxon_id={}&quality_grade=research&per_page={}&order_by=id&order=asc&id_above={}",
            self.api_base_url.trim_end_matches('/'),
            taxon_id,
            count,
            id_above
        )
    }

    /// Medium-size rendition on the open-data host
    pub fn image_url(&self, photo_id: u64, ext: &str) -> String {
        format!(
            "{}/photos/{}/medium.{}",
            self.image_base_url.trim_end_matches('/'),
            photo_id,
            ext
        )
    }
}
