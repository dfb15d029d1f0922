//! Observation paging and image URL extraction

use tracing::{debug, info};

use crate::cache::{new_taxon_cache, MokaTaxonCache, TaxonIdCache};
use crate::config::InatConfig;
use crate::error::Result;
use crate::report::{AnomalyReporter, TracingReporter};
use crate::resolver::TaxonResolver;
use crate::transport::Transport;
use crate::types::{ImageBatch, ListResponse, Observation, ObservationId, TaxonId};

/// File extension of an upstream photo URL: the text after the last `.`
///
/// Anything trailing the extension, such as a `?1545` query, is kept.
pub fn photo_extension(url: &str) -> &str {
    url.rsplit('.').next().unwrap_or(url)
}

/// Flatten observations into parallel url / observation id lists
fn flatten(config: &InatConfig, observations: &[Observation]) -> ImageBatch {
    let Some(last) = observations.last() else {
        return ImageBatch::empty();
    };

    let mut urls = Vec::new();
    let mut observation_ids = Vec::new();
    for observation in observations {
        for photo in &observation.photos {
            urls.push(config.image_url(photo.id, photo_extension(&photo.url)));
            observation_ids.push(observation.id);
        }
    }

    ImageBatch {
        cursor: last.id,
        urls,
        observation_ids,
    }
}

/// Pages through research-grade iNaturalist photos for a taxon
///
/// Holds no per-taxon state besides the resolver's memo cache; the cursor is
/// threaded through by the caller.
pub struct PhotoSource<C = MokaTaxonCache, R = TracingReporter> {
    config: InatConfig,
    resolver: TaxonResolver<C>,
    reporter: R,
}

impl PhotoSource {
    pub fn new(config: InatConfig) -> Self {
        let cache = new_taxon_cache(&config);
        Self::with_parts(config, cache, TracingReporter)
    }
}

impl Default for PhotoSource {
    fn default() -> Self {
        Self::new(InatConfig::default())
    }
}

impl<C: TaxonIdCache, R: AnomalyReporter> PhotoSource<C, R> {
    /// Build a source with an injected memo cache and anomaly reporter
    pub fn with_parts(config: InatConfig, cache: C, reporter: R) -> Self {
        let resolver = TaxonResolver::with_cache(config.clone(), cache);
        Self {
            config,
            resolver,
            reporter,
        }
    }

    pub fn config(&self) -> &InatConfig {
        &self.config
    }

    pub fn resolver(&self) -> &TaxonResolver<C> {
        &self.resolver
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Memoized taxon name lookup, see [`TaxonResolver::resolve`]
    pub async fn resolve<T>(&self, taxon: &str, transport: &T) -> Result<Option<TaxonId>>
    where
        T: Transport + ?Sized,
    {
        self.resolver.resolve(taxon, transport).await
    }

    /// Fetch the next page of image URLs using the configured page size
    pub async fn fetch<T>(
        &self,
        transport: &T,
        taxon: &str,
        cursor: ObservationId,
    ) -> Result<ImageBatch>
    where
        T: Transport + ?Sized,
    {
        self.fetch_with_count(transport, taxon, cursor, self.config.default_count)
            .await
    }

    /// Fetch up to `count` observations with ids above `cursor`
    ///
    /// When nothing lies above the cursor the query is repeated once from the
    /// start of the id sequence. If that is empty too the result is
    /// [`ImageBatch::empty`]. A taxon name that resolves to nothing is
    /// reported but does not stop the query.
    pub async fn fetch_with_count<T>(
        &self,
        transport: &T,
        taxon: &str,
        cursor: ObservationId,
        count: u32,
    ) -> Result<ImageBatch>
    where
        T: Transport + ?Sized,
    {
        let taxon_id = self.resolver.resolve(taxon, transport).await?;
        if taxon_id.is_none() {
            info!(taxon, "no taxon id found, falling back");
            self.reporter
                .report(&format!("no taxon id found for {}", taxon));
        }

        let mut observations = self
            .fetch_observations(transport, taxon_id, count, Some(cursor))
            .await?;

        if observations.is_empty() {
            debug!(taxon, cursor, "no observations above cursor, restarting from the beginning");
            observations = self
                .fetch_observations(transport, taxon_id, count, None)
                .await?;
        }

        if observations.is_empty() {
            return Ok(ImageBatch::empty());
        }

        let ids = observations
            .iter()
            .map(|o| o.id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        info!(taxon, observation_ids = %ids, "Fetched observations");
        for observation in &observations {
            info!(
                observation_id = observation.id,
                observed_on = observation.observed_on.as_deref().unwrap_or("unknown"),
                "Observation"
            );
        }

        Ok(flatten(&self.config, &observations))
    }

    async fn fetch_observations<T>(
        &self,
        transport: &T,
        taxon_id: Option<TaxonId>,
        count: u32,
        id_above: Option<ObservationId>,
    ) -> Result<Vec<Observation>>
    where
        T: Transport + ?Sized,
    {
        let url = self.config.observations_url(taxon_id, count, id_above);
        let body = transport.get_text(&url).await?;
        let data: ListResponse<Observation> = serde_json::from_str(&body)?;
        Ok(data.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InatError;
    use crate::report::recording::RecordingReporter;
    use crate::transport::mock::{MockTransport, Reply};

    const TAXA_BODY: &str = r#"{"results": [{"id": 48532, "rank_level": 10}]}"#;
    const EMPTY_BODY: &str = r#"{"total_results": 0, "results": []}"#;

    fn recording_source() -> PhotoSource<MokaTaxonCache, RecordingReporter> {
        let config = InatConfig::default();
        let cache = new_taxon_cache(&config);
        PhotoSource::with_parts(config, cache, RecordingReporter::default())
    }

    fn observation(id: u64, photos: &[(u64, &str)]) -> serde_json::Value {
        let photos: Vec<serde_json::Value> = photos
            .iter()
            .map(|(pid, url)| serde_json::json!({"id": pid, "url": url}))
            .collect();
        serde_json::json!({"id": id, "observed_on": "2023-06-01", "photos": photos})
    }

    fn observations_body(observations: Vec<serde_json::Value>) -> String {
        serde_json::json!({ "results": observations }).to_string()
    }

    #[test]
    fn test_photo_extension() {
        assert_eq!(
            photo_extension("https://static.inaturalist.org/photos/555/foo/original.jpeg"),
            "jpeg"
        );
        assert_eq!(
            photo_extension("https://static.inaturalist.org/photos/1/original.jpg?1545"),
            "jpg?1545"
        );
        assert_eq!(photo_extension("noext"), "noext");
    }

    #[test]
    fn test_flatten_builds_medium_urls() {
        let config = InatConfig::default();
        let observations = vec![Observation {
            id: 77,
            observed_on: None,
            photos: vec![crate::types::Photo {
                id: 555,
                url: "https://static.inaturalist.org/photos/555/foo/original.jpeg".to_string(),
            }],
        }];

        let batch = flatten(&config, &observations);
        assert_eq!(
            batch.urls,
            vec!["https://inaturalist-open-data.s3.amazonaws.com/photos/555/medium.jpeg"]
        );
        assert_eq!(batch.observation_ids, vec![77]);
        assert_eq!(batch.cursor, 77);
    }

    #[tokio::test]
    async fn test_fetch_paginated_batch() {
        let page = observations_body(vec![
            observation(1001, &[(10, "a/original.jpg"), (11, "b/original.jpg")]),
            observation(1002, &[]),
            observation(1005, &[(12, "c/original.png")]),
        ]);
        let transport = MockTransport::with_bodies(&[TAXA_BODY, page.as_str()]);
        let source = recording_source();

        let batch = source.fetch(&transport, "Vanessa atalanta", 1000).await.unwrap();

        assert_eq!(batch.cursor, 1005);
        assert_eq!(batch.urls.len(), batch.observation_ids.len());
        assert_eq!(batch.observation_ids, vec![1001, 1001, 1005]);
        assert!(batch.urls[2].ends_with("/photos/12/medium.png"));

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].contains("taxon_id=48532&"));
        assert!(requests[1].contains("per_page=5&"));
        assert!(requests[1].ends_with("id_above=1000"));
        assert!(source.reporter().messages().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_falls_back_when_cursor_exhausted() {
        let fallback = observations_body(vec![
            observation(5, &[(50, "x/original.jpg"), (51, "x/original.jpg")]),
            observation(8, &[(80, "x/original.jpg"), (81, "x/original.jpg")]),
            observation(13, &[(130, "x/original.jpg"), (131, "x/original.jpg")]),
        ]);
        let transport = MockTransport::with_bodies(&[TAXA_BODY, EMPTY_BODY, fallback.as_str()]);
        let source = recording_source();

        let batch = source.fetch(&transport, "Vanessa atalanta", 1000).await.unwrap();

        assert_eq!(batch.len(), 6);
        assert_eq!(batch.observation_ids, vec![5, 5, 8, 8, 13, 13]);
        assert_eq!(batch.cursor, 13);

        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[1].ends_with("id_above=1000"));
        assert!(requests[2].ends_with("id_above="));
    }

    #[tokio::test]
    async fn test_fetch_both_queries_empty() {
        let transport = MockTransport::with_bodies(&[TAXA_BODY, EMPTY_BODY, EMPTY_BODY]);
        let source = recording_source();

        let batch = source.fetch(&transport, "Vanessa atalanta", 42).await.unwrap();

        assert_eq!(batch, ImageBatch::empty());
        assert_eq!(batch.cursor, 0);
        assert_eq!(transport.request_count(), 3);
    }

    #[tokio::test]
    async fn test_fetch_unknown_taxon_reports_and_continues() {
        let page = observations_body(vec![observation(9, &[(90, "p/original.jpg")])]);
        let transport = MockTransport::with_bodies(&[EMPTY_BODY, page.as_str()]);
        let source = recording_source();

        let batch = source.fetch_with_count(&transport, "Nonexistium", 0, 2).await.unwrap();

        assert_eq!(batch.cursor, 9);
        assert_eq!(
            source.reporter().messages(),
            vec!["no taxon id found for Nonexistium"]
        );
        let requests = transport.requests();
        assert!(requests[1].contains("&taxon_id=&"));
        assert!(requests[1].contains("&per_page=2&"));
        assert!(requests[1].ends_with("id_above=0"));
    }

    #[tokio::test]
    async fn test_fetch_reuses_memoized_taxon_id() {
        let first = observations_body(vec![observation(3, &[(30, "p/original.jpg")])]);
        let second = observations_body(vec![observation(4, &[(40, "p/original.jpg")])]);
        let transport = MockTransport::with_bodies(&[TAXA_BODY, first.as_str(), second.as_str()]);
        let source = recording_source();

        let batch = source.fetch(&transport, "Vanessa atalanta", 0).await.unwrap();
        let batch = source
            .fetch(&transport, "Vanessa atalanta", batch.cursor)
            .await
            .unwrap();

        assert_eq!(batch.cursor, 4);
        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests.iter().filter(|u| u.contains("/taxa?")).count(), 1);
        assert!(requests[2].ends_with("id_above=3"));
    }

    #[tokio::test]
    async fn test_fetch_propagates_upstream_failure_without_fallback() {
        let transport = MockTransport::new(vec![
            Reply::Body(TAXA_BODY.to_string()),
            Reply::Status(500),
        ]);
        let source = recording_source();

        let err = source
            .fetch(&transport, "Vanessa atalanta", 1000)
            .await
            .unwrap_err();

        assert!(matches!(err, InatError::Status { status: 500, .. }));
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_fetch_propagates_fallback_failure() {
        let transport = MockTransport::new(vec![
            Reply::Body(TAXA_BODY.to_string()),
            Reply::Body(EMPTY_BODY.to_string()),
            Reply::Body("not json".to_string()),
        ]);
        let source = recording_source();

        let err = source
            .fetch(&transport, "Vanessa atalanta", 1000)
            .await
            .unwrap_err();
        assert!(matches!(err, InatError::Json(_)));
    }
}
