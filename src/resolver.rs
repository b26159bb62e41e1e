use std::sync::Arc;

use crate::cancel::CancelToken;
use crate::errors::{ProxyError, Result};
use crate::models::Track;
use crate::providers::CatalogService;

/// Turns a queued track into a playable stream URL on demand.
#[derive(Clone)]
pub struct TrackResolver {
    catalog: Arc<dyn CatalogService>,
}

impl TrackResolver {
    pub fn new(catalog: Arc<dyn CatalogService>) -> Self {
        Self { catalog }
    }

    pub async fn resolve(&self, track: &Track, token: &CancelToken) -> Result<String> {
        if let Some(url) = track.stream_url() {
            return Ok(url.to_string());
        }

        if track.id.is_empty() {
            log::info!("Could not retrieve the track url for '{}'", track.title);
            return Err(ProxyError::Resolution(format!(
                "'{}' has no catalog id",
                track.title
            )));
        }

        let url = token
            .run("stream url", self.catalog.fetch_stream_url(track))
            .await?;

        if url.is_empty() {
            return Err(ProxyError::Resolution(format!(
                "{} returned no stream for '{}'",
                self.catalog.name(),
                track.title
            )));
        }

        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{track, MemoryCatalog};
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_resolves_through_catalog() {
        let resolver = TrackResolver::new(Arc::new(MemoryCatalog::new()));
        let url = resolver
            .resolve(&track("t1", "Aerodynamic"), &CancelToken::new())
            .await
            .unwrap();
        assert_eq!(url, "http://stream.test/t1");
    }

    #[tokio::test]
    async fn test_cached_url_skips_catalog() {
        let catalog = Arc::new(MemoryCatalog::new());
        let resolver = TrackResolver::new(catalog.clone());
        let mut t = track("t1", "Aerodynamic");
        t.set_stream_url("http://cached/t1".to_string());

        let url = resolver.resolve(&t, &CancelToken::new()).await.unwrap();
        assert_eq!(url, "http://cached/t1");
        assert_eq!(catalog.stream_fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_metadata_is_resolution_error() {
        let resolver = TrackResolver::new(Arc::new(MemoryCatalog::new()));
        let err = resolver
            .resolve(&track("", "Untitled"), &CancelToken::new())
            .await
            .unwrap_err();
        assert!(err.is_skippable());
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_skippable() {
        let catalog = Arc::new(MemoryCatalog::new());
        catalog.set_offline(true);
        let resolver = TrackResolver::new(catalog);

        let err = resolver
            .resolve(&track("t1", "Aerodynamic"), &CancelToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ProxyError::Transport(_)));
    }
}
