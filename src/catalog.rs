use futures_util::future::try_join_all;
use std::sync::Arc;

use crate::cancel::CancelToken;
use crate::config::TRACK_MATCH_THRESHOLD;
use crate::errors::{ProxyError, Result};
use crate::matching::{best_match, Similarity};
use crate::models::{EntityHandle, EntityKind, Track};
use crate::providers::CatalogService;

/// Resolves a typed query into tracks: the server's own search first, then a
/// similarity-scored scan of the whole catalog.
pub struct CatalogResolver {
    catalog: Arc<dyn CatalogService>,
    similarity: Arc<dyn Similarity>,
    track_threshold: u8,
}

impl CatalogResolver {
    pub fn new(catalog: Arc<dyn CatalogService>, similarity: Arc<dyn Similarity>) -> Self {
        Self {
            catalog,
            similarity,
            track_threshold: TRACK_MATCH_THRESHOLD,
        }
    }

    pub fn with_track_threshold(mut self, threshold: u8) -> Self {
        self.track_threshold = threshold;
        self
    }

    pub fn catalog(&self) -> &Arc<dyn CatalogService> {
        &self.catalog
    }

    pub async fn resolve(
        &self,
        kind: EntityKind,
        query: &str,
        token: &CancelToken,
    ) -> Result<Vec<Track>> {
        log::info!("[{}] [{} search] : '{}'", self.catalog.name(), kind, query);

        let hits = token
            .run("search", self.catalog.search_exact(kind, query))
            .await?;
        if kind.is_container() {
            for hit in &hits {
                log::info!("[{}] Playing '{}'.", self.catalog.name(), hit.name);
            }
        }

        let mut tracks = self.expand_all(&hits, token).await?;

        if tracks.is_empty() {
            tracks = self.fallback(kind, query, token).await?;
        }

        if tracks.is_empty() {
            return Err(ProxyError::not_found(kind, query));
        }

        log::info!(
            "[{}] '{}' resolved to {} tracks",
            self.catalog.name(),
            query,
            tracks.len()
        );
        Ok(tracks)
    }

    async fn fallback(
        &self,
        kind: EntityKind,
        query: &str,
        token: &CancelToken,
    ) -> Result<Vec<Track>> {
        let mut candidates = token
            .run("listing", self.catalog.list_all(kind))
            .await?;

        log::debug!(
            "No direct match for '{}', scoring {} {} candidates",
            query,
            candidates.len(),
            kind
        );

        let selected: Vec<EntityHandle> = match kind {
            // Several recordings can share a near-identical title
            EntityKind::Track => candidates
                .into_iter()
                .filter(|c| self.similarity.score(query, &c.name) > self.track_threshold)
                .collect(),
            _ => {
                let pick = match candidates.len() {
                    0 => None,
                    1 => Some(0),
                    _ => best_match(self.similarity.as_ref(), query, &candidates, |c| {
                        c.name.as_str()
                    }),
                };
                match pick {
                    Some(idx) => {
                        let entity = candidates.swap_remove(idx);
                        log::warn!(
                            "[{}] '{}' not found. Playing '{}' instead.",
                            self.catalog.name(),
                            query,
                            entity.name
                        );
                        vec![entity]
                    }
                    None => Vec::new(),
                }
            }
        };

        self.expand_all(&selected, token).await
    }

    /// Expands entities concurrently, keeping discovery order.
    async fn expand_all(
        &self,
        entities: &[EntityHandle],
        token: &CancelToken,
    ) -> Result<Vec<Track>> {
        let per_entity = try_join_all(entities.iter().map(|e| self.expand(e, token))).await?;
        Ok(per_entity.into_iter().flatten().collect())
    }

    async fn expand(&self, entity: &EntityHandle, token: &CancelToken) -> Result<Vec<Track>> {
        let tracks = token
            .run("expand", self.catalog.expand_to_tracks(entity))
            .await?;
        if tracks.is_empty() && entity.kind.is_container() {
            log::warn!(
                "[{}] '{}' No audio tracks found.",
                self.catalog.name(),
                entity.name
            );
        }
        Ok(tracks)
    }
}
