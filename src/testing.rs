//! In-memory catalog for unit tests.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::errors::{ProxyError, Result};
use crate::models::{EntityHandle, EntityKind, Track};
use crate::providers::CatalogService;

#[derive(Default)]
pub struct MemoryCatalog {
    entities: Vec<(EntityHandle, Vec<Track>)>,
    broken: HashSet<String>,
    offline: AtomicBool,
    pub stream_fetches: AtomicUsize,
}

pub fn track(id: &str, title: &str) -> Track {
    let mut track = Track::new(id, title, "Artist", "Album");
    track.codec = "mp3".to_string();
    track
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_track(mut self, id: &str, title: &str) -> Self {
        let t = track(id, title);
        self.entities
            .push((EntityHandle::new(id, EntityKind::Track, title), vec![t]));
        self
    }

    pub fn with_container(
        mut self,
        kind: EntityKind,
        id: &str,
        name: &str,
        tracks: Vec<Track>,
    ) -> Self {
        self.entities.push((EntityHandle::new(id, kind, name), tracks));
        self
    }

    /// Stream lookups for this track fail with a resolution error.
    pub fn with_broken(mut self, id: &str) -> Self {
        self.broken.insert(id.to_string());
        self
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ProxyError::Transport("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogService for MemoryCatalog {
    fn id(&self) -> &str {
        "memory"
    }

    fn name(&self) -> &str {
        "Memory"
    }

    /// Case-sensitive equality, so misspelled queries fall through to the fallback.
    async fn search_exact(&self, kind: EntityKind, query: &str) -> Result<Vec<EntityHandle>> {
        self.check_online()?;
        Ok(self
            .entities
            .iter()
            .filter(|(e, _)| e.kind == kind && e.name == query)
            .map(|(e, _)| e.clone())
            .collect())
    }

    async fn list_all(&self, kind: EntityKind) -> Result<Vec<EntityHandle>> {
        self.check_online()?;
        Ok(self
            .entities
            .iter()
            .filter(|(e, _)| e.kind == kind)
            .map(|(e, _)| e.clone())
            .collect())
    }

    async fn expand_to_tracks(&self, entity: &EntityHandle) -> Result<Vec<Track>> {
        self.check_online()?;
        Ok(self
            .entities
            .iter()
            .find(|(e, _)| e.id == entity.id && e.kind == entity.kind)
            .map(|(_, tracks)| tracks.clone())
            .unwrap_or_default())
    }

    async fn fetch_stream_url(&self, track: &Track) -> Result<String> {
        self.check_online()?;
        self.stream_fetches.fetch_add(1, Ordering::SeqCst);
        if self.broken.contains(&track.id) {
            return Err(ProxyError::Resolution(format!("{} has no media", track.id)));
        }
        Ok(format!("http://stream.test/{}", track.id))
    }
}
