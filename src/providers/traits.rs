use crate::errors::Result;
use crate::models::{EntityHandle, EntityKind, Track};
use async_trait::async_trait;

/// The remote media catalog a session resolves queries against.
///
/// Calls are plain network calls; cancellation and deadlines are applied by
/// the caller.
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Unique identifier (e.g., "subsonic")
    fn id(&self) -> &str;

    /// User-friendly name
    fn name(&self) -> &str;

    /// Entities of `kind` whose name matches `query` according to the server's own search.
    async fn search_exact(&self, kind: EntityKind, query: &str) -> Result<Vec<EntityHandle>>;

    /// Every entity of `kind`, in catalog order. Used for fuzzy fallback.
    async fn list_all(&self, kind: EntityKind) -> Result<Vec<EntityHandle>>;

    /// A track entity yields itself, containers yield all of their audio tracks.
    async fn expand_to_tracks(&self, entity: &EntityHandle) -> Result<Vec<Track>>;

    /// Playable URL for a track. Fails with `Resolution` if the track cannot be streamed.
    async fn fetch_stream_url(&self, track: &Track) -> Result<String>;
}
