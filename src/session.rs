use std::sync::Arc;
use tokio::sync::Mutex;

use crate::cancel::CancelToken;
use crate::catalog::CatalogResolver;
use crate::config::SessionConfig;
use crate::errors::Result;
use crate::matching::{FuzzySimilarity, Similarity};
use crate::models::{EntityKind, PlayMode, Track};
use crate::providers::CatalogService;
use crate::queue::PlaybackQueue;
use crate::resolver::TrackResolver;
use crate::subsonic::SubsonicCatalog;

/// A playback session against one media server.
///
/// Queue mutations and navigation are serialised through a single guard;
/// catalog searches run outside it and only lock to append their results.
pub struct ProxySession {
    config: SessionConfig,
    resolver: CatalogResolver,
    queue: Mutex<PlaybackQueue>,
    token: CancelToken,
}

impl ProxySession {
    /// Connects to a Subsonic-compatible server and verifies the credentials.
    pub async fn connect(config: SessionConfig) -> Result<Self> {
        let catalog = SubsonicCatalog::new(&config)?;
        catalog.ping().await?;
        log::info!("Connected to Subsonic server at {}", config.server_url);

        Ok(Self::with_catalog(
            Arc::new(catalog),
            Arc::new(FuzzySimilarity::default()),
            config,
        ))
    }

    pub fn with_catalog(
        catalog: Arc<dyn CatalogService>,
        similarity: Arc<dyn Similarity>,
        config: SessionConfig,
    ) -> Self {
        let resolver = CatalogResolver::new(catalog.clone(), similarity)
            .with_track_threshold(config.track_match_threshold);

        let mut queue = PlaybackQueue::new(TrackResolver::new(catalog));
        queue.set_play_mode(config.play_mode);

        Self {
            token: CancelToken::new().with_timeout(config.request_timeout()),
            resolver,
            queue: Mutex::new(queue),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Cancels in-flight catalog calls; later ones fail immediately.
    pub fn shutdown(&self) {
        log::info!("Shutting down {} session", self.resolver.catalog().name());
        self.token.cancel();
    }

    pub async fn set_play_mode(&self, mode: PlayMode) {
        self.queue.lock().await.set_play_mode(mode);
    }

    pub async fn play_mode(&self) -> PlayMode {
        self.queue.lock().await.play_mode()
    }

    pub async fn enqueue_by_track(&self, query: &str) -> Result<usize> {
        self.enqueue(EntityKind::Track, query).await
    }

    pub async fn enqueue_by_artist(&self, query: &str) -> Result<usize> {
        self.enqueue(EntityKind::Artist, query).await
    }

    pub async fn enqueue_by_album(&self, query: &str) -> Result<usize> {
        self.enqueue(EntityKind::Album, query).await
    }

    pub async fn enqueue_by_playlist(&self, query: &str) -> Result<usize> {
        self.enqueue(EntityKind::Playlist, query).await
    }

    async fn enqueue(&self, kind: EntityKind, query: &str) -> Result<usize> {
        let tracks = self.resolver.resolve(kind, query, &self.token).await?;
        let added = tracks.len();

        self.queue.lock().await.extend(tracks);
        Ok(added)
    }

    /// Stream URL of the next track, or an empty string if there is nothing to play.
    pub async fn next_url(&self) -> Result<String> {
        let mut queue = self.queue.lock().await;
        Ok(queue.next(&self.token).await?.unwrap_or_default())
    }

    pub async fn previous_url(&self) -> Result<String> {
        let mut queue = self.queue.lock().await;
        Ok(queue.previous(&self.token).await?.unwrap_or_default())
    }

    pub async fn current_track(&self) -> Option<Track> {
        self.queue.lock().await.now_playing().cloned()
    }

    async fn current_field<T: Default>(&self, field: impl FnOnce(&Track) -> T) -> T {
        self.queue
            .lock()
            .await
            .now_playing()
            .map(field)
            .unwrap_or_default()
    }

    pub async fn current_title(&self) -> String {
        self.current_field(|t| t.title.clone()).await
    }

    pub async fn current_artist(&self) -> String {
        self.current_field(|t| t.artist.clone()).await
    }

    pub async fn current_album(&self) -> String {
        self.current_field(|t| t.album.clone()).await
    }

    pub async fn current_year(&self) -> u32 {
        self.current_field(|t| t.year).await
    }

    /// Seconds
    pub async fn current_duration(&self) -> u64 {
        self.current_field(|t| t.duration).await
    }

    pub async fn current_bitrate(&self) -> u32 {
        self.current_field(|t| t.bitrate).await
    }

    pub async fn current_codec(&self) -> String {
        self.current_field(|t| t.codec.clone()).await
    }

    pub async fn current_channels(&self) -> u32 {
        self.current_field(|t| t.channels).await
    }

    pub async fn current_file_size(&self) -> u64 {
        self.current_field(|t| t.file_size).await
    }

    pub async fn current_album_art_url(&self) -> String {
        self.current_field(|t| t.thumbnail_url.clone()).await
    }

    pub async fn current_position_and_length(&self) -> Result<(usize, usize)> {
        self.queue.lock().await.current_position_and_length()
    }

    pub async fn queue_len(&self) -> usize {
        self.queue.lock().await.len()
    }

    pub async fn clear_queue(&self) {
        self.queue.lock().await.clear();
    }

    pub async fn remove_current(&self) -> Option<Track> {
        self.queue.lock().await.remove_current()
    }
}
