use async_trait::async_trait;
use std::sync::Arc;

use sonami_proxy::{
    CatalogService, EntityHandle, EntityKind, FuzzySimilarity, PlayMode, ProxyError,
    ProxySession, Result, SessionConfig, Track,
};

/// A small fixed library: one artist with two albums, a playlist and a
/// recording whose stream has been taken down.
struct Library {
    albums: Vec<(EntityHandle, Vec<Track>)>,
    playlists: Vec<(EntityHandle, Vec<Track>)>,
}

fn song(id: &str, title: &str, album: &str) -> Track {
    let mut track = Track::new(id, title, "Daft Punk", album);
    track.codec = "flac".to_string();
    track.channels = 2;
    track
}

impl Library {
    fn new() -> Self {
        let homework = vec![
            song("h1", "Revolution 909", "Homework"),
            song("h2", "Da Funk", "Homework"),
            song("h3", "Around the World", "Homework"),
        ];
        let discovery = vec![
            song("d1", "One More Time", "Discovery"),
            song("d2", "Aerodynamic", "Discovery"),
        ];
        let patchy = vec![
            song("gone", "Taken Down", "Discovery"),
            song("d2", "Aerodynamic", "Discovery"),
        ];

        Self {
            albums: vec![
                (EntityHandle::new("al1", EntityKind::Album, "Homework"), homework),
                (EntityHandle::new("al2", EntityKind::Album, "Discovery"), discovery),
            ],
            playlists: vec![(EntityHandle::new("p1", EntityKind::Playlist, "Patchy"), patchy)],
        }
    }

    fn entities(&self, kind: EntityKind) -> Vec<&(EntityHandle, Vec<Track>)> {
        match kind {
            EntityKind::Album => self.albums.iter().collect(),
            EntityKind::Playlist => self.playlists.iter().collect(),
            EntityKind::Artist | EntityKind::Track => Vec::new(),
        }
    }
}

#[async_trait]
impl CatalogService for Library {
    fn id(&self) -> &str {
        "library"
    }

    fn name(&self) -> &str {
        "Library"
    }

    async fn search_exact(&self, kind: EntityKind, query: &str) -> Result<Vec<EntityHandle>> {
        if kind == EntityKind::Artist && query == "Daft Punk" {
            return Ok(vec![EntityHandle::new("ar1", kind, "Daft Punk")]);
        }
        Ok(self
            .entities(kind)
            .into_iter()
            .filter(|(e, _)| e.name == query)
            .map(|(e, _)| e.clone())
            .collect())
    }

    async fn list_all(&self, kind: EntityKind) -> Result<Vec<EntityHandle>> {
        Ok(self
            .entities(kind)
            .into_iter()
            .map(|(e, _)| e.clone())
            .collect())
    }

    async fn expand_to_tracks(&self, entity: &EntityHandle) -> Result<Vec<Track>> {
        if entity.kind == EntityKind::Artist {
            return Ok(self
                .albums
                .iter()
                .flat_map(|(_, tracks)| tracks.clone())
                .collect());
        }
        Ok(self
            .entities(entity.kind)
            .into_iter()
            .find(|(e, _)| e.id == entity.id)
            .map(|(_, tracks)| tracks.clone())
            .unwrap_or_default())
    }

    async fn fetch_stream_url(&self, track: &Track) -> Result<String> {
        if track.id == "gone" {
            return Err(ProxyError::Resolution("data not found".to_string()));
        }
        Ok(format!("https://music.test/rest/stream?id={}", track.id))
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn session() -> ProxySession {
    init_logging();
    ProxySession::with_catalog(
        Arc::new(Library::new()),
        Arc::new(FuzzySimilarity::default()),
        SessionConfig::default(),
    )
}

fn stream(id: &str) -> String {
    format!("https://music.test/rest/stream?id={}", id)
}

#[tokio::test]
async fn empty_queue_yields_empty_urls() {
    let session = session();

    assert_eq!(session.next_url().await.unwrap(), "");
    assert_eq!(session.previous_url().await.unwrap(), "");
    assert_eq!(session.current_title().await, "");
    assert_eq!(session.queue_len().await, 0);
}

#[tokio::test]
async fn artist_queue_cycles_in_order() {
    let session = session();
    let added = session.enqueue_by_artist("Daft Punk").await.unwrap();
    assert_eq!(added, 5);

    let expected = ["h1", "h2", "h3", "d1", "d2"];
    for (i, id) in expected.iter().enumerate() {
        assert_eq!(session.next_url().await.unwrap(), stream(id));
        assert_eq!(session.current_position_and_length().await.unwrap(), (i + 1, 5));
    }

    assert_eq!(session.next_url().await.unwrap(), stream("h1"));
    assert_eq!(session.previous_url().await.unwrap(), stream("d2"));
    assert_eq!(session.current_title().await, "Aerodynamic");
    assert_eq!(session.current_album().await, "Discovery");
    assert_eq!(session.current_codec().await, "flac");
    assert_eq!(session.current_channels().await, 2);
}

#[tokio::test]
async fn misspelled_album_falls_back_to_closest() {
    let session = session();

    assert_eq!(session.enqueue_by_album("Homewrk").await.unwrap(), 3);
    assert_eq!(session.next_url().await.unwrap(), stream("h1"));
    assert_eq!(session.current_album().await, "Homework");
}

#[tokio::test]
async fn unknown_artist_is_not_found_and_queue_is_kept() {
    let session = session();
    session.enqueue_by_album("Discovery").await.unwrap();

    let err = session.enqueue_by_artist("Justice").await.unwrap_err();
    assert!(matches!(err, ProxyError::NotFound { kind: EntityKind::Artist, .. }));
    assert_eq!(err.to_string(), "Artist not found : Justice");
    assert_eq!(session.queue_len().await, 2);
}

#[tokio::test]
async fn unplayable_entries_are_skipped() {
    let session = session();
    assert_eq!(session.enqueue_by_playlist("Patchy").await.unwrap(), 2);

    assert_eq!(session.next_url().await.unwrap(), stream("d2"));
    assert_eq!(session.next_url().await.unwrap(), stream("d2"));
    assert_eq!(session.previous_url().await.unwrap(), stream("d2"));
}

#[tokio::test]
async fn appended_tracks_join_the_rotation() {
    let session = session();
    session.enqueue_by_album("Discovery").await.unwrap();
    assert_eq!(session.next_url().await.unwrap(), stream("d1"));

    session.enqueue_by_album("Homework").await.unwrap();
    assert_eq!(session.queue_len().await, 5);

    let mut seen = vec![session.next_url().await.unwrap()];
    for _ in 0..3 {
        seen.push(session.next_url().await.unwrap());
    }
    assert_eq!(
        seen,
        vec![stream("d2"), stream("h1"), stream("h2"), stream("h3")]
    );
}

#[tokio::test]
async fn removing_the_only_track_empties_the_queue() {
    let session = session();
    session.enqueue_by_playlist("Patchy").await.unwrap();
    session.next_url().await.unwrap();

    let removed = session.remove_current().await.unwrap();
    assert_eq!(removed.id, "d2");
    assert_eq!(session.queue_len().await, 1);

    let removed = session.remove_current().await.unwrap();
    assert_eq!(removed.id, "gone");
    assert_eq!(session.queue_len().await, 0);
    assert_eq!(session.next_url().await.unwrap(), "");
    assert!(session.remove_current().await.is_none());
}

#[tokio::test]
async fn shuffle_plays_every_track_once_per_cycle() {
    let session = session();
    session.set_play_mode(PlayMode::Shuffle).await;
    session.enqueue_by_artist("Daft Punk").await.unwrap();

    let mut urls = Vec::new();
    for _ in 0..5 {
        urls.push(session.next_url().await.unwrap());
    }
    urls.sort();
    let expected: Vec<String> = ["d1", "d2", "h1", "h2", "h3"]
        .iter()
        .map(|id| stream(id))
        .collect();
    assert_eq!(urls, expected);
}

#[tokio::test]
async fn shutdown_fails_further_lookups() {
    let session = session();
    session.shutdown();

    let err = session.enqueue_by_album("Homework").await.unwrap_err();
    assert!(matches!(err, ProxyError::Cancelled(_)));
    assert_eq!(session.queue_len().await, 0);
}

#[test]
fn config_round_trips_through_json() {
    let config = SessionConfig::from_value(serde_json::json!({
        "server_url": "https://music.test",
        "username": "alice",
        "password": "secret",
        "play_mode": "SHUFFLE"
    }))
    .unwrap();

    assert_eq!(config.credentials.username, "alice");
    assert_eq!(config.play_mode, PlayMode::Shuffle);
    assert!(SessionConfig::from_value(serde_json::json!({ "server_url": "" })).is_err());
}
