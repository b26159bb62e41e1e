use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of catalog entity a query is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Track,
    Artist,
    Album,
    Playlist,
}

impl EntityKind {
    /// Containers expand to several tracks and fall back to a single best guess.
    pub fn is_container(&self) -> bool {
        !matches!(self, EntityKind::Track)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Track => write!(f, "Track"),
            EntityKind::Artist => write!(f, "Artist"),
            EntityKind::Album => write!(f, "Album"),
            EntityKind::Playlist => write!(f, "Playlist"),
        }
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "track" => Ok(EntityKind::Track),
            "artist" => Ok(EntityKind::Artist),
            "album" => Ok(EntityKind::Album),
            "playlist" => Ok(EntityKind::Playlist),
            _ => Err(format!(
                "Invalid entity kind: '{}'. Valid: track, artist, album, playlist",
                s
            )),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlayMode {
    #[default]
    Normal,
    Shuffle,
}

impl FromStr for PlayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "NORMAL" => Ok(PlayMode::Normal),
            "SHUFFLE" => Ok(PlayMode::Shuffle),
            _ => Err(format!("Invalid play mode: {}", s)),
        }
    }
}

/// A catalog entity as returned by search or listing, before expansion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityHandle {
    pub id: String,
    pub kind: EntityKind,
    pub name: String,
    /// Full record when the catalog already returned it alongside the hit
    /// (track searches usually do), saving a lookup on expansion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track: Option<Box<Track>>,
}

impl EntityHandle {
    pub fn new(id: impl Into<String>, kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            track: None,
        }
    }

    pub fn from_track(track: Track) -> Self {
        Self {
            id: track.id.clone(),
            kind: EntityKind::Track,
            name: track.title.clone(),
            track: Some(Box::new(track)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub year: u32,
    /// Seconds
    pub duration: u64,
    pub codec: String,
    /// kbps
    pub bitrate: u32,
    pub channels: u32,
    pub file_size: u64,
    pub thumbnail_url: String,
    pub art_url: String,
    stream_url: Option<String>,
}

impl Track {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            album: album.into(),
            ..Default::default()
        }
    }

    pub fn stream_url(&self) -> Option<&str> {
        self.stream_url.as_deref()
    }

    /// Stores the resolved stream URL. Only the first call has an effect.
    pub fn set_stream_url(&mut self, url: String) -> bool {
        if self.stream_url.is_some() {
            return false;
        }
        self.stream_url = Some(url);
        true
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Track {}
