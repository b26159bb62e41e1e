use serde::Deserialize;

use crate::errors::{ProxyError, Result};

/// Subsonic error code for "the requested data was not found".
pub const ERROR_DATA_NOT_FOUND: i32 = 70;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsonicResponse<T> {
    #[serde(rename = "subsonic-response")]
    pub subsonic_response: SubsonicResponseInner<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsonicResponseInner<T> {
    pub status: String,
    #[serde(flatten)]
    pub data: Option<T>,
    pub error: Option<SubsonicError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsonicError {
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

impl<T> SubsonicResponse<T> {
    pub fn is_ok(&self) -> bool {
        self.subsonic_response.status == "ok"
    }

    pub fn error_code(&self) -> Option<i32> {
        self.subsonic_response.error.as_ref().map(|e| e.code)
    }

    /// Unwraps the payload, turning a failed status into a transport error.
    pub fn into_data(self, operation: &str) -> Result<T> {
        let inner = self.subsonic_response;
        if inner.status != "ok" {
            return Err(match inner.error {
                Some(err) => {
                    log::error!("Subsonic {} error: {} - {}", operation, err.code, err.message);
                    ProxyError::Transport(format!("Subsonic error {}: {}", err.code, err.message))
                }
                None => ProxyError::Transport("Unknown Subsonic error".to_string()),
            });
        }
        inner
            .data
            .ok_or_else(|| ProxyError::InvalidResponse(format!("No data in {} response", operation)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult3Data {
    pub search_result3: Option<SearchResult3>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult3 {
    #[serde(default)]
    pub artist: Vec<SubsonicArtist>,
    #[serde(default)]
    pub album: Vec<SubsonicAlbum>,
    #[serde(default)]
    pub song: Vec<SubsonicSong>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsonicSong {
    #[serde(deserialize_with = "deserialize_string_from_any")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub album: Option<String>,
    pub artist: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_u64_from_any")]
    pub duration: Option<u64>,
    pub cover_art: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_u32_from_any")]
    pub year: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_option_u32_from_any")]
    pub bit_rate: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_option_u32_from_any")]
    pub channel_count: Option<u32>,
    pub suffix: Option<String>,
    pub content_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_u64_from_any")]
    pub size: Option<u64>,
    #[serde(default)]
    pub is_video: bool,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
}

impl SubsonicSong {
    /// Playlists may hold videos and podcast episodes next to music.
    pub fn is_audio_track(&self) -> bool {
        if self.is_video {
            return false;
        }
        match self.media_type.as_deref() {
            None => true,
            Some(kind) => kind.eq_ignore_ascii_case("music"),
        }
    }

    pub fn codec(&self) -> String {
        match (&self.suffix, &self.content_type) {
            (Some(suffix), _) if !suffix.is_empty() => suffix.to_lowercase(),
            (_, Some(content_type)) => content_type
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string(),
            _ => String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsonicAlbum {
    #[serde(deserialize_with = "deserialize_string_from_any")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsonicArtist {
    #[serde(deserialize_with = "deserialize_string_from_any")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsonicPlaylist {
    #[serde(deserialize_with = "deserialize_string_from_any")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub entry: Vec<SubsonicSong>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongData {
    pub song: SubsonicSong,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumData {
    pub album: SubsonicAlbumFull,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsonicAlbumFull {
    #[serde(default, deserialize_with = "deserialize_option_u32_from_any")]
    pub year: Option<u32>,
    #[serde(default)]
    pub song: Vec<SubsonicSong>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistData {
    pub artist: SubsonicArtistFull,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsonicArtistFull {
    pub name: String,
    #[serde(default)]
    pub album: Vec<SubsonicAlbum>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistsData {
    pub artists: ArtistsIndex,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistsIndex {
    #[serde(default)]
    pub index: Vec<ArtistIndexEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistIndexEntry {
    #[serde(default)]
    pub artist: Vec<SubsonicArtist>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumList2Data {
    pub album_list2: AlbumList2,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumList2 {
    #[serde(default)]
    pub album: Vec<SubsonicAlbum>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistsData {
    pub playlists: PlaylistsList,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistsList {
    #[serde(default)]
    pub playlist: Vec<SubsonicPlaylist>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistData {
    pub playlist: SubsonicPlaylist,
}

// Helpers for robust deserialization

fn deserialize_string_from_any<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum AnyValue {
        String(String),
        Number(i64),
        Float(f64),
        Bool(bool),
    }

    match AnyValue::deserialize(deserializer)? {
        AnyValue::String(s) => Ok(s),
        AnyValue::Number(n) => Ok(n.to_string()),
        AnyValue::Float(f) => Ok(f.to_string()),
        AnyValue::Bool(b) => Ok(b.to_string()),
    }
}

fn deserialize_option_u32_from_any<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum AnyValue {
        Number(u32),
        String(String),
        Null,
    }

    match Option::<AnyValue>::deserialize(deserializer)? {
        Some(AnyValue::Number(n)) => Ok(Some(n)),
        Some(AnyValue::String(s)) => {
            if s.is_empty() {
                Ok(None)
            } else {
                s.parse::<u32>().map(Some).map_err(serde::de::Error::custom)
            }
        }
        Some(AnyValue::Null) | None => Ok(None),
    }
}

fn deserialize_option_u64_from_any<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum AnyValue {
        Number(u64),
        String(String),
        Null,
    }

    match Option::<AnyValue>::deserialize(deserializer)? {
        Some(AnyValue::Number(n)) => Ok(Some(n)),
        Some(AnyValue::String(s)) => {
            if s.is_empty() {
                Ok(None)
            } else {
                s.parse::<u64>().map(Some).map_err(serde::de::Error::custom)
            }
        }
        Some(AnyValue::Null) | None => Ok(None),
    }
}
