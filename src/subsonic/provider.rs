use async_trait::async_trait;
use futures_util::future::try_join_all;
use rand::Rng;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::{Credentials, SessionConfig};
use crate::errors::{ProxyError, Result};
use crate::models::{EntityHandle, EntityKind, Track};
use crate::providers::CatalogService;

use super::models::*;

const ID_PREFIX: &str = "subsonic:";
const API_VERSION: &str = "1.13.0";
const THUMBNAIL_SIZE: u32 = 640;
const ART_SIZE: u32 = 1200;

fn tag_id(id: &str) -> String {
    format!("{}{}", ID_PREFIX, id)
}

fn raw_id(id: &str) -> &str {
    id.strip_prefix(ID_PREFIX).unwrap_or(id)
}

/// Case-insensitive substring match on an entity's own name.
fn name_matches(name: &str, query: &str) -> bool {
    name.to_lowercase().contains(&query.trim().to_lowercase())
}

/// Offset of the next listing page, or `None` once a page comes back short.
fn next_page_offset(offset: u32, fetched: usize, page_size: u32) -> Option<u32> {
    let fetched = fetched as u32;
    if fetched == 0 || fetched < page_size {
        return None;
    }
    Some(offset + fetched)
}

/// Codec of a `getSong` lookup. A song the server no longer knows cannot be
/// streamed, which navigation treats as skippable.
fn codec_from_lookup(resp: SubsonicResponse<SongData>, title: &str) -> Result<String> {
    if resp.error_code() == Some(ERROR_DATA_NOT_FOUND) {
        return Err(ProxyError::Resolution(format!(
            "'{}' is no longer in the catalog",
            title
        )));
    }
    Ok(resp.into_data("getSong")?.song.codec())
}

pub struct SubsonicCatalog {
    client: Client,
    server_url: String,
    credentials: Credentials,
    client_name: String,
    use_legacy_auth: bool,
    page_size: u32,
}

impl SubsonicCatalog {
    pub fn new(config: &SessionConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            server_url: config.server_url.trim().to_string(),
            credentials: config.credentials.clone(),
            client_name: config.client_name.clone(),
            use_legacy_auth: config.use_legacy_auth,
            page_size: config.listing_page_size,
        })
    }

    fn generate_salt() -> String {
        let mut rng = rand::rng();
        let random_bytes: Vec<u8> = (0..16).map(|_| rng.random::<u8>()).collect();
        hex::encode(random_bytes)
    }

    fn build_auth_params(&self) -> String {
        let user = urlencoding::encode(&self.credentials.username);
        let client = urlencoding::encode(&self.client_name);

        if self.use_legacy_auth {
            format!(
                "c={}&f=json&v={}&u={}&p={}",
                client,
                API_VERSION,
                user,
                urlencoding::encode(&self.credentials.password)
            )
        } else {
            let salt = Self::generate_salt();
            let token_input = format!("{}{}", self.credentials.password, salt);
            let token = format!("{:x}", md5::compute(token_input.as_bytes()));

            format!(
                "c={}&f=json&v={}&u={}&s={}&t={}",
                client, API_VERSION, user, salt, token
            )
        }
    }

    fn build_url(&self, endpoint: &str, extra_params: &str) -> String {
        let auth = self.build_auth_params();
        let base = self.server_url.trim_end_matches('/');
        if extra_params.is_empty() {
            format!("{}/rest/{}?{}", base, endpoint, auth)
        } else {
            format!("{}/rest/{}?{}&{}", base, endpoint, auth, extra_params)
        }
    }

    fn cover_art_url(&self, cover_art_id: &str, size: u32) -> String {
        self.build_url(
            "getCoverArt",
            &format!("id={}&size={}", urlencoding::encode(cover_art_id), size),
        )
    }

    async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        extra_params: &str,
    ) -> Result<SubsonicResponse<T>> {
        log::debug!("Subsonic {} request: {}", endpoint, extra_params);

        let url = self.build_url(endpoint, extra_params);
        let resp_text = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(serde_json::from_str(&resp_text)?)
    }

    /// Checks that the server is reachable and accepts the credentials.
    pub async fn ping(&self) -> Result<()> {
        let resp: SubsonicResponse<Value> = self.request("ping", "").await?;
        if resp.is_ok() {
            return Ok(());
        }
        resp.into_data("ping").map(|_| ())
    }

    fn song_to_track(&self, song: SubsonicSong, album_year: Option<u32>) -> Track {
        let codec = song.codec();
        let mut track = Track::new(
            tag_id(&song.id),
            song.title,
            song.artist.unwrap_or_default(),
            song.album.unwrap_or_default(),
        );
        track.year = song.year.or(album_year).unwrap_or(0);
        track.duration = song.duration.unwrap_or(0);
        track.codec = codec;
        track.bitrate = song.bit_rate.unwrap_or(0);
        track.channels = song.channel_count.unwrap_or(0);
        track.file_size = song.size.unwrap_or(0);
        if let Some(cover) = song.cover_art {
            track.thumbnail_url = self.cover_art_url(&cover, THUMBNAIL_SIZE);
            track.art_url = self.cover_art_url(&cover, ART_SIZE);
        }
        track
    }

    async fn search3(
        &self,
        query: &str,
        artist_count: u32,
        album_count: u32,
        song_count: u32,
        song_offset: u32,
    ) -> Result<SearchResult3> {
        let resp: SubsonicResponse<SearchResult3Data> = self
            .request(
                "search3",
                &format!(
                    "query={}&artistCount={}&albumCount={}&songCount={}&songOffset={}",
                    urlencoding::encode(query),
                    artist_count,
                    album_count,
                    song_count,
                    song_offset
                ),
            )
            .await?;

        let search_data = resp
            .into_data("search3")?
            .search_result3
            .unwrap_or_default();

        log::info!(
            "Subsonic search3 '{}': {} songs, {} albums, {} artists",
            query,
            search_data.song.len(),
            search_data.album.len(),
            search_data.artist.len()
        );

        Ok(search_data)
    }

    async fn song_track(&self, song_id: &str) -> Result<Track> {
        let resp: SubsonicResponse<SongData> = self
            .request("getSong", &format!("id={}", urlencoding::encode(raw_id(song_id))))
            .await?;
        let song = resp.into_data("getSong")?.song;
        Ok(self.song_to_track(song, None))
    }

    async fn album_tracks(&self, album_id: &str) -> Result<Vec<Track>> {
        let resp: SubsonicResponse<AlbumData> = self
            .request("getAlbum", &format!("id={}", urlencoding::encode(raw_id(album_id))))
            .await?;
        let album = resp.into_data("getAlbum")?.album;
        let year = album.year;

        Ok(album
            .song
            .into_iter()
            .map(|s| self.song_to_track(s, year))
            .collect())
    }

    async fn artist_tracks(&self, artist_id: &str) -> Result<Vec<Track>> {
        let resp: SubsonicResponse<ArtistData> = self
            .request("getArtist", &format!("id={}", urlencoding::encode(raw_id(artist_id))))
            .await?;
        let artist = resp.into_data("getArtist")?.artist;

        log::debug!(
            "Expanding artist '{}' ({} albums)",
            artist.name,
            artist.album.len()
        );

        let per_album = try_join_all(artist.album.iter().map(|a| self.album_tracks(&a.id))).await?;
        Ok(per_album.into_iter().flatten().collect())
    }

    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<Track>> {
        let resp: SubsonicResponse<PlaylistData> = self
            .request(
                "getPlaylist",
                &format!("id={}", urlencoding::encode(raw_id(playlist_id))),
            )
            .await?;
        let playlist = resp.into_data("getPlaylist")?.playlist;

        Ok(playlist
            .entry
            .into_iter()
            .filter(SubsonicSong::is_audio_track)
            .map(|s| self.song_to_track(s, None))
            .collect())
    }

    async fn playlists(&self) -> Result<Vec<SubsonicPlaylist>> {
        let resp: SubsonicResponse<PlaylistsData> = self.request("getPlaylists", "").await?;
        Ok(resp.into_data("getPlaylists")?.playlists.playlist)
    }

    /// Pages through `search3` with an empty query, which most servers answer
    /// with the whole library. A server that caps `songCount` below the page
    /// size ends the listing after its first page.
    async fn all_songs(&self) -> Result<Vec<EntityHandle>> {
        let mut handles = Vec::new();
        let mut offset = 0;
        loop {
            let page = self.search3("", 0, 0, self.page_size, offset).await?;
            let fetched = page.song.len();
            handles.extend(
                page.song
                    .into_iter()
                    .map(|s| EntityHandle::from_track(self.song_to_track(s, None))),
            );
            match next_page_offset(offset, fetched, self.page_size) {
                Some(next) => offset = next,
                None => {
                    // Either a small library or a server-side songCount cap
                    if offset == 0 && fetched > 0 && fetched < self.page_size as usize {
                        log::warn!(
                            "Song listing stopped after one short page ({} of {} requested)",
                            fetched,
                            self.page_size
                        );
                    }
                    break;
                }
            }
        }
        Ok(handles)
    }

    async fn all_albums(&self) -> Result<Vec<EntityHandle>> {
        let mut handles = Vec::new();
        let mut offset = 0;
        loop {
            let resp: SubsonicResponse<AlbumList2Data> = self
                .request(
                    "getAlbumList2",
                    &format!(
                        "type=alphabeticalByName&size={}&offset={}",
                        self.page_size, offset
                    ),
                )
                .await?;
            let page = resp.into_data("getAlbumList2")?.album_list2.album;
            let fetched = page.len();
            handles.extend(
                page.into_iter()
                    .map(|a| EntityHandle::new(tag_id(&a.id), EntityKind::Album, a.name)),
            );
            match next_page_offset(offset, fetched, self.page_size) {
                Some(next) => offset = next,
                None => break,
            }
        }
        Ok(handles)
    }

    async fn all_artists(&self) -> Result<Vec<EntityHandle>> {
        let resp: SubsonicResponse<ArtistsData> = self.request("getArtists", "").await?;
        Ok(resp
            .into_data("getArtists")?
            .artists
            .index
            .into_iter()
            .flat_map(|entry| entry.artist)
            .map(|a| EntityHandle::new(tag_id(&a.id), EntityKind::Artist, a.name))
            .collect())
    }

    /// Keeps only hits whose own title or name matches; `search3` also
    /// matches on artist and album fields.
    fn exact_hits(
        &self,
        kind: EntityKind,
        result: SearchResult3,
        query: &str,
    ) -> Vec<EntityHandle> {
        match kind {
            EntityKind::Track => result
                .song
                .into_iter()
                .filter(|s| name_matches(&s.title, query))
                .map(|s| EntityHandle::from_track(self.song_to_track(s, None)))
                .collect(),
            EntityKind::Artist => result
                .artist
                .into_iter()
                .filter(|a| name_matches(&a.name, query))
                .map(|a| EntityHandle::new(tag_id(&a.id), kind, a.name))
                .collect(),
            EntityKind::Album => result
                .album
                .into_iter()
                .filter(|a| name_matches(&a.name, query))
                .map(|a| EntityHandle::new(tag_id(&a.id), kind, a.name))
                .collect(),
            EntityKind::Playlist => Vec::new(),
        }
    }

    fn stream_format(codec: &str) -> &'static str {
        match codec {
            "flac" | "mp3" | "ogg" | "opus" => "raw",
            _ => "mp3", // Transcode m4a, aac, etc.
        }
    }
}

#[async_trait]
impl CatalogService for SubsonicCatalog {
    fn id(&self) -> &str {
        "subsonic"
    }

    fn name(&self) -> &str {
        "Subsonic"
    }

    async fn search_exact(&self, kind: EntityKind, query: &str) -> Result<Vec<EntityHandle>> {
        log::info!("Subsonic {} search for: '{}'", kind, query);

        let page = self.page_size;
        let result = match kind {
            EntityKind::Track => self.search3(query, 0, 0, page, 0).await?,
            EntityKind::Artist => self.search3(query, page, 0, 0, 0).await?,
            EntityKind::Album => self.search3(query, 0, page, 0, 0).await?,
            // No server-side playlist search; match on the name instead
            EntityKind::Playlist => {
                return Ok(self
                    .playlists()
                    .await?
                    .into_iter()
                    .filter(|p| name_matches(&p.name, query))
                    .map(|p| EntityHandle::new(tag_id(&p.id), kind, p.name))
                    .collect());
            }
        };

        Ok(self.exact_hits(kind, result, query))
    }

    async fn list_all(&self, kind: EntityKind) -> Result<Vec<EntityHandle>> {
        log::info!("Subsonic listing all {} entities", kind);

        match kind {
            EntityKind::Track => self.all_songs().await,
            EntityKind::Artist => self.all_artists().await,
            EntityKind::Album => self.all_albums().await,
            EntityKind::Playlist => Ok(self
                .playlists()
                .await?
                .into_iter()
                .map(|p| EntityHandle::new(tag_id(&p.id), kind, p.name))
                .collect()),
        }
    }

    async fn expand_to_tracks(&self, entity: &EntityHandle) -> Result<Vec<Track>> {
        match entity.kind {
            EntityKind::Track => match &entity.track {
                Some(track) => Ok(vec![(**track).clone()]),
                None => Ok(vec![self.song_track(&entity.id).await?]),
            },
            EntityKind::Artist => self.artist_tracks(&entity.id).await,
            EntityKind::Album => self.album_tracks(&entity.id).await,
            EntityKind::Playlist => self.playlist_tracks(&entity.id).await,
        }
    }

    async fn fetch_stream_url(&self, track: &Track) -> Result<String> {
        let clean_id = raw_id(&track.id);
        if clean_id.is_empty() {
            return Err(ProxyError::Resolution(format!(
                "'{}' has no catalog id",
                track.title
            )));
        }

        // Fetch track details when the listing did not tell us the original format
        let codec = if track.codec.is_empty() {
            let resp: SubsonicResponse<SongData> = self
                .request("getSong", &format!("id={}", urlencoding::encode(clean_id)))
                .await?;
            codec_from_lookup(resp, &track.title)?
        } else {
            track.codec.to_lowercase()
        };

        Ok(self.build_url(
            "stream",
            &format!(
                "id={}&format={}",
                urlencoding::encode(clean_id),
                Self::stream_format(&codec)
            ),
        ))
    }
}
