use crate::cancel::CancelToken;
use crate::errors::{ProxyError, Result};
use crate::models::{PlayMode, Track};
use crate::order::compute_order;
use crate::resolver::TrackResolver;

/// Position of the queue cursor within the play order.
///
/// `BeforeStart` and `AfterEnd` flank the valid range `0..len`; stepping past
/// either end passes through them and wraps around.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Cursor {
    BeforeStart,
    At(usize),
    AfterEnd,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Direction {
    Forward,
    Backward,
}

impl Cursor {
    pub fn position(&self) -> Option<usize> {
        match self {
            Cursor::At(pos) => Some(*pos),
            _ => None,
        }
    }

    /// `len` must be non-zero.
    fn step(self, direction: Direction, len: usize) -> Cursor {
        match direction {
            Direction::Forward => match self {
                Cursor::At(pos) if pos + 1 < len => Cursor::At(pos + 1),
                // Ran into AfterEnd: reset to BeforeStart, whose successor is the first entry
                Cursor::At(_) | Cursor::AfterEnd => Cursor::At(0),
                Cursor::BeforeStart => Cursor::At(0),
            },
            Direction::Backward => match self {
                Cursor::At(pos) if pos > 0 && pos <= len => Cursor::At(pos - 1),
                // Ran into BeforeStart: reset to AfterEnd, whose predecessor is the last entry
                Cursor::At(_) | Cursor::BeforeStart => Cursor::At(len - 1),
                Cursor::AfterEnd => Cursor::At(len - 1),
            },
        }
    }
}

pub struct PlaybackQueue {
    tracks: Vec<Track>,
    play_order: Vec<usize>,
    cursor: Cursor,
    play_mode: PlayMode,
    now_playing: Option<usize>, // Index into `tracks`
    resolver: TrackResolver,
}

impl PlaybackQueue {
    pub fn new(resolver: TrackResolver) -> Self {
        Self {
            tracks: Vec::new(),
            play_order: Vec::new(),
            cursor: Cursor::BeforeStart,
            play_mode: PlayMode::Normal,
            now_playing: None,
            resolver,
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn play_order(&self) -> &[usize] {
        &self.play_order
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn play_mode(&self) -> PlayMode {
        self.play_mode
    }

    /// The track most recently resolved to a stream URL.
    pub fn now_playing(&self) -> Option<&Track> {
        self.now_playing.and_then(|idx| self.tracks.get(idx))
    }

    /// Appends without touching the play order; it is reconciled before the
    /// next navigation.
    pub fn add(&mut self, track: Track) {
        log::debug!("[Track] '{}' [{}].", track.title, track.codec);
        self.tracks.push(track);
    }

    /// Appends a batch and recomputes the play order once.
    pub fn extend(&mut self, tracks: impl IntoIterator<Item = Track>) {
        for track in tracks {
            self.add(track);
        }
        self.update_play_order();
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
        self.play_order.clear();
        self.cursor = Cursor::BeforeStart;
        self.now_playing = None;
    }

    pub fn set_play_mode(&mut self, mode: PlayMode) {
        self.play_mode = mode;
        self.update_play_order();
    }

    /// Removes the track under the cursor and steps the cursor back one
    /// position (never below the first).
    pub fn remove_current(&mut self) -> Option<Track> {
        let pos = match self.cursor {
            Cursor::At(pos) if pos < self.play_order.len() => pos,
            _ => return None,
        };
        let idx = self.play_order[pos];
        if idx >= self.tracks.len() {
            return None;
        }

        let removed = self.tracks.remove(idx);
        self.play_order.remove(pos);
        for entry in self.play_order.iter_mut() {
            if *entry > idx {
                *entry -= 1;
            }
        }
        self.now_playing = match self.now_playing {
            Some(playing) if playing == idx => None,
            Some(playing) if playing > idx => Some(playing - 1),
            other => other,
        };
        self.cursor = Cursor::At(pos.saturating_sub(1));
        self.update_play_order();

        log::info!("[Track] '{}' removed.", removed.title);
        Some(removed)
    }

    /// 1-based position of the cursor in the play order (0 before the first
    /// navigation) and the number of queued tracks.
    pub fn current_position_and_length(&self) -> Result<(usize, usize)> {
        if self.tracks.is_empty() {
            return Err(ProxyError::EmptyQueue);
        }
        let position = match self.cursor {
            Cursor::At(pos) if pos < self.play_order.len() => pos + 1,
            _ => 0,
        };
        Ok((position, self.tracks.len()))
    }

    pub async fn next(&mut self, token: &CancelToken) -> Result<Option<String>> {
        self.navigate(Direction::Forward, token).await
    }

    pub async fn previous(&mut self, token: &CancelToken) -> Result<Option<String>> {
        self.navigate(Direction::Backward, token).await
    }

    /// Moves the cursor until a track resolves. Tracks that cannot be resolved
    /// are skipped, at most once each.
    async fn navigate(
        &mut self,
        direction: Direction,
        token: &CancelToken,
    ) -> Result<Option<String>> {
        if self.tracks.is_empty() {
            return Ok(None);
        }
        if self.play_order.len() != self.tracks.len() {
            self.update_play_order();
        }

        let len = self.play_order.len();
        for _ in 0..len {
            self.cursor = self.cursor.step(direction, len);
            let Some(pos) = self.cursor.position() else {
                continue;
            };
            let idx = self.play_order[pos];

            let resolved = self.resolver.resolve(&self.tracks[idx], token).await;
            match resolved {
                Ok(url) => {
                    let track = &mut self.tracks[idx];
                    track.set_stream_url(url.clone());
                    self.now_playing = Some(idx);
                    log::info!("Now playing '{}' by '{}'", track.title, track.artist);
                    return Ok(Some(url));
                }
                Err(e) if e.is_skippable() => {
                    log::warn!("Skipping '{}': {}", self.tracks[idx].title, e);
                }
                Err(e) => return Err(e),
            }
        }

        log::warn!("None of the {} queued tracks could be resolved", len);
        Ok(None)
    }

    fn update_play_order(&mut self) {
        if self.tracks.is_empty() {
            self.play_order.clear();
            return;
        }
        self.play_order = compute_order(&self.play_order, self.tracks.len(), self.play_mode);
        log::info!("[Tracks in queue] '{}'.", self.tracks.len());
    }
}
