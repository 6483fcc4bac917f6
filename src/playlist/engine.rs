use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;

use super::config::{PlaylistSettings, SettingsChange};
use super::duplicates::DuplicateGuard;
use super::history::Histories;
use super::metadata::{HistoryEntry, PlaylistState, PriorityRequest, PublishReport, Selection};
use super::priority::PriorityQueue;
use super::shuffle::{RandomSource, ShuffleIndex, ThreadRandom};
use crate::config::EngineConfig;
use crate::error::{EngineError, LoadError, Result};
use crate::library::LibraryLoader;
use crate::models::{Song, SongLibrary};

/// A library together with its shuffle order and traversal cursor
#[derive(Debug)]
struct Deck {
    library: Arc<SongLibrary>,
    shuffle: ShuffleIndex,
    cursor: Option<usize>,
}

impl Deck {
    /// Move to the next shuffle position, wrapping to the start
    fn advance(&mut self) -> usize {
        let next = match self.cursor {
            Some(position) if position + 1 < self.shuffle.len() => position + 1,
            _ => 0,
        };
        self.cursor = Some(next);
        next
    }

    /// Undo one step so the next advance revisits the current position
    fn step_back(&mut self) {
        self.cursor = self.cursor.and_then(|position| position.checked_sub(1));
    }
}

/// Identifies one load started with [`Playlist::begin_load`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// One named radio-style playlist: library, shuffle order, requests and history
///
/// All mutating operations take `&mut self`; callers sharing a playlist
/// across threads serialize access, e.g. behind a mutex.
pub struct Playlist {
    settings: PlaylistSettings,
    engine: EngineConfig,
    state: PlaylistState,
    deck: Option<Deck>,
    guard: DuplicateGuard,
    requests: PriorityQueue,
    histories: Histories,
    current: Option<Selection>,
    random: Box<dyn RandomSource + Send>,
    load_generation: u64,
}

impl std::fmt::Debug for Playlist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Playlist")
            .field("name", &self.settings.name)
            .field("state", &self.state)
            .field("count", &self.count())
            .field("requests", &self.requests.len())
            .field("history", &self.histories.songs().len())
            .finish()
    }
}

impl Playlist {
    pub fn new(settings: PlaylistSettings, engine: EngineConfig) -> Self {
        Self::with_random(settings, engine, Box::new(ThreadRandom))
    }

    /// Create a playlist drawing shuffle keys from `random`
    pub fn with_random(
        settings: PlaylistSettings,
        engine: EngineConfig,
        random: Box<dyn RandomSource + Send>,
    ) -> Self {
        let histories = Histories::new(
            engine.song_history_limit,
            settings.redundant_title_threshold,
            settings.redundant_artist_threshold,
        );
        Self {
            guard: DuplicateGuard::new(&settings),
            settings,
            engine,
            state: PlaylistState::Unloaded,
            deck: None,
            requests: PriorityQueue::new(),
            histories,
            current: None,
            random,
            load_generation: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.settings.name
    }

    pub fn settings(&self) -> &PlaylistSettings {
        &self.settings
    }

    pub fn state(&self) -> PlaylistState {
        self.state
    }

    /// Number of songs in the installed library (0 before the first load)
    pub fn count(&self) -> usize {
        self.deck.as_ref().map_or(0, |deck| deck.library.len())
    }

    pub fn shuffle(&self) -> Option<&ShuffleIndex> {
        self.deck.as_ref().map(|deck| &deck.shuffle)
    }

    /// Configured song source
    pub fn source(&self) -> Result<PathBuf> {
        self.settings
            .file_path
            .clone()
            .ok_or_else(|| EngineError::NoSource(self.settings.name.clone()))
    }

    /// Load the configured source and publish it
    ///
    /// On failure the playlist keeps serving whatever it served before.
    pub fn load(&mut self, loader: &LibraryLoader) -> Result<PublishReport> {
        let source = self.source()?;
        let ticket = self.begin_load();
        let result = loader.load(&source);
        self.finish_load(ticket, result)
    }

    /// Mark a load as in flight; a playlist with a library keeps serving it
    ///
    /// Only the most recently started load may finish it. Hand the ticket
    /// back to [`Playlist::finish_load`].
    pub fn begin_load(&mut self) -> LoadTicket {
        self.load_generation += 1;
        self.state = if self.deck.is_some() {
            PlaylistState::Reloading
        } else {
            PlaylistState::Loading
        };
        tracing::info!(
            "Playlist {} is {:?} (load {})",
            self.settings.name,
            self.state,
            self.load_generation
        );
        LoadTicket(self.load_generation)
    }

    /// Publish a loaded library, or roll back to the previous state
    ///
    /// A result for a load that a newer one has superseded is discarded
    /// without touching the playlist.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: std::result::Result<SongLibrary, LoadError>,
    ) -> Result<PublishReport> {
        if ticket.0 != self.load_generation {
            tracing::warn!(
                "Playlist {}: discarding result of load {}, load {} superseded it",
                self.settings.name,
                ticket.0,
                self.load_generation
            );
            return Err(EngineError::Superseded(self.settings.name.clone()));
        }

        match result {
            Ok(library) => Ok(self.publish(library)),
            Err(err) => {
                self.state = if self.deck.is_some() {
                    PlaylistState::Ready
                } else {
                    PlaylistState::Unloaded
                };
                tracing::error!("Failed to load playlist {}: {}", self.settings.name, err);
                Err(err.into())
            }
        }
    }

    /// Swap in `library` with a fresh shuffle order
    ///
    /// Histories carry over. Song-history entries are re-pointed at the new
    /// library by source path; entries whose source is gone from both the
    /// library and the disk are dropped. Pending requests refer to old
    /// indices and are discarded. Any load still in flight is superseded.
    pub fn publish(&mut self, library: SongLibrary) -> PublishReport {
        self.load_generation += 1;
        let library = Arc::new(library);
        let shuffle = ShuffleIndex::build(library.len(), self.random.as_mut());

        let requests_dropped = self.requests.clear();
        if requests_dropped > 0 {
            tracing::warn!(
                "Playlist {}: dropped {} pending requests for the replaced library",
                self.settings.name,
                requests_dropped
            );
        }

        let history_dropped = if self.deck.is_some() {
            self.revalidate_history(&library)
        } else {
            0
        };
        if history_dropped > 0 {
            tracing::warn!(
                "Playlist {}: dropped {} history entries whose song file is gone",
                self.settings.name,
                history_dropped
            );
        }

        self.current = self.current.take().and_then(|current| {
            library
                .position_of_source(&current.song.source_path)
                .map(|index| Selection { index, ..current })
        });

        let report = PublishReport {
            song_count: library.len(),
            history_kept: self.histories.songs().len(),
            history_dropped,
            requests_dropped,
        };

        self.deck = Some(Deck {
            library,
            shuffle,
            cursor: None,
        });
        self.state = PlaylistState::Ready;
        tracing::info!(
            "Playlist {} ready with {} songs",
            self.settings.name,
            report.song_count
        );
        report
    }

    fn revalidate_history(&mut self, library: &SongLibrary) -> usize {
        self.histories.revalidate_songs(|entry| {
            match library.position_of_source(&entry.song.source_path) {
                Some(index) => {
                    entry.index = index;
                    true
                }
                None => Path::new(&entry.song.source_path).exists(),
            }
        })
    }

    /// Apply new settings; duplicate rules take effect immediately
    ///
    /// A changed source is only reported, reloading is up to the caller.
    pub fn update_settings(&mut self, settings: PlaylistSettings) -> SettingsChange {
        let change = self.settings.diff(&settings);
        self.settings = settings;

        if change.duplicate_rules_changed {
            self.guard = DuplicateGuard::new(&self.settings);
            self.histories
                .set_title_threshold(self.settings.redundant_title_threshold);
            self.histories
                .set_artist_threshold(self.settings.redundant_artist_threshold);
            let guard = &self.guard;
            self.histories
                .rebuild_windows(|song| (guard.title_key(song), guard.artist_key(song)));
        }
        change
    }

    /// The song at library position `index`
    pub fn song_at(&self, index: usize) -> Result<&Song> {
        let deck = self.serving_deck()?;
        deck.library.get(index).ok_or(EngineError::OutOfRange {
            index,
            len: deck.library.len(),
        })
    }

    pub fn current_song(&self) -> Option<&Selection> {
        self.current.as_ref()
    }

    /// Choose what plays next
    ///
    /// Pending requests win and skip duplicate checks. Otherwise the shuffle
    /// order is walked, moving recent repeats aside up to the configured
    /// number of retries; after that a repeat is played rather than stalling.
    /// Returns `None` when no library is installed or it is empty.
    pub fn next_song(&mut self) -> Option<Selection> {
        let deck = self.deck.as_mut()?;
        if deck.library.is_empty() {
            return None;
        }

        let index = match self.requests.pop() {
            Some(request) => {
                tracing::debug!(
                    "Playlist {}: serving request for song {}",
                    self.settings.name,
                    request.song_index
                );
                request.song_index
            }
            None => Self::draw_from_shuffle(
                deck,
                &self.guard,
                &self.histories,
                self.engine.duplicate_replacement_retries,
                &self.settings.name,
            ),
        };

        let song = deck.library.get(index)?.clone();
        Some(self.record(index, song))
    }

    fn draw_from_shuffle(
        deck: &mut Deck,
        guard: &DuplicateGuard,
        histories: &Histories,
        retries: usize,
        name: &str,
    ) -> usize {
        let mut retries_left = retries;
        loop {
            let position = deck.advance();
            let song_index = deck.shuffle.entries()[position].song_index;
            let candidate = &deck.library.songs()[song_index];

            let Some(duplicate) = guard.check(candidate, histories) else {
                return song_index;
            };

            if retries_left == 0 {
                tracing::warn!(
                    "Playlist {}: giving up after {} retries, playing duplicate {:?}",
                    name,
                    retries,
                    duplicate
                );
                return song_index;
            }

            if let Some(relocation) = deck.shuffle.relocate(position) {
                tracing::debug!(
                    "Playlist {}: {:?} is a duplicate, moved {:?}",
                    name,
                    duplicate,
                    relocation
                );
                if relocation.cursor_steps_back() {
                    deck.step_back();
                }
            }
            retries_left -= 1;
        }
    }

    fn record(&mut self, index: usize, song: Song) -> Selection {
        let title = self.guard.title_key(&song);
        let artist = self.guard.artist_key(&song);
        self.histories.record(
            HistoryEntry {
                index,
                song: song.clone(),
                timestamp: Utc::now(),
            },
            title,
            artist,
        );

        tracing::debug!(
            "Playlist {}: now playing {} ({})",
            self.settings.name,
            song.display_title(),
            index
        );
        let selection = Selection { index, song };
        self.current = Some(selection.clone());
        selection
    }

    /// Queue `song_index` to play ahead of the shuffle, returning the queue length
    pub fn add_priority_request(&mut self, song_index: usize) -> Result<usize> {
        let len = self.serving_deck()?.library.len();
        if song_index >= len {
            return Err(EngineError::OutOfRange {
                index: song_index,
                len,
            });
        }

        let count = self
            .requests
            .push(song_index, Utc::now())
            .map_err(|position| EngineError::Conflict {
                song_index,
                position,
            })?;
        tracing::info!(
            "Playlist {}: song {} requested, {} pending",
            self.settings.name,
            song_index,
            count
        );
        Ok(count)
    }

    /// Queue position of a pending request for `song_index`
    pub fn has_priority_request(&self, song_index: usize) -> Option<usize> {
        self.requests.position(song_index)
    }

    pub fn priority_requests(&self) -> impl Iterator<Item = &PriorityRequest> {
        self.requests.iter()
    }

    pub fn priority_request_count(&self) -> usize {
        self.requests.len()
    }

    pub fn priority_request_at(&self, position: usize) -> Result<&PriorityRequest> {
        self.requests.get(position).ok_or(EngineError::OutOfRange {
            index: position,
            len: self.requests.len(),
        })
    }

    pub fn remove_priority_request(&mut self, position: usize) -> Result<PriorityRequest> {
        let len = self.requests.len();
        self.requests
            .remove(position)
            .ok_or(EngineError::OutOfRange {
                index: position,
                len,
            })
    }

    /// Played songs, newest first
    pub fn song_history(&self) -> &[HistoryEntry] {
        self.histories.songs().as_slice()
    }

    pub fn history_page(&self, start: usize, length: Option<usize>) -> &[HistoryEntry] {
        self.histories.songs().page(start, length)
    }

    pub fn history_entry(&self, index: usize) -> Result<&HistoryEntry> {
        let songs = self.histories.songs();
        songs.get(index).ok_or(EngineError::OutOfRange {
            index,
            len: songs.len(),
        })
    }

    pub fn histories(&self) -> &Histories {
        &self.histories
    }

    fn serving_deck(&self) -> Result<&Deck> {
        match &self.deck {
            Some(deck) if self.state.is_serving() => Ok(deck),
            _ => Err(EngineError::NotReady(self.settings.name.clone())),
        }
    }
}
