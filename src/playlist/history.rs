use super::metadata::HistoryEntry;
use crate::models::Song;

/// Newest-first log that keeps at most `limit` entries
///
/// A limit of 0 means the log is disabled and records nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct RollingLog<T> {
    entries: Vec<T>,
    limit: usize,
}

impl<T> RollingLog<T> {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit,
        }
    }

    pub fn push(&mut self, value: T) {
        if self.limit == 0 {
            return;
        }
        self.entries.insert(0, value);
        self.entries.truncate(self.limit);
    }

    /// Change the cap, evicting the oldest entries if it shrank
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
        self.entries.truncate(limit);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.entries.get(index)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.entries
    }

    /// `length` entries starting at `start`, clamped to what exists
    pub fn page(&self, start: usize, length: Option<usize>) -> &[T] {
        let start = start.min(self.entries.len());
        let end = length.map_or(self.entries.len(), |length| {
            start.saturating_add(length).min(self.entries.len())
        });
        &self.entries[start..end]
    }

    pub fn retain_mut(&mut self, keep: impl FnMut(&mut T) -> bool) {
        self.entries.retain_mut(keep);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T: PartialEq> RollingLog<T> {
    pub fn contains(&self, value: &T) -> bool {
        self.entries.contains(value)
    }
}

/// Played-song, title and artist histories of one playlist
///
/// These outlive the library: a reload hands the same value to the new
/// library instead of starting over.
#[derive(Debug, Clone, PartialEq)]
pub struct Histories {
    songs: RollingLog<HistoryEntry>,
    titles: RollingLog<String>,
    artists: RollingLog<String>,
}

impl Histories {
    pub fn new(song_limit: usize, title_threshold: usize, artist_threshold: usize) -> Self {
        Self {
            songs: RollingLog::new(song_limit),
            titles: RollingLog::new(title_threshold),
            artists: RollingLog::new(artist_threshold),
        }
    }

    /// Record one selection in every log that is enabled
    pub fn record(
        &mut self,
        entry: HistoryEntry,
        normalized_title: Option<String>,
        artist: Option<String>,
    ) {
        self.songs.push(entry);
        if let Some(title) = normalized_title {
            self.titles.push(title);
        }
        if let Some(artist) = artist {
            self.artists.push(artist);
        }
    }

    pub fn songs(&self) -> &RollingLog<HistoryEntry> {
        &self.songs
    }

    pub fn titles(&self) -> &RollingLog<String> {
        &self.titles
    }

    pub fn artists(&self) -> &RollingLog<String> {
        &self.artists
    }

    pub fn set_title_threshold(&mut self, threshold: usize) {
        self.titles.set_limit(threshold);
    }

    pub fn set_artist_threshold(&mut self, threshold: usize) {
        self.artists.set_limit(threshold);
    }

    /// Rewrite or drop song-history entries, returning how many were dropped
    pub fn revalidate_songs(&mut self, mut keep: impl FnMut(&mut HistoryEntry) -> bool) -> usize {
        let before = self.songs.len();
        self.songs.retain_mut(|entry| keep(entry));
        before - self.songs.len()
    }

    /// Refill the title and artist logs from the played songs
    ///
    /// Used when thresholds or delimiters change, since the logs hold values
    /// derived under the old rules. `keys` yields the title and artist to
    /// record for a song.
    pub fn rebuild_windows(&mut self, keys: impl Fn(&Song) -> (Option<String>, Option<String>)) {
        self.titles.clear();
        self.artists.clear();
        for entry in self.songs.as_slice().iter().rev() {
            let (title, artist) = keys(&entry.song);
            if let Some(title) = title {
                self.titles.push(title);
            }
            if let Some(artist) = artist {
                self.artists.push(artist);
            }
        }
    }
}
