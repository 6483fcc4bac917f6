use super::config::PlaylistSettings;
use super::history::Histories;
use crate::models::Song;

/// Reduces a title to the form used for repeat detection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleNormalizer {
    delimiters: Vec<char>,
}

impl TitleNormalizer {
    /// Whitespace in the delimiter list is ignored
    pub fn new(partial_title_delimiters: &str) -> Self {
        Self {
            delimiters: partial_title_delimiters
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect(),
        }
    }

    /// Cut at each delimiter in turn, then lower-case and drop apostrophes and commas
    ///
    /// A delimiter that opens the title does not cut it, so "(Intro) Theme"
    /// keeps its text.
    pub fn normalize(&self, title: &str) -> String {
        let mut partial = title.trim();
        for &delimiter in &self.delimiters {
            if let Some(cut) = partial.find(delimiter).filter(|&cut| cut > 0) {
                partial = partial[..cut].trim();
            }
        }

        partial
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, '\'' | '\u{2019}' | ','))
            .collect()
    }
}

/// Why a candidate was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Duplicate {
    Title(String),
    Artist(String),
}

/// Tests candidates against the recent title and artist windows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateGuard {
    normalizer: TitleNormalizer,
    title_threshold: usize,
    artist_threshold: usize,
}

impl DuplicateGuard {
    pub fn new(settings: &PlaylistSettings) -> Self {
        Self {
            normalizer: TitleNormalizer::new(&settings.partial_title_delimiters),
            title_threshold: settings.redundant_title_threshold,
            artist_threshold: settings.redundant_artist_threshold,
        }
    }

    /// Normalized title to record for `song`, if title tracking is enabled
    pub fn title_key(&self, song: &Song) -> Option<String> {
        if self.title_threshold == 0 {
            return None;
        }
        song.title.as_deref().map(|title| self.normalizer.normalize(title))
    }

    /// Artist to record for `song`, if artist tracking is enabled
    pub fn artist_key(&self, song: &Song) -> Option<String> {
        if self.artist_threshold == 0 {
            return None;
        }
        song.artist.clone()
    }

    /// Title check first, artist check only if the title passed
    pub fn check(&self, song: &Song, histories: &Histories) -> Option<Duplicate> {
        if let Some(title) = self.title_key(song) {
            if histories.titles().contains(&title) {
                return Some(Duplicate::Title(title));
            }
        }

        // artists compare exactly, case included
        if let Some(artist) = self.artist_key(song) {
            if histories.artists().contains(&artist) {
                return Some(Duplicate::Artist(artist));
            }
        }

        None
    }
}
