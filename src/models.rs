use serde::{Deserialize, Serialize};

/// Descriptive fields a details extractor pulls out of a song path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongFields {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub label: Option<String>,
    pub year: Option<String>,
    pub details_loaded: bool,
}

/// One entry of a song library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub index: usize,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub label: Option<String>,
    pub year: Option<String>,
    #[serde(rename = "file")]
    pub source_path: String,
    pub details_loaded: bool,
}

impl Song {
    pub fn from_fields(index: usize, source_path: impl Into<String>, fields: SongFields) -> Self {
        Song {
            index,
            title: fields.title,
            artist: fields.artist,
            album: fields.album,
            label: fields.label,
            year: fields.year,
            source_path: source_path.into(),
            details_loaded: fields.details_loaded,
        }
    }

    /// Title for display, falling back to the source path
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.source_path)
    }
}

/// An ordered, immutable set of songs indexed `0..len`
///
/// A reload never mutates a library; it produces a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongLibrary {
    songs: Vec<Song>,
}

impl SongLibrary {
    /// Build a library, renumbering songs so that `song.index` matches its position
    pub fn new(songs: Vec<Song>) -> Self {
        let songs = songs
            .into_iter()
            .enumerate()
            .map(|(index, song)| Song { index, ..song })
            .collect();
        SongLibrary { songs }
    }

    /// Library of title-only songs, mostly useful for tests and demos
    pub fn from_titles<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let songs = titles
            .into_iter()
            .enumerate()
            .map(|(index, title)| {
                let title = title.into();
                Song::from_fields(
                    index,
                    title.clone(),
                    SongFields {
                        title: Some(title),
                        ..SongFields::default()
                    },
                )
            })
            .collect();
        SongLibrary { songs }
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Song> {
        self.songs.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Song> {
        self.songs.iter()
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn position_of_source(&self, source_path: &str) -> Option<usize> {
        self.songs
            .iter()
            .position(|song| song.source_path == source_path)
    }
}
