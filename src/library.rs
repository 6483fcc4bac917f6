use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::details::SongDetailsExtractor;
use crate::error::LoadError;
use crate::models::{Song, SongLibrary};

/// Turns a song list file or a directory into a `SongLibrary`
#[derive(Clone)]
pub struct LibraryLoader {
    extractor: Arc<dyn SongDetailsExtractor>,
}

impl LibraryLoader {
    pub fn new(extractor: Arc<dyn SongDetailsExtractor>) -> Self {
        Self { extractor }
    }

    /// Load a library from `source`
    ///
    /// A directory yields one song per entry in listing order. A file yields
    /// one song per non-blank line, with a trailing carriage return removed.
    /// Existing playlists are never touched; the caller decides when to
    /// publish the result.
    pub fn load(&self, source: &Path) -> Result<SongLibrary, LoadError> {
        let metadata =
            fs::metadata(source).map_err(|e| LoadError::from_io(source.to_path_buf(), e))?;

        let entries = if metadata.is_dir() {
            Self::directory_entries(source)?
        } else {
            Self::list_file_entries(source)?
        };

        if entries.is_empty() {
            return Err(LoadError::Empty(source.to_path_buf()));
        }

        let songs: Vec<Song> = entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                let fields = self.extractor.extract(&entry);
                tracing::debug!("Song {}: {}", index, entry);
                Song::from_fields(index, entry, fields)
            })
            .collect();

        tracing::info!("Loaded {} songs from {}", songs.len(), source.display());
        Ok(SongLibrary::new(songs))
    }

    fn directory_entries(dir: &Path) -> Result<Vec<String>, LoadError> {
        let read_dir = fs::read_dir(dir).map_err(|e| LoadError::from_io(dir.to_path_buf(), e))?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| LoadError::from_io(dir.to_path_buf(), e))?;
            entries.push(entry.path().to_string_lossy().into_owned());
        }
        Ok(entries)
    }

    fn list_file_entries(file: &Path) -> Result<Vec<String>, LoadError> {
        let content =
            fs::read_to_string(file).map_err(|e| LoadError::from_io(file.to_path_buf(), e))?;

        // `lines` keeps a trailing unterminated line and drops the final empty one
        Ok(content
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect())
    }
}
