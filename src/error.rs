use std::path::PathBuf;

/// Failures while turning a song source into a library
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("song source {} does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("song source {} could not be read: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("song source {} produced no songs", .0.display())]
    Empty(PathBuf),
}

impl LoadError {
    pub(crate) fn from_io(path: PathBuf, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => LoadError::NotFound(path),
            _ => LoadError::Unreadable { path, source: err },
        }
    }
}

/// Errors surfaced by playlist and service operations
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("playlist {0} has no songs loaded yet")]
    NotReady(String),

    #[error("index {index} is out of range ({len} available)")]
    OutOfRange { index: usize, len: usize },

    #[error("song {song_index} is already requested at position {position}")]
    Conflict { song_index: usize, position: usize },

    #[error("playlist not found: {0}")]
    PlaylistNotFound(String),

    #[error("playlist already exists: {0}")]
    PlaylistExists(String),

    #[error("playlist {0} has no song source configured")]
    NoSource(String),

    #[error("load of playlist {0} was superseded by a newer one")]
    Superseded(String),

    #[error(transparent)]
    Load(#[from] LoadError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
