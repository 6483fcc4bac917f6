//! Radio-style playlist engine.
//!
//! A [`Playlist`] holds a song library, a shuffled playback order over it,
//! pending priority requests and rolling histories, and answers "what plays
//! next". [`PlaylistService`] keeps playlists by name and loads their
//! libraries without blocking readers.

pub mod config;
pub mod details;
pub mod error;
pub mod library;
pub mod models;
pub mod playlist;
pub mod service;


pub use config::{EngineConfig, load_config};
pub use details::{ExtractorRegistry, SongDetailsExtractor};
pub use error::{EngineError, LoadError, Result};
pub use library::LibraryLoader;
pub use models::{Song, SongFields, SongLibrary};
pub use playlist::{Playlist, PlaylistSettings, PlaylistState, Selection};
pub use service::{PlaylistService, SharedPlaylist};
