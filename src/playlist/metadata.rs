use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Song;

/// A chosen song together with its library index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub index: usize,
    pub song: Song,
}

/// A past selection; the song is a snapshot taken when it was chosen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub index: usize,
    pub song: Song,
    pub timestamp: DateTime<Utc>,
}

/// An explicit "play this next" request waiting in the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityRequest {
    pub song_index: usize,
    pub timestamp: DateTime<Utc>,
}

/// Lifecycle of a playlist's library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaylistState {
    Unloaded,
    Loading,
    Ready,
    Reloading,
}

impl PlaylistState {
    /// Whether a library is installed and can serve selections
    pub fn is_serving(self) -> bool {
        matches!(self, PlaylistState::Ready | PlaylistState::Reloading)
    }
}

/// Summary of swapping a new library into a playlist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishReport {
    pub song_count: usize,
    pub history_kept: usize,
    pub history_dropped: usize,
    pub requests_dropped: usize,
}
