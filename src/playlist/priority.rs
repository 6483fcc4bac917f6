use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use super::metadata::PriorityRequest;

/// FIFO of explicit song requests, at most one per song
///
/// Lookups are linear; the queue is expected to stay short.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriorityQueue {
    requests: VecDeque<PriorityRequest>,
}

impl PriorityQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue position of the pending request for `song_index`
    pub fn position(&self, song_index: usize) -> Option<usize> {
        self.requests
            .iter()
            .position(|request| request.song_index == song_index)
    }

    /// Append a request and return the new queue length, or the position of
    /// the request already pending for the same song
    pub fn push(&mut self, song_index: usize, timestamp: DateTime<Utc>) -> Result<usize, usize> {
        if let Some(position) = self.position(song_index) {
            return Err(position);
        }
        self.requests.push_back(PriorityRequest {
            song_index,
            timestamp,
        });
        Ok(self.requests.len())
    }

    pub fn pop(&mut self) -> Option<PriorityRequest> {
        self.requests.pop_front()
    }

    pub fn get(&self, position: usize) -> Option<&PriorityRequest> {
        self.requests.get(position)
    }

    pub fn remove(&mut self, position: usize) -> Option<PriorityRequest> {
        self.requests.remove(position)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PriorityRequest> {
        self.requests.iter()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Drop every pending request, returning how many there were
    pub fn clear(&mut self) -> usize {
        let dropped = self.requests.len();
        self.requests.clear();
        dropped
    }
}
