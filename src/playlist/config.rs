use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Per-playlist settings, as stored alongside the playlist definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSettings {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Song list file or directory the library is loaded from
    #[serde(default)]
    pub file_path: Option<PathBuf>,
    /// How many recent titles block a repeat (0 disables the check)
    #[serde(default)]
    pub redundant_title_threshold: usize,
    /// How many recent artists block a repeat (0 disables the check)
    #[serde(default)]
    pub redundant_artist_threshold: usize,
    /// Characters that end the comparable part of a title, e.g. " (["
    #[serde(default)]
    pub partial_title_delimiters: String,
}

/// What changed when new settings were applied to a playlist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsChange {
    pub source_changed: bool,
    pub duplicate_rules_changed: bool,
}

impl PlaylistSettings {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            file_path: None,
            redundant_title_threshold: 0,
            redundant_artist_threshold: 0,
            partial_title_delimiters: String::new(),
        }
    }

    pub fn with_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn with_title_threshold(mut self, threshold: usize) -> Self {
        self.redundant_title_threshold = threshold;
        self
    }

    pub fn with_artist_threshold(mut self, threshold: usize) -> Self {
        self.redundant_artist_threshold = threshold;
        self
    }

    pub fn with_delimiters(mut self, delimiters: impl Into<String>) -> Self {
        self.partial_title_delimiters = delimiters.into();
        self
    }

    pub fn diff(&self, other: &PlaylistSettings) -> SettingsChange {
        SettingsChange {
            source_changed: self.file_path != other.file_path,
            duplicate_rules_changed: self.redundant_title_threshold
                != other.redundant_title_threshold
                || self.redundant_artist_threshold != other.redundant_artist_threshold
                || self.partial_title_delimiters != other.partial_title_delimiters,
        }
    }

    /// Load playlist definitions directly from a JSON array file
    pub fn load_all_from_file(path: &str) -> anyhow::Result<Vec<PlaylistSettings>> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read playlist definitions from {path}"))?;
        let settings: Vec<PlaylistSettings> = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse playlist definitions in {path}"))?;
        Ok(settings)
    }
}
