use anyhow::{Context, Result, bail};

use crate::details::FIELDED_FILENAME;

pub const DEFAULT_SONG_HISTORY_LIMIT: usize = 500;
pub const DEFAULT_DUPLICATE_REPLACEMENT_RETRIES: usize = 10;

/// Process-wide engine settings shared by every playlist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Number of played songs kept in each playlist's history
    pub song_history_limit: usize,
    /// How many times a duplicate is moved aside before it is played anyway
    pub duplicate_replacement_retries: usize,
    /// Name of the song details extractor used by the loader
    pub song_details: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            song_history_limit: DEFAULT_SONG_HISTORY_LIMIT,
            duplicate_replacement_retries: DEFAULT_DUPLICATE_REPLACEMENT_RETRIES,
            song_details: FIELDED_FILENAME.to_string(),
        }
    }
}

impl EngineConfig {
    /// Build from a key lookup; unset keys keep their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let song_history_limit = parse_or(
            &lookup,
            "PLAYGEN_SONG_HISTORY_LIMIT",
            defaults.song_history_limit,
        )?;
        if song_history_limit == 0 {
            bail!("PLAYGEN_SONG_HISTORY_LIMIT must be greater than 0");
        }

        let duplicate_replacement_retries = parse_or(
            &lookup,
            "PLAYGEN_DUPLICATE_REPLACEMENT_RETRIES",
            defaults.duplicate_replacement_retries,
        )?;

        let song_details = lookup("PLAYGEN_SONG_DETAILS")
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(defaults.song_details);

        Ok(Self {
            song_history_limit,
            duplicate_replacement_retries,
            song_details,
        })
    }
}

fn parse_or(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: usize) -> Result<usize> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a non-negative integer, got '{raw}'")),
        None => Ok(default),
    }
}

/// Load configuration from `.env` and environment
pub fn load_config() -> Result<EngineConfig> {
    // Load `.env` file if present
    dotenv::dotenv().ok();
    EngineConfig::from_lookup(|key| std::env::var(key).ok())
}
