use std::sync::Arc;

use crate::models::SongFields;

pub const FIELDED_FILENAME: &str = "fieldedFilename";
pub const PLAIN_PATH: &str = "plainPath";

/// Capability that derives descriptive song fields from a song path
#[cfg_attr(test, mockall::automock)]
pub trait SongDetailsExtractor: Send + Sync {
    fn extract(&self, path: &str) -> SongFields;
}

/// Reads `Title-Artist-Album-Label-Year.ext` style file names
pub struct FieldedFilename;

impl SongDetailsExtractor for FieldedFilename {
    fn extract(&self, path: &str) -> SongFields {
        let Some((_, file_name)) = path.rsplit_once(['/', '\\']) else {
            // a bare entry is all we have, so it is the title
            return SongFields {
                title: Some(path.to_string()),
                ..SongFields::default()
            };
        };

        let mut fields = strip_extension(file_name).split('-').map(clean_field);
        SongFields {
            title: fields.next().flatten(),
            artist: fields.next().flatten(),
            album: fields.next().flatten(),
            label: fields.next().flatten(),
            year: fields.next().flatten(),
            details_loaded: true,
        }
    }
}

/// Uses the file stem as the title and nothing else
pub struct PlainPath;

impl SongDetailsExtractor for PlainPath {
    fn extract(&self, path: &str) -> SongFields {
        let file_name = path
            .rsplit_once(['/', '\\'])
            .map_or(path, |(_, name)| name);
        SongFields {
            title: clean_field(strip_extension(file_name)),
            ..SongFields::default()
        }
    }
}

fn strip_extension(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            stem
        }
        _ => file_name,
    }
}

fn clean_field(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Named extractors, resolved once at startup
pub struct ExtractorRegistry {
    extractors: Vec<(String, Arc<dyn SongDetailsExtractor>)>,
    default_name: String,
}

impl ExtractorRegistry {
    pub fn empty(default_name: impl Into<String>) -> Self {
        Self {
            extractors: Vec::new(),
            default_name: default_name.into(),
        }
    }

    /// Registry holding the built-in extractors, `fieldedFilename` as default
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty(FIELDED_FILENAME);
        registry.register(FIELDED_FILENAME, Arc::new(FieldedFilename));
        registry.register(PLAIN_PATH, Arc::new(PlainPath));
        registry
    }

    /// Register an extractor, replacing any previous one with the same name
    pub fn register(&mut self, name: impl Into<String>, extractor: Arc<dyn SongDetailsExtractor>) {
        let name = name.into();
        self.extractors.retain(|(existing, _)| *existing != name);
        self.extractors.push((name, extractor));
    }

    pub fn set_default(&mut self, name: impl Into<String>) {
        self.default_name = name.into();
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn SongDetailsExtractor>> {
        self.extractors
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, extractor)| Arc::clone(extractor))
    }

    pub fn default_extractor(&self) -> Option<Arc<dyn SongDetailsExtractor>> {
        self.get(&self.default_name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.extractors.iter().map(|(name, _)| name.as_str()).collect()
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fielded_filename_splits_all_fields() {
        let fields =
            FieldedFilename.extract("/music/Hey Jude-The Beatles-Past Masters-Apple-1968.mp3");

        assert_eq!(fields.title.as_deref(), Some("Hey Jude"));
        assert_eq!(fields.artist.as_deref(), Some("The Beatles"));
        assert_eq!(fields.album.as_deref(), Some("Past Masters"));
        assert_eq!(fields.label.as_deref(), Some("Apple"));
        assert_eq!(fields.year.as_deref(), Some("1968"));
        assert!(fields.details_loaded);
    }

    #[test]
    fn test_fielded_filename_with_missing_fields() {
        let fields = FieldedFilename.extract("/music/Intro.flac");

        assert_eq!(fields.title.as_deref(), Some("Intro"));
        assert_eq!(fields.artist, None);
        assert_eq!(fields.year, None);
        assert!(fields.details_loaded);
    }

    #[test]
    fn test_fielded_filename_bare_entry_is_title() {
        let fields = FieldedFilename.extract("Song A (Remix)");

        assert_eq!(fields.title.as_deref(), Some("Song A (Remix)"));
        assert!(!fields.details_loaded);
    }

    #[test]
    fn test_plain_path_uses_stem() {
        let fields = PlainPath.extract("C:\\music\\Track One-Someone.ogg");

        assert_eq!(fields.title.as_deref(), Some("Track One-Someone"));
        assert_eq!(fields.artist, None);
        assert!(!fields.details_loaded);
    }

    #[test]
    fn test_strip_extension_keeps_dotted_titles() {
        assert_eq!(strip_extension("Mr. Blue Sky"), "Mr. Blue Sky");
        assert_eq!(strip_extension("song.mp3"), "song");
        assert_eq!(strip_extension(".hidden"), ".hidden");
    }

    #[test]
    fn test_registry_resolves_by_name() {
        let mut registry = ExtractorRegistry::with_builtins();
        assert!(registry.get(PLAIN_PATH).is_some());
        assert!(registry.get("mp3Tags").is_none());
        assert!(registry.default_extractor().is_some());

        registry.set_default("missing");
        assert!(registry.default_extractor().is_none());
    }
}
