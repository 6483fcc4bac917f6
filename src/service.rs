use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::library::LibraryLoader;
use crate::playlist::{Playlist, PlaylistSettings, PublishReport};

pub type SharedPlaylist = Arc<Mutex<Playlist>>;

/// Lock a shared playlist, recovering the data if a holder panicked
pub fn lock_playlist(shared: &Mutex<Playlist>) -> MutexGuard<'_, Playlist> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns every playlist by name and runs their loads
///
/// Each playlist sits behind its own mutex, so playlists never contend with
/// each other. Library I/O happens outside that mutex: while a reload reads
/// files the playlist keeps serving its current library.
pub struct PlaylistService {
    engine: EngineConfig,
    loader: LibraryLoader,
    playlists: RwLock<HashMap<String, SharedPlaylist>>,
}

impl PlaylistService {
    pub fn new(engine: EngineConfig, loader: LibraryLoader) -> Self {
        Self {
            engine,
            loader,
            playlists: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new, unloaded playlist
    pub fn create(&self, settings: PlaylistSettings) -> Result<SharedPlaylist> {
        self.insert(Playlist::new(settings, self.engine.clone()))
    }

    /// Register an already built playlist under its name
    pub fn insert(&self, playlist: Playlist) -> Result<SharedPlaylist> {
        let mut playlists = self.playlists.write().unwrap_or_else(PoisonError::into_inner);
        let name = playlist.name().to_string();
        if playlists.contains_key(&name) {
            return Err(EngineError::PlaylistExists(name));
        }

        let shared = Arc::new(Mutex::new(playlist));
        playlists.insert(name.clone(), Arc::clone(&shared));
        tracing::info!("Playlist {} registered", name);
        Ok(shared)
    }

    pub fn get(&self, name: &str) -> Result<SharedPlaylist> {
        self.playlists
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::PlaylistNotFound(name.to_string()))
    }

    /// Registered playlist names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .playlists
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn remove(&self, name: &str) -> Result<SharedPlaylist> {
        let removed = self
            .playlists
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .ok_or_else(|| EngineError::PlaylistNotFound(name.to_string()))?;
        tracing::info!("Playlist {} removed", name);
        Ok(removed)
    }

    /// Run `f` with exclusive access to the named playlist
    pub fn with_playlist<T>(&self, name: &str, f: impl FnOnce(&mut Playlist) -> T) -> Result<T> {
        let shared = self.get(name)?;
        let mut playlist = lock_playlist(&shared);
        Ok(f(&mut playlist))
    }

    /// Load the playlist's configured source and publish it
    ///
    /// When loads of one playlist overlap, only the last one started
    /// publishes. Earlier ones return [`EngineError::Superseded`].
    pub fn load(&self, name: &str) -> Result<PublishReport> {
        let shared = self.get(name)?;

        let (source, ticket) = {
            let mut playlist = lock_playlist(&shared);
            let source = playlist.source()?;
            (source, playlist.begin_load())
        };

        let result = self.loader.load(&source);

        lock_playlist(&shared).finish_load(ticket, result)
    }

    /// Replace the library of a loaded playlist, keeping its histories
    pub fn reload(&self, name: &str) -> Result<PublishReport> {
        self.load(name)
    }

    /// Load every registered playlist, reporting each outcome
    pub fn load_all(&self) -> Vec<(String, Result<PublishReport>)> {
        self.names()
            .into_iter()
            .map(|name| {
                let result = self.load(&name);
                (name, result)
            })
            .collect()
    }

    /// Apply new settings, reloading when the source changed
    pub fn update(&self, settings: PlaylistSettings) -> Result<Option<PublishReport>> {
        let name = settings.name.clone();
        let change = self.with_playlist(&name, |playlist| playlist.update_settings(settings))?;

        if change.source_changed {
            tracing::info!("Playlist {} source changed, reloading", name);
            return self.reload(&name).map(Some);
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::details::{FieldedFilename, SongDetailsExtractor};
    use crate::error::LoadError;
    use crate::models::SongFields;
    use crate::playlist::PlaylistState;
    use std::fs;
    use std::path::Path;
    use std::sync::mpsc;
    use tempfile::tempdir;

    fn service() -> PlaylistService {
        PlaylistService::new(
            EngineConfig::default(),
            LibraryLoader::new(Arc::new(FieldedFilename)),
        )
    }

    fn write_list(path: &Path, entries: &[&str]) {
        fs::write(path, entries.join("\n")).expect("write list");
    }

    #[test]
    fn test_create_get_and_remove() {
        let service = service();
        service.create(PlaylistSettings::new("rock")).unwrap();

        assert!(matches!(
            service.create(PlaylistSettings::new("rock")),
            Err(EngineError::PlaylistExists(_))
        ));
        assert_eq!(service.names(), vec!["rock".to_string()]);
        assert!(service.get("rock").is_ok());

        service.remove("rock").unwrap();
        assert!(matches!(service.get("rock"), Err(EngineError::PlaylistNotFound(_))));
    }

    #[test]
    fn test_load_without_source_fails() {
        let service = service();
        service.create(PlaylistSettings::new("nowhere")).unwrap();

        assert!(matches!(service.load("nowhere"), Err(EngineError::NoSource(_))));
    }

    #[test]
    fn test_load_publishes_library() {
        let dir = tempdir().expect("tempdir");
        let list = dir.path().join("songs.txt");
        write_list(&list, &["/m/One-A.mp3", "/m/Two-B.mp3", "/m/Three-C.mp3"]);

        let service = service();
        service
            .create(PlaylistSettings::new("mix").with_file_path(&list))
            .unwrap();

        let report = service.load("mix").unwrap();
        assert_eq!(report.song_count, 3);

        let (state, count, selection) = service
            .with_playlist("mix", |p| (p.state(), p.count(), p.next_song()))
            .unwrap();
        assert_eq!(state, PlaylistState::Ready);
        assert_eq!(count, 3);
        assert!(selection.is_some());
    }

    #[test]
    fn test_failed_reload_keeps_serving() {
        let dir = tempdir().expect("tempdir");
        let list = dir.path().join("songs.txt");
        write_list(&list, &["/m/One-A.mp3", "/m/Two-B.mp3"]);

        let service = service();
        service
            .create(PlaylistSettings::new("mix").with_file_path(&list))
            .unwrap();
        service.load("mix").unwrap();
        service.with_playlist("mix", |p| p.next_song()).unwrap();

        fs::remove_file(&list).expect("remove list");
        let result = service.reload("mix");

        assert!(matches!(result, Err(EngineError::Load(LoadError::NotFound(_)))));
        let (state, count, history) = service
            .with_playlist("mix", |p| (p.state(), p.count(), p.song_history().len()))
            .unwrap();
        assert_eq!(state, PlaylistState::Ready);
        assert_eq!(count, 2);
        assert_eq!(history, 1);
    }

    #[test]
    fn test_failed_first_load_stays_unloaded() {
        let dir = tempdir().expect("tempdir");
        let service = service();
        service
            .create(PlaylistSettings::new("ghost").with_file_path(dir.path().join("missing.txt")))
            .unwrap();

        assert!(service.load("ghost").is_err());
        let state = service.with_playlist("ghost", |p| p.state()).unwrap();
        assert_eq!(state, PlaylistState::Unloaded);
    }

    #[test]
    fn test_reload_keeps_history_and_repoints_indices() {
        let dir = tempdir().expect("tempdir");
        let list = dir.path().join("songs.txt");
        write_list(&list, &["/m/One-A.mp3", "/m/Two-B.mp3"]);

        let service = service();
        service
            .create(PlaylistSettings::new("mix").with_file_path(&list))
            .unwrap();
        service.load("mix").unwrap();
        service.with_playlist("mix", |p| p.add_priority_request(1)).unwrap().unwrap();
        service.with_playlist("mix", |p| p.next_song()).unwrap();

        // "Two" moves to index 2 and "One" disappears from the list and the disk
        write_list(&list, &["/m/Zero-Z.mp3", "/m/Extra-E.mp3", "/m/Two-B.mp3"]);
        service.with_playlist("mix", |p| p.add_priority_request(0)).unwrap().unwrap();
        let report = service.reload("mix").unwrap();

        assert_eq!(report.song_count, 3);
        assert_eq!(report.history_kept, 1);
        assert_eq!(report.history_dropped, 0);
        assert_eq!(report.requests_dropped, 1);
        let (history_index, current) = service
            .with_playlist("mix", |p| (p.song_history()[0].index, p.current_song().cloned()))
            .unwrap();
        assert_eq!(history_index, 2);
        assert_eq!(current.map(|c| c.index), Some(2));
    }

    #[test]
    fn test_reload_drops_history_for_vanished_files() {
        let dir = tempdir().expect("tempdir");
        let song = dir.path().join("Gone-Artist.mp3");
        fs::write(&song, b"x").expect("write song");

        let service = service();
        service
            .create(PlaylistSettings::new("dir").with_file_path(dir.path()))
            .unwrap();
        service.load("dir").unwrap();
        service.with_playlist("dir", |p| p.next_song()).unwrap();

        fs::remove_file(&song).expect("remove song");
        fs::write(dir.path().join("New-Artist.mp3"), b"x").expect("write song");
        let report = service.reload("dir").unwrap();

        assert_eq!(report.history_dropped, 1);
        assert_eq!(report.history_kept, 0);
    }

    #[test]
    fn test_update_reloads_on_source_change() {
        let dir = tempdir().expect("tempdir");
        let first = dir.path().join("first.txt");
        let second = dir.path().join("second.txt");
        write_list(&first, &["/m/One-A.mp3"]);
        write_list(&second, &["/m/One-A.mp3", "/m/Two-B.mp3"]);

        let service = service();
        let settings = PlaylistSettings::new("mix").with_file_path(&first);
        service.create(settings.clone()).unwrap();
        service.load("mix").unwrap();

        assert!(service.update(settings.clone().with_title_threshold(1)).unwrap().is_none());
        let report = service.update(settings.with_file_path(&second)).unwrap();

        assert_eq!(report.map(|r| r.song_count), Some(2));
    }

    /// Parks on songs named "Slow" until released
    struct GatedExtractor {
        started: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl SongDetailsExtractor for GatedExtractor {
        fn extract(&self, path: &str) -> SongFields {
            if path.contains("Slow") {
                self.started.lock().unwrap().send(()).unwrap();
                self.release.lock().unwrap().recv().unwrap();
            }
            FieldedFilename.extract(path)
        }
    }

    #[test]
    fn test_superseded_load_does_not_publish() {
        let dir = tempdir().expect("tempdir");
        let first = dir.path().join("first.txt");
        let second = dir.path().join("second.txt");
        write_list(&first, &["/m/Slow-A.mp3"]);
        write_list(&second, &["/m/One-A.mp3", "/m/Two-B.mp3"]);

        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let extractor = GatedExtractor {
            started: Mutex::new(started_tx),
            release: Mutex::new(release_rx),
        };
        let service = PlaylistService::new(
            EngineConfig::default(),
            LibraryLoader::new(Arc::new(extractor)),
        );
        let settings = PlaylistSettings::new("mix").with_file_path(&first);
        service.create(settings.clone()).unwrap();

        std::thread::scope(|scope| {
            let slow = scope.spawn(|| service.load("mix"));
            started_rx.recv().expect("slow load started");

            let report = service.update(settings.with_file_path(&second)).unwrap();
            assert_eq!(report.map(|r| r.song_count), Some(2));

            release_tx.send(()).expect("release slow load");
            let result = slow.join().expect("slow load thread");
            assert!(matches!(result, Err(EngineError::Superseded(_))));
        });

        let (state, count, source) = service
            .with_playlist("mix", |p| (p.state(), p.count(), p.settings().file_path.clone()))
            .unwrap();
        assert_eq!(state, PlaylistState::Ready);
        assert_eq!(count, 2);
        assert_eq!(source, Some(second));
    }

    #[test]
    fn test_playlists_are_independent_across_threads() {
        let dir = tempdir().expect("tempdir");
        let service = service();
        for name in ["a", "b", "c"] {
            let list = dir.path().join(format!("{name}.txt"));
            let entries: Vec<String> = (0..20).map(|i| format!("/m/{name}{i}-X.mp3")).collect();
            let entries: Vec<&str> = entries.iter().map(String::as_str).collect();
            write_list(&list, &entries);
            service
                .create(PlaylistSettings::new(name).with_file_path(&list))
                .unwrap();
        }
        for (_, result) in service.load_all() {
            result.unwrap();
        }

        std::thread::scope(|scope| {
            for name in ["a", "b", "c"] {
                let service = &service;
                scope.spawn(move || {
                    for _ in 0..50 {
                        service.with_playlist(name, |p| p.next_song()).unwrap();
                    }
                });
            }
        });

        for name in ["a", "b", "c"] {
            let (history, permutation) = service
                .with_playlist(name, |p| {
                    (p.song_history().len(), p.shuffle().map(|s| s.is_permutation()))
                })
                .unwrap();
            assert_eq!(history, 50);
            assert_eq!(permutation, Some(true));
        }
    }
}
