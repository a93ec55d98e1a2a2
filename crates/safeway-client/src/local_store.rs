//! Versioned on-device store for favorite and recent destinations.
//!
//! The file holds `{"version": 2, "favorites": [...], "recents": [...]}`.
//! The older unversioned layout (`safeway_favorites` / `safeway_recent`,
//! plain name lists) is migrated on open and rewritten in the current
//! format.

use std::io::Write;
use std::path::{Path, PathBuf};

use safeway_core::Coordinate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const STORE_VERSION: u32 = 2;
pub const MAX_RECENTS: usize = 10;

const LEGACY_FAVORITES_KEY: &str = "safeway_favorites";
const LEGACY_RECENTS_KEY: &str = "safeway_recent";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("store file {path} is not valid JSON: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("store file {path} has unsupported version {version}")]
    UnsupportedVersion { path: String, version: u64 },

    #[error("store file {path} has no version and no legacy keys")]
    Unrecognized { path: String },
}

/// A saved destination. Legacy entries carry only a name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<Coordinate>,
}

impl Place {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            coordinate: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StoreData {
    version: u32,
    #[serde(default)]
    favorites: Vec<Place>,
    #[serde(default)]
    recents: Vec<Place>,
}

impl Default for StoreData {
    fn default() -> Self {
        Self {
            version: STORE_VERSION,
            favorites: Vec::new(),
            recents: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct LegacyData {
    #[serde(rename = "safeway_favorites", default)]
    favorites: Vec<String>,
    #[serde(rename = "safeway_recent", default)]
    recents: Vec<String>,
}

impl From<LegacyData> for StoreData {
    fn from(legacy: LegacyData) -> Self {
        let mut data = StoreData {
            favorites: legacy.favorites.into_iter().map(Place::named).collect(),
            ..StoreData::default()
        };
        // Replay oldest first so the result is deduplicated and capped.
        for name in legacy.recents.into_iter().rev() {
            push_recent(&mut data.recents, Place::named(name));
        }
        data
    }
}

/// File-backed store. Every mutation is written through atomically.
#[derive(Debug)]
pub struct LocalStore {
    path: PathBuf,
    data: StoreData,
}

impl LocalStore {
    /// Opens the store at `path`, creating an empty one if the file does
    /// not exist and migrating a legacy file in place.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be read, parsed, or (after
    /// migration) rewritten, or carries a version newer than this build.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let display = path.display().to_string();

        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self {
                    path,
                    data: StoreData::default(),
                });
            }
            Err(e) => {
                return Err(StoreError::Io {
                    path: display,
                    source: e,
                })
            }
        };

        let value: serde_json::Value =
            serde_json::from_str(&raw).map_err(|e| StoreError::Parse {
                path: display.clone(),
                source: e,
            })?;

        match value.get("version").and_then(serde_json::Value::as_u64) {
            Some(v) if v == u64::from(STORE_VERSION) => {
                let data = serde_json::from_value(value).map_err(|e| StoreError::Parse {
                    path: display,
                    source: e,
                })?;
                Ok(Self { path, data })
            }
            Some(version) => Err(StoreError::UnsupportedVersion {
                path: display,
                version,
            }),
            None if is_legacy(&value) => {
                let legacy: LegacyData =
                    serde_json::from_value(value).map_err(|e| StoreError::Parse {
                        path: display.clone(),
                        source: e,
                    })?;
                let store = Self {
                    path,
                    data: legacy.into(),
                };
                store.save()?;
                let store_path = &display;
                tracing::info!(
                    path = %store_path,
                    favorites = store.data.favorites.len(),
                    recents = store.data.recents.len(),
                    "migrated legacy local store to version {STORE_VERSION}"
                );
                Ok(store)
            }
            None => Err(StoreError::Unrecognized { path: display }),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn favorites(&self) -> &[Place] {
        &self.data.favorites
    }

    /// Most recent first.
    #[must_use]
    pub fn recents(&self) -> &[Place] {
        &self.data.recents
    }

    #[must_use]
    pub fn is_favorite(&self, name: &str) -> bool {
        self.data.favorites.iter().any(|p| p.name == name)
    }

    /// Adds a favorite; an existing entry with the same name is replaced
    /// in place.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the write fails.
    pub fn add_favorite(&mut self, place: Place) -> Result<(), StoreError> {
        match self.data.favorites.iter_mut().find(|p| p.name == place.name) {
            Some(existing) => *existing = place,
            None => self.data.favorites.push(place),
        }
        self.save()
    }

    /// Returns whether anything was removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the write fails.
    pub fn remove_favorite(&mut self, name: &str) -> Result<bool, StoreError> {
        let before = self.data.favorites.len();
        self.data.favorites.retain(|p| p.name != name);
        let removed = self.data.favorites.len() != before;
        if removed {
            self.save()?;
        }
        Ok(removed)
    }

    /// Records a destination as most recent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the write fails.
    pub fn record_recent(&mut self, place: Place) -> Result<(), StoreError> {
        push_recent(&mut self.data.recents, place);
        self.save()
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the write fails.
    pub fn clear_recents(&mut self) -> Result<(), StoreError> {
        self.data.recents.clear();
        self.save()
    }

    /// Writes to a temp file in the same directory, then renames over the
    /// target so readers never see a partial file.
    fn save(&self) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.display().to_string(),
            source,
        };
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(io_err)?;

        let json = serde_json::to_vec_pretty(&self.data).map_err(|e| StoreError::Parse {
            path: self.path.display().to_string(),
            source: e,
        })?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(&json).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

fn is_legacy(value: &serde_json::Value) -> bool {
    value.get(LEGACY_FAVORITES_KEY).is_some() || value.get(LEGACY_RECENTS_KEY).is_some()
}

fn push_recent(recents: &mut Vec<Place>, place: Place) {
    recents.retain(|p| p.name != place.name);
    recents.insert(0, place);
    recents.truncate(MAX_RECENTS);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(places: &[Place]) -> Vec<&str> {
        places.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn missing_file_opens_empty_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = LocalStore::open(&path).unwrap();
        assert!(store.favorites().is_empty());
        assert!(store.recents().is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn recents_are_deduplicated_most_recent_first_and_capped() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::open(dir.path().join("store.json")).unwrap();

        for i in 0..12 {
            store.record_recent(Place::named(format!("place-{i}"))).unwrap();
        }
        store.record_recent(Place::named("place-5")).unwrap();

        let recents = names(store.recents());
        assert_eq!(recents.len(), MAX_RECENTS);
        assert_eq!(recents[0], "place-5");
        assert_eq!(recents[1], "place-11");
        assert_eq!(recents.iter().filter(|n| **n == "place-5").count(), 1);
        assert!(!recents.contains(&"place-0"));
    }

    #[test]
    fn mutations_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let mut store = LocalStore::open(&path).unwrap();
        store
            .add_favorite(Place {
                name: "Home".to_owned(),
                coordinate: Some(Coordinate::new(37.55, 126.97)),
            })
            .unwrap();
        store.add_favorite(Place::named("Office")).unwrap();
        assert!(store.remove_favorite("Office").unwrap());
        assert!(!store.remove_favorite("Office").unwrap());
        store.record_recent(Place::named("Seoul Station")).unwrap();

        let reopened = LocalStore::open(&path).unwrap();
        assert_eq!(reopened.favorites(), store.favorites());
        assert_eq!(names(reopened.recents()), vec!["Seoul Station"]);

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["version"], 2);
    }

    #[test]
    fn legacy_file_is_migrated_and_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(
            &path,
            r#"{"safeway_favorites": ["Home", "School"], "safeway_recent": ["A", "B", "A"]}"#,
        )
        .unwrap();

        let store = LocalStore::open(&path).unwrap();
        assert_eq!(names(store.favorites()), vec!["Home", "School"]);
        assert_eq!(names(store.recents()), vec!["A", "B"]);
        assert!(store.is_favorite("Home"));

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["version"], 2);
        assert!(raw.get(LEGACY_FAVORITES_KEY).is_none());
        assert!(raw.get(LEGACY_RECENTS_KEY).is_none());
    }

    #[test]
    fn newer_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, r#"{"version": 3, "favorites": [], "recents": []}"#).unwrap();

        let err = LocalStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedVersion { version: 3, .. }));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(
            LocalStore::open(&path).unwrap_err(),
            StoreError::Parse { .. }
        ));

        std::fs::write(&path, r#"{"theme": "dark"}"#).unwrap();
        assert!(matches!(
            LocalStore::open(&path).unwrap_err(),
            StoreError::Unrecognized { .. }
        ));
    }
}
