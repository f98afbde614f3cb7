use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{Result, StoreFsError};
use crate::records::{ProgressRecord, TrackRecord};

const SETTINGS_FILE: &str = "settings.json";

/// JSON record store rooted at one directory.
///
/// Layout: `{root}/{media_id}.track.json`, `{root}/{media_id}.progress.json`
/// and a single `{root}/settings.json`. Writes go through a temp file and a
/// rename so a crashed write never leaves a truncated record behind.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Creates a store rooted at `root`. The directory is created lazily on
    /// the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the stored track for `media_id`, or `None` when absent.
    pub fn load_track(&self, media_id: &str) -> Result<Option<TrackRecord>> {
        self.read_json(&self.track_path(media_id)?)
    }

    /// Writes one track record.
    pub fn save_track(&self, record: &TrackRecord) -> Result<()> {
        let path = self.track_path(&record.media_id)?;
        self.write_json(&path, record)?;
        debug!(media_id = %record.media_id, entries = record.entries.len(), "track saved");
        Ok(())
    }

    /// Returns the stored progress for `media_id`, or `None` when absent.
    pub fn load_progress(&self, media_id: &str) -> Result<Option<ProgressRecord>> {
        self.read_json(&self.progress_path(media_id)?)
    }

    /// Writes one progress record.
    pub fn save_progress(&self, record: &ProgressRecord) -> Result<()> {
        let path = self.progress_path(&record.media_id)?;
        self.write_json(&path, record)?;
        debug!(media_id = %record.media_id, last_index = record.last_index, "progress saved");
        Ok(())
    }

    /// Returns the settings record, or `None` when absent.
    ///
    /// The record is kept as raw JSON so keys this build does not recognize
    /// survive a load/save round trip.
    pub fn load_settings(&self) -> Result<Option<serde_json::Value>> {
        self.read_json(&self.root.join(SETTINGS_FILE))
    }

    /// Writes the settings record.
    pub fn save_settings(&self, settings: &serde_json::Value) -> Result<()> {
        self.write_json(&self.root.join(SETTINGS_FILE), settings)
    }

    fn track_path(&self, media_id: &str) -> Result<PathBuf> {
        Ok(self.root.join(format!("{}.track.json", file_stem(media_id)?)))
    }

    fn progress_path(&self, media_id: &str) -> Result<PathBuf> {
        Ok(self
            .root
            .join(format!("{}.progress.json", file_stem(media_id)?)))
    }

    fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreFsError::Io {
                    context: "failed to read record",
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let value = serde_json::from_slice(&bytes).map_err(|source| StoreFsError::Serde {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Some(value))
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|source| StoreFsError::Io {
            context: "failed to create store root",
            path: self.root.clone(),
            source,
        })?;

        let json = serde_json::to_vec_pretty(value).map_err(|source| StoreFsError::Serde {
            path: path.to_path_buf(),
            source,
        })?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|source| StoreFsError::Io {
            context: "failed to write temp record",
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, path).map_err(|source| StoreFsError::Io {
            context: "failed to move record into place",
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Rejects media ids that would escape the store root or collide with the
/// temp/settings names.
fn file_stem(media_id: &str) -> Result<&str> {
    let usable = !media_id.is_empty()
        && media_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'));
    if usable {
        Ok(media_id)
    } else {
        Err(StoreFsError::InvalidMediaId {
            media_id: media_id.to_string(),
        })
    }
}
