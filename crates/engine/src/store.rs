use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::mode::PlayMode;
use crate::track::{SubtitleEntry, SubtitleTrack};

/// Durable storage consumed by the engine.
///
/// `load_*` return `None` for absent records; absence is not an error.
pub trait DurableStore {
    /// Loads the subtitle track for one media asset.
    fn load_track(&self, media_id: &str) -> Result<Option<SubtitleTrack>>;

    /// Persists a whole track (calibration commits replace the track).
    fn save_track(&self, track: &SubtitleTrack) -> Result<()>;

    /// Loads the last persisted entry index for one media asset.
    fn load_progress(&self, media_id: &str) -> Result<Option<usize>>;

    /// Persists the current entry index for one media asset.
    fn save_progress(&self, media_id: &str, index: usize) -> Result<()>;
}

/// Settings storage consumed by the engine.
pub trait SettingsStore {
    /// Loads the settings record; `None` when never saved.
    fn load_settings(&self) -> Result<Option<Settings>>;

    /// Persists the settings record.
    fn save_settings(&self, settings: &Settings) -> Result<()>;
}

/// Flat settings record shared with the settings-panel UI.
///
/// Keys this build does not recognize are carried in `extra` so a
/// load/save round trip never drops them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub play_mode: PlayMode,
    pub playback_speed: f64,
    pub subtitle_blurred: bool,
    pub quiz_mode: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            play_mode: PlayMode::Continuous,
            playback_speed: 1.0,
            subtitle_blurred: false,
            quiz_mode: false,
            extra: serde_json::Map::new(),
        }
    }
}

/// Filesystem-backed store used by production wiring.
#[derive(Debug, Clone)]
pub struct FsDurableStore {
    inner: store_fs::FsStore,
}

impl FsDurableStore {
    /// Creates a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            inner: store_fs::FsStore::new(root),
        }
    }
}

impl DurableStore for FsDurableStore {
    fn load_track(&self, media_id: &str) -> Result<Option<SubtitleTrack>> {
        let record = self.inner.load_track(media_id)?;
        Ok(record.map(SubtitleTrack::from))
    }

    fn save_track(&self, track: &SubtitleTrack) -> Result<()> {
        self.inner.save_track(&store_fs::TrackRecord::from(track))?;
        Ok(())
    }

    fn load_progress(&self, media_id: &str) -> Result<Option<usize>> {
        let record = self.inner.load_progress(media_id)?;
        Ok(record.map(|record| record.last_index))
    }

    fn save_progress(&self, media_id: &str, index: usize) -> Result<()> {
        self.inner.save_progress(&store_fs::ProgressRecord {
            media_id: media_id.to_string(),
            last_index: index,
        })?;
        Ok(())
    }
}

impl SettingsStore for FsDurableStore {
    fn load_settings(&self) -> Result<Option<Settings>> {
        let Some(value) = self.inner.load_settings()? else {
            return Ok(None);
        };
        let settings = serde_json::from_value(value)
            .map_err(|source| EngineError::SettingsFormat { source })?;
        Ok(Some(settings))
    }

    fn save_settings(&self, settings: &Settings) -> Result<()> {
        let value = serde_json::to_value(settings)
            .map_err(|source| EngineError::SettingsFormat { source })?;
        self.inner.save_settings(&value)?;
        Ok(())
    }
}

impl From<store_fs::EntryRecord> for SubtitleEntry {
    fn from(value: store_fs::EntryRecord) -> Self {
        Self {
            index: value.index,
            start_ms: value.start_ms,
            end_ms: value.end_ms,
            precise_start_ms: value.precise_start_ms,
            precise_end_ms: value.precise_end_ms,
            text: value.text,
        }
    }
}

impl From<store_fs::TrackRecord> for SubtitleTrack {
    fn from(value: store_fs::TrackRecord) -> Self {
        Self {
            media_id: value.media_id,
            entries: value.entries.into_iter().map(SubtitleEntry::from).collect(),
        }
    }
}

impl From<&SubtitleTrack> for store_fs::TrackRecord {
    fn from(value: &SubtitleTrack) -> Self {
        Self {
            media_id: value.media_id.clone(),
            entries: value
                .entries
                .iter()
                .map(|entry| store_fs::EntryRecord {
                    index: entry.index,
                    start_ms: entry.start_ms,
                    end_ms: entry.end_ms,
                    precise_start_ms: entry.precise_start_ms,
                    precise_end_ms: entry.precise_end_ms,
                    text: entry.text.clone(),
                })
                .collect(),
        }
    }
}
