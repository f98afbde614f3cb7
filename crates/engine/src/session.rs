use tracing::debug;

use crate::error::{EngineError, Result};
use crate::track::{SubtitleEntry, SubtitleTrack};

/// Which replay boundary a calibration offset adjusts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetBoundary {
    Start,
    End,
}

/// Mutable calibration buffer for one entry.
///
/// Snapshots the entry's precise bounds and text at edit start; nothing in
/// the visible track changes until [`EditBuffer::committed_track`] builds
/// the replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditBuffer {
    pub index: usize,
    pub precise_start_ms: i64,
    pub precise_end_ms: i64,
    pub text: String,
}

impl EditBuffer {
    /// Copies one entry's calibration fields into a fresh buffer.
    pub fn snapshot(entry: &SubtitleEntry) -> Self {
        Self {
            index: entry.index,
            precise_start_ms: entry.precise_start_ms,
            precise_end_ms: entry.precise_end_ms,
            text: entry.text.clone(),
        }
    }

    /// Shifts one boundary by `delta_ms` relative to its current buffered
    /// value, so repeated offsets compound additively.
    ///
    /// # Example
    /// ```
    /// use engine::{EditBuffer, OffsetBoundary, SubtitleEntry};
    ///
    /// let entry = SubtitleEntry {
    ///     index: 0,
    ///     start_ms: 1_000,
    ///     end_ms: 2_000,
    ///     precise_start_ms: 1_000,
    ///     precise_end_ms: 2_000,
    ///     text: "line".to_string(),
    /// };
    /// let mut buffer = EditBuffer::snapshot(&entry);
    /// buffer.offset(OffsetBoundary::Start, 500);
    /// buffer.offset(OffsetBoundary::Start, -200);
    /// assert_eq!(buffer.precise_start_ms, 1_300);
    /// ```
    pub fn offset(&mut self, boundary: OffsetBoundary, delta_ms: i64) {
        match boundary {
            OffsetBoundary::Start => {
                self.precise_start_ms = self.precise_start_ms.saturating_add(delta_ms);
            }
            OffsetBoundary::End => {
                self.precise_end_ms = self.precise_end_ms.saturating_add(delta_ms);
            }
        }
        debug!(
            index = self.index,
            delta_ms,
            precise_start_ms = self.precise_start_ms,
            precise_end_ms = self.precise_end_ms,
            "calibration boundary offset"
        );
    }

    /// Builds the replacement track with this buffer committed.
    ///
    /// Fails with [`EngineError::EmptyCalibrationText`] when the trimmed
    /// text is empty; `track` is untouched either way. On success the
    /// caller swaps the returned track in wholesale, so readers holding
    /// the old reference never observe a half-updated entry.
    pub fn committed_track(&self, track: &SubtitleTrack) -> Result<SubtitleTrack> {
        let trimmed = self.text.trim();
        if trimmed.is_empty() {
            return Err(EngineError::EmptyCalibrationText);
        }
        if self.index >= track.len() {
            return Err(EngineError::EntryOutOfRange {
                index: self.index,
                len: track.len(),
            });
        }

        let mut entries = track.entries.clone();
        let target = &mut entries[self.index];
        target.precise_start_ms = self.precise_start_ms;
        target.precise_end_ms = self.precise_end_ms;
        target.text = trimmed.to_string();

        Ok(SubtitleTrack {
            media_id: track.media_id.clone(),
            entries,
        })
    }
}
