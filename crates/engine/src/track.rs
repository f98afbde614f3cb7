use serde::{Deserialize, Serialize};

/// One subtitle line with a display interval and an independent, more
/// precise replay interval used for bounded playback.
///
/// All times are milliseconds. Precise bounds start equal to the display
/// bounds and diverge only through calibration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleEntry {
    pub index: usize,
    pub start_ms: i64,
    pub end_ms: i64,
    pub precise_start_ms: i64,
    pub precise_end_ms: i64,
    pub text: String,
}

/// Subtitle track sorted ascending by `start_ms`.
///
/// Gaps between entries are permitted; loaders guarantee the ordering and
/// that `entry.index` equals its position in `entries`. The engine never
/// mutates a track in place: calibration commits build a replacement track
/// and swap the shared reference wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleTrack {
    pub media_id: String,
    pub entries: Vec<SubtitleEntry>,
}

/// Direction for nearest-neighbor lookup on the start-time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    Forward,
    Backward,
}

impl SubtitleTrack {
    /// Finds the entry whose display interval contains `t_ms`.
    ///
    /// The interval is half-open: `start <= t < end`. Returns `None` when
    /// `t_ms` falls in a gap; callers keep their previous index in that
    /// case so the display stays stable between entries.
    pub fn containing(&self, t_ms: i64) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.start_ms <= t_ms && t_ms < entry.end_ms)
    }

    /// Finds the nearest entry by `start_ms` in the given direction.
    ///
    /// Forward returns the first entry with `start > t_ms`; Backward the
    /// last entry with `start < t_ms`. Comparison uses `start_ms` only, so
    /// the lookup is a binary search over the sorted track. Used when the
    /// caller's position is not resolved to an index, e.g. mid-scrub.
    ///
    /// # Example
    /// ```
    /// use engine::{SearchDirection, SubtitleEntry, SubtitleTrack};
    ///
    /// let track = SubtitleTrack {
    ///     media_id: "demo".to_string(),
    ///     entries: vec![SubtitleEntry {
    ///         index: 0,
    ///         start_ms: 1_000,
    ///         end_ms: 2_000,
    ///         precise_start_ms: 1_000,
    ///         precise_end_ms: 2_000,
    ///         text: "line".to_string(),
    ///     }],
    /// };
    ///
    /// assert_eq!(track.nearest(0, SearchDirection::Forward), Some(0));
    /// assert_eq!(track.nearest(0, SearchDirection::Backward), None);
    /// ```
    pub fn nearest(&self, t_ms: i64, direction: SearchDirection) -> Option<usize> {
        match direction {
            SearchDirection::Forward => {
                let first_after = self
                    .entries
                    .partition_point(|entry| entry.start_ms <= t_ms);
                (first_after < self.entries.len()).then_some(first_after)
            }
            SearchDirection::Backward => {
                let first_at_or_after =
                    self.entries.partition_point(|entry| entry.start_ms < t_ms);
                first_at_or_after.checked_sub(1)
            }
        }
    }

    /// Returns the entry at `index`, if any.
    pub fn entry(&self, index: usize) -> Option<&SubtitleEntry> {
        self.entries.get(index)
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the track has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
