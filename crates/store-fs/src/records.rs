use serde::{Deserialize, Serialize};

/// One subtitle line as stored on disk.
///
/// Display bounds (`start_ms`/`end_ms`) drive highlighting; precise bounds
/// drive bounded replay and may diverge through calibration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRecord {
    pub index: usize,
    pub start_ms: i64,
    pub end_ms: i64,
    pub precise_start_ms: i64,
    pub precise_end_ms: i64,
    pub text: String,
}

/// Stored subtitle track, sorted ascending by `start_ms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub media_id: String,
    pub entries: Vec<EntryRecord>,
}

/// Last-read position for one media asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub media_id: String,
    pub last_index: usize,
}
