use std::fmt::{Display, Formatter};

/// Result type used by the engine crate.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors produced by engine commands and session operations.
#[derive(Debug)]
pub enum EngineError {
    SessionNotLoaded,
    TrackMissing {
        media_id: String,
    },
    EntryOutOfRange {
        index: usize,
        len: usize,
    },
    EmptyCalibrationText,
    EditNotActive,
    RecordNotActive,
    InvalidPlaybackRate {
        rate: f64,
    },
    Store(store_fs::StoreFsError),
    SettingsFormat {
        source: serde_json::Error,
    },
    Media {
        message: String,
    },
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SessionNotLoaded => write!(f, "no session is loaded"),
            Self::TrackMissing { media_id } => {
                write!(f, "subtitle track not found for media {media_id:?}")
            }
            Self::EntryOutOfRange { index, len } => {
                write!(
                    f,
                    "entry index {index} out of range for track of {len} entries"
                )
            }
            Self::EmptyCalibrationText => {
                write!(f, "calibration text must not be empty")
            }
            Self::EditNotActive => write!(f, "no calibration session is active"),
            Self::RecordNotActive => write!(f, "no record-along session is active"),
            Self::InvalidPlaybackRate { rate } => {
                write!(f, "playback rate must be positive and finite: {rate}")
            }
            Self::Store(err) => write!(f, "durable store error: {err}"),
            Self::SettingsFormat { source } => {
                write!(f, "settings record is malformed: {source}")
            }
            Self::Media { message } => write!(f, "media playback error: {message}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::SettingsFormat { source } => Some(source),
            _ => None,
        }
    }
}

impl From<store_fs::StoreFsError> for EngineError {
    fn from(value: store_fs::StoreFsError) -> Self {
        Self::Store(value)
    }
}
