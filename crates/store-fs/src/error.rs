use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, StoreFsError>;

/// Error type for JSON record reads/writes on the local filesystem.
#[derive(Debug)]
pub enum StoreFsError {
    Io {
        context: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    Serde {
        path: PathBuf,
        source: serde_json::Error,
    },
    InvalidMediaId {
        media_id: String,
    },
}

impl Display for StoreFsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io {
                context,
                path,
                source,
            } => {
                write!(f, "{context}: {} ({source})", path.display())
            }
            Self::Serde { path, source } => {
                write!(
                    f,
                    "record serialization/deserialization failed at {} ({source})",
                    path.display()
                )
            }
            Self::InvalidMediaId { media_id } => {
                write!(f, "media id is not usable as a file stem: {media_id:?}")
            }
        }
    }
}

impl std::error::Error for StoreFsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Serde { source, .. } => Some(source),
            Self::InvalidMediaId { .. } => None,
        }
    }
}
