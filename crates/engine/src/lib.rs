//! UI-agnostic subtitle-sync engine for sentence-level shadowing practice.

pub mod api;
pub mod error;
pub mod mode;
pub mod progress;
pub mod session;
pub mod store;
pub mod time;
pub mod track;
pub mod transport;

pub use api::{
    Command, EditView, Engine, EngineErrorEvent, EngineErrorKind, Event, SessionSnapshot,
};
pub use error::{EngineError, Result};
pub use mode::{Boundary, BoundedSource, EffectiveMode, PlayMode};
pub use progress::{Clock, PROGRESS_QUIET_PERIOD, ProgressDebouncer, SystemClock};
pub use session::{EditBuffer, OffsetBoundary};
pub use store::{DurableStore, FsDurableStore, Settings, SettingsStore};
pub use time::{millis_to_seconds, seconds_to_millis};
pub use track::{SearchDirection, SubtitleEntry, SubtitleTrack};
pub use transport::MediaTransport;
