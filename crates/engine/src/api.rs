use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};
use crate::mode::{EffectiveMode, PlayMode, override_boundary};
use crate::progress::{Clock, PROGRESS_QUIET_PERIOD, ProgressDebouncer, SystemClock};
use crate::session::{EditBuffer, OffsetBoundary};
use crate::store::{DurableStore, FsDurableStore, Settings, SettingsStore};
use crate::time::millis_to_seconds;
use crate::track::{SearchDirection, SubtitleTrack};
use crate::transport::MediaTransport;

/// Commands accepted by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Opens a practice session: loads the track, the restored progress
    /// and the settings record for `media_id`.
    Open {
        media_id: String,
    },
    /// Playback-time advance from the media clock, in milliseconds.
    ///
    /// Ticks drive the play-mode controller and the deferred progress
    /// write; they arrive at whatever frequency the media primitive emits
    /// `timeupdate`.
    Tick {
        position_ms: i64,
    },
    /// Explicit resume by the user. Bounded modes re-seek to their replay
    /// start before playback continues.
    Resume,
    SetMode {
        mode: PlayMode,
    },
    SetPlaybackSpeed {
        rate: f64,
    },
    /// Skips to the previous entry. No-op at the start of the track.
    Previous,
    /// Skips to the next entry. No-op at the end of the track.
    Next,
    /// A manual scrub began; index advancement is suspended until
    /// [`Command::SeekEnded`].
    SeekStarted,
    SeekEnded {
        position_ms: i64,
    },
    /// Starts a calibration session for one entry.
    ///
    /// # Example
    /// ```ignore
    /// let _ = engine.handle_command(Command::EnterEdit { index: 3 });
    /// let _ = engine.handle_command(Command::OffsetBoundary {
    ///     boundary: OffsetBoundary::End,
    ///     delta_ms: 250,
    /// });
    /// let _ = engine.handle_command(Command::SaveEdit);
    /// ```
    EnterEdit {
        index: usize,
    },
    OffsetBoundary {
        boundary: OffsetBoundary,
        delta_ms: i64,
    },
    SetEditText {
        text: String,
    },
    SaveEdit,
    CancelEdit,
    /// Starts a record-along session for one entry. Replays the entry's
    /// precise bounds; never mutates content.
    EnterRecord {
        index: usize,
    },
    ExitRecord,
    /// Decode/playback failure reported by the media primitive.
    MediaFailed {
        message: String,
    },
    /// Tears the session down, flushing any pending progress write
    /// synchronously.
    Close,
}

/// Events emitted by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    SessionOpened(SessionSnapshot),
    IndexChanged { index: usize },
    ModeChanged { mode: PlayMode },
    BoundedChanged { bounded: bool },
    EditChanged(EditView),
    Error(EngineErrorEvent),
}

/// User-facing error payload emitted as an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorKind {
    Validation,
    Persistence,
    Media,
    Other,
}

impl From<&EngineError> for EngineErrorKind {
    fn from(value: &EngineError) -> Self {
        match value {
            EngineError::EmptyCalibrationText => Self::Validation,
            EngineError::Store(_) | EngineError::SettingsFormat { .. } => Self::Persistence,
            EngineError::Media { .. } => Self::Media,
            _ => Self::Other,
        }
    }
}

/// User-facing error payload emitted as an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineErrorEvent {
    pub kind: EngineErrorKind,
    pub message: String,
}

impl EngineErrorEvent {
    pub fn from_error(error: &EngineError) -> Self {
        Self {
            kind: EngineErrorKind::from(error),
            message: error.to_string(),
        }
    }
}

/// Read-only view of the live calibration buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditView {
    pub index: usize,
    pub precise_start_ms: i64,
    pub precise_end_ms: i64,
    pub text: String,
}

impl From<&EditBuffer> for EditView {
    fn from(value: &EditBuffer) -> Self {
        Self {
            index: value.index,
            precise_start_ms: value.precise_start_ms,
            precise_end_ms: value.precise_end_ms,
            text: value.text.clone(),
        }
    }
}

/// Immutable session snapshot consumed by the UI.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub media_id: String,
    pub entry_count: usize,
    /// `None` while no entry has been resolvable; the UI keeps its
    /// previous display in that case.
    pub current_index: Option<usize>,
    pub base_mode: PlayMode,
    /// True while an edit or record session bounds playback.
    pub bounded: bool,
    pub edit: Option<EditView>,
    pub settings: Settings,
}

#[derive(Debug)]
struct Session {
    media_id: String,
    track: Arc<SubtitleTrack>,
    current_index: Option<usize>,
    position_ms: i64,
    seeking: bool,
    edit: Option<EditBuffer>,
    record_active: bool,
    progress: ProgressDebouncer,
}

impl Session {
    fn current_entry(&self) -> Option<&crate::track::SubtitleEntry> {
        self.current_index.and_then(|index| self.track.entry(index))
    }

    fn bounded(&self) -> bool {
        self.edit.is_some() || self.record_active
    }
}

/// Engine implementation for the subtitle-sync session.
///
/// Owns the single track/playback-state pair for one session at a time;
/// all transitions happen on discrete commands, so no locking is needed.
#[derive(Debug)]
pub struct Engine<M, S, C = SystemClock>
where
    M: MediaTransport,
    S: DurableStore + SettingsStore,
    C: Clock,
{
    media: M,
    store: S,
    clock: C,
    settings: Settings,
    session: Option<Session>,
}

impl<M, S> Engine<M, S, SystemClock>
where
    M: MediaTransport,
    S: DurableStore + SettingsStore,
{
    /// Creates an engine on the wall clock.
    pub fn new(media: M, store: S) -> Self {
        Self::with_clock(media, store, SystemClock)
    }
}

impl<M> Engine<M, FsDurableStore, SystemClock>
where
    M: MediaTransport,
{
    /// Creates an engine wired to the filesystem store.
    ///
    /// # Example
    /// ```no_run
    /// use engine::{Engine, MediaTransport};
    ///
    /// struct NoopTransport;
    /// impl MediaTransport for NoopTransport {
    ///     fn seek_to(&self, _seconds: f64) {}
    ///     fn play(&self) {}
    ///     fn pause(&self) {}
    ///     fn set_rate(&self, _rate: f64) {}
    /// }
    ///
    /// let _engine = Engine::with_fs_store(NoopTransport, "./data");
    /// ```
    pub fn with_fs_store(media: M, root: impl Into<PathBuf>) -> Self {
        Self::new(media, FsDurableStore::new(root))
    }
}

impl<M, S, C> Engine<M, S, C>
where
    M: MediaTransport,
    S: DurableStore + SettingsStore,
    C: Clock,
{
    /// Creates an engine with an injected time source.
    pub fn with_clock(media: M, store: S, clock: C) -> Self {
        Self {
            media,
            store,
            clock,
            settings: Settings::default(),
            session: None,
        }
    }

    /// Applies one command and returns emitted events.
    pub fn handle_command(&mut self, command: Command) -> Result<Vec<Event>> {
        match command {
            Command::Open { media_id } => self.open(media_id),
            Command::Tick { position_ms } => self.tick(position_ms),
            Command::Resume => self.resume(),
            Command::SetMode { mode } => self.set_mode(mode),
            Command::SetPlaybackSpeed { rate } => self.set_playback_speed(rate),
            Command::Previous => self.skip(SearchDirection::Backward),
            Command::Next => self.skip(SearchDirection::Forward),
            Command::SeekStarted => self.seek_started(),
            Command::SeekEnded { position_ms } => self.seek_ended(position_ms),
            Command::EnterEdit { index } => self.enter_edit(index),
            Command::OffsetBoundary { boundary, delta_ms } => {
                self.offset_boundary(boundary, delta_ms)
            }
            Command::SetEditText { text } => self.set_edit_text(text),
            Command::SaveEdit => self.save_edit(),
            Command::CancelEdit => self.cancel_edit(),
            Command::EnterRecord { index } => self.enter_record(index),
            Command::ExitRecord => self.exit_record(),
            Command::MediaFailed { message } => self.media_failed(message),
            Command::Close => self.close(),
        }
    }

    /// Returns the current session snapshot, if a session is open.
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.session
            .as_ref()
            .map(|session| self.snapshot_of(session))
    }

    fn open(&mut self, media_id: String) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        if self.session.is_some() {
            self.flush_progress(&mut events);
            self.session = None;
        }

        let track = self
            .store
            .load_track(&media_id)?
            .ok_or_else(|| EngineError::TrackMissing {
                media_id: media_id.clone(),
            })?;

        match self.store.load_settings() {
            Ok(Some(settings)) => self.settings = settings,
            Ok(None) => self.settings = Settings::default(),
            Err(error) => {
                warn!(%error, "settings load failed; falling back to defaults");
                events.push(Event::Error(EngineErrorEvent::from_error(&error)));
                self.settings = Settings::default();
            }
        }
        self.media.set_rate(self.settings.playback_speed);

        let restored = match self.store.load_progress(&media_id) {
            Ok(progress) => progress,
            Err(error) => {
                warn!(%error, "progress load failed; starting from the top");
                events.push(Event::Error(EngineErrorEvent::from_error(&error)));
                None
            }
        };
        let restored = restored.filter(|index| *index < track.len());

        let session = Session {
            media_id: media_id.clone(),
            track: Arc::new(track),
            current_index: restored,
            position_ms: 0,
            seeking: false,
            edit: None,
            record_active: false,
            progress: ProgressDebouncer::new(PROGRESS_QUIET_PERIOD, restored),
        };
        info!(
            media_id = %media_id,
            entries = session.track.len(),
            restored_index = ?restored,
            "session opened"
        );

        let snapshot = self.snapshot_of(&session);
        self.session = Some(session);
        events.insert(0, Event::SessionOpened(snapshot));
        Ok(events)
    }

    fn tick(&mut self, position_ms: i64) -> Result<Vec<Event>> {
        let now = self.clock.now();
        let Some(session) = self.session.as_mut() else {
            return Err(EngineError::SessionNotLoaded);
        };
        session.position_ms = position_ms;

        let mut events = Vec::new();
        if session.seeking {
            // Index updates are deferred to the scrub-end containment scan.
            return Ok(events);
        }

        let effective = EffectiveMode::resolve(
            self.settings.play_mode,
            session.edit.is_some(),
            session.record_active,
        );
        match effective {
            EffectiveMode::Bounded(source) => {
                if let Some(entry) = session.current_entry() {
                    let boundary = override_boundary(source, entry, session.edit.as_ref());
                    if position_ms >= boundary.end_ms {
                        debug!(position_ms, boundary_end = boundary.end_ms, "bounded pause");
                        self.media.pause();
                    }
                }
            }
            EffectiveMode::SinglePause => {
                if let Some(entry) = session.current_entry() {
                    if position_ms >= entry.precise_end_ms {
                        self.media.pause();
                    }
                }
            }
            EffectiveMode::SingleLoop => {
                if let Some(entry) = session.current_entry() {
                    if position_ms >= entry.precise_end_ms {
                        self.media
                            .seek_to(millis_to_seconds(entry.precise_start_ms));
                    }
                }
            }
            EffectiveMode::Continuous => {
                if let Some(found) = session.track.containing(position_ms) {
                    if session.current_index != Some(found) {
                        session.current_index = Some(found);
                        session.progress.note_change(found, now);
                        events.push(Event::IndexChanged { index: found });
                    }
                }
                // A containment miss is a gap: the previous index stays.
            }
        }

        if let Some(index) = session.progress.poll(now) {
            let media_id = session.media_id.clone();
            if let Err(error) = self.store.save_progress(&media_id, index) {
                warn!(%error, "deferred progress write failed");
                events.push(Event::Error(EngineErrorEvent::from_error(&error)));
            }
        }
        Ok(events)
    }

    fn resume(&mut self) -> Result<Vec<Event>> {
        let Some(session) = self.session.as_ref() else {
            return Err(EngineError::SessionNotLoaded);
        };

        let effective = EffectiveMode::resolve(
            self.settings.play_mode,
            session.edit.is_some(),
            session.record_active,
        );
        match effective {
            EffectiveMode::Bounded(source) => {
                if let Some(entry) = session.current_entry() {
                    let boundary = override_boundary(source, entry, session.edit.as_ref());
                    self.media.seek_to(millis_to_seconds(boundary.start_ms));
                }
            }
            EffectiveMode::SinglePause => {
                if let Some(entry) = session.current_entry() {
                    self.media
                        .seek_to(millis_to_seconds(entry.precise_start_ms));
                }
            }
            EffectiveMode::SingleLoop | EffectiveMode::Continuous => {}
        }
        self.media.play();
        Ok(Vec::new())
    }

    fn set_mode(&mut self, mode: PlayMode) -> Result<Vec<Event>> {
        self.settings.play_mode = mode;
        info!(?mode, "play mode changed");
        let mut events = vec![Event::ModeChanged { mode }];
        self.persist_settings(&mut events);
        Ok(events)
    }

    fn set_playback_speed(&mut self, rate: f64) -> Result<Vec<Event>> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(EngineError::InvalidPlaybackRate { rate });
        }
        self.settings.playback_speed = rate;
        self.media.set_rate(rate);
        let mut events = Vec::new();
        self.persist_settings(&mut events);
        Ok(events)
    }

    fn skip(&mut self, direction: SearchDirection) -> Result<Vec<Event>> {
        let now = self.clock.now();
        let Some(session) = self.session.as_mut() else {
            return Err(EngineError::SessionNotLoaded);
        };

        let target = match (session.seeking, session.current_index) {
            // Unresolved position: nearest-neighbor search on start times.
            (true, _) | (false, None) => session.track.nearest(session.position_ms, direction),
            (false, Some(index)) => match direction {
                SearchDirection::Backward => index.checked_sub(1),
                SearchDirection::Forward => (index + 1 < session.track.len()).then_some(index + 1),
            },
        };
        let Some(target) = target else {
            debug!(?direction, "skip at track edge ignored");
            return Ok(Vec::new());
        };
        let start_ms = match session.track.entry(target) {
            Some(entry) => entry.start_ms,
            None => return Ok(Vec::new()),
        };

        // Index first, so dependent UI reacts before the seek completes.
        session.current_index = Some(target);
        session.progress.note_change(target, now);
        debug!(index = target, start_ms, "skip");
        self.media.seek_to(millis_to_seconds(start_ms));
        self.media.play();
        Ok(vec![Event::IndexChanged { index: target }])
    }

    fn seek_started(&mut self) -> Result<Vec<Event>> {
        let Some(session) = self.session.as_mut() else {
            return Err(EngineError::SessionNotLoaded);
        };
        session.seeking = true;
        Ok(Vec::new())
    }

    fn seek_ended(&mut self, position_ms: i64) -> Result<Vec<Event>> {
        let now = self.clock.now();
        let Some(session) = self.session.as_mut() else {
            return Err(EngineError::SessionNotLoaded);
        };
        // The suspension flag always clears when the scrub ends.
        session.seeking = false;
        session.position_ms = position_ms;

        let mut events = Vec::new();
        if let Some(found) = session.track.containing(position_ms) {
            if session.current_index != Some(found) {
                session.current_index = Some(found);
                session.progress.note_change(found, now);
                events.push(Event::IndexChanged { index: found });
            }
        }
        Ok(events)
    }

    fn enter_edit(&mut self, index: usize) -> Result<Vec<Event>> {
        let now = self.clock.now();
        let Some(session) = self.session.as_mut() else {
            return Err(EngineError::SessionNotLoaded);
        };
        let entry = session
            .track
            .entry(index)
            .ok_or(EngineError::EntryOutOfRange {
                index,
                len: session.track.len(),
            })?
            .clone();

        // At most one override session at a time.
        session.record_active = false;
        let buffer = EditBuffer::snapshot(&entry);
        let view = EditView::from(&buffer);
        session.edit = Some(buffer);

        let mut events = Vec::new();
        if session.current_index != Some(index) {
            session.current_index = Some(index);
            session.progress.note_change(index, now);
            events.push(Event::IndexChanged { index });
        }
        self.media.seek_to(millis_to_seconds(entry.start_ms));
        self.media.pause();
        info!(index, "calibration session started");

        events.push(Event::BoundedChanged { bounded: true });
        events.push(Event::EditChanged(view));
        Ok(events)
    }

    fn offset_boundary(&mut self, boundary: OffsetBoundary, delta_ms: i64) -> Result<Vec<Event>> {
        let Some(session) = self.session.as_mut() else {
            return Err(EngineError::SessionNotLoaded);
        };
        let buffer = session.edit.as_mut().ok_or(EngineError::EditNotActive)?;
        buffer.offset(boundary, delta_ms);
        Ok(vec![Event::EditChanged(EditView::from(&*buffer))])
    }

    fn set_edit_text(&mut self, text: String) -> Result<Vec<Event>> {
        let Some(session) = self.session.as_mut() else {
            return Err(EngineError::SessionNotLoaded);
        };
        let buffer = session.edit.as_mut().ok_or(EngineError::EditNotActive)?;
        buffer.text = text;
        Ok(vec![Event::EditChanged(EditView::from(&*buffer))])
    }

    fn save_edit(&mut self) -> Result<Vec<Event>> {
        let Some(session) = self.session.as_mut() else {
            return Err(EngineError::SessionNotLoaded);
        };
        let buffer = session.edit.as_ref().ok_or(EngineError::EditNotActive)?;
        let index = buffer.index;

        // Validation failures abort before anything is touched.
        let committed = Arc::new(buffer.committed_track(&session.track)?);

        let mut events = Vec::new();
        if let Err(error) = self.store.save_track(&committed) {
            // In-memory state stays authoritative; surface a notice.
            warn!(%error, "track write failed");
            events.push(Event::Error(EngineErrorEvent::from_error(&error)));
        }

        // Atomic reference swap: readers of the old track never see a
        // half-updated entry.
        session.track = committed;
        session.edit = None;
        info!(media_id = %session.media_id, index, "calibration committed");
        events.push(Event::BoundedChanged { bounded: false });
        Ok(events)
    }

    fn cancel_edit(&mut self) -> Result<Vec<Event>> {
        let Some(session) = self.session.as_mut() else {
            return Err(EngineError::SessionNotLoaded);
        };
        if session.edit.take().is_none() {
            return Err(EngineError::EditNotActive);
        }
        Ok(vec![Event::BoundedChanged { bounded: false }])
    }

    fn enter_record(&mut self, index: usize) -> Result<Vec<Event>> {
        let now = self.clock.now();
        let Some(session) = self.session.as_mut() else {
            return Err(EngineError::SessionNotLoaded);
        };
        let entry = session
            .track
            .entry(index)
            .ok_or(EngineError::EntryOutOfRange {
                index,
                len: session.track.len(),
            })?
            .clone();

        session.edit = None;
        session.record_active = true;

        let mut events = Vec::new();
        if session.current_index != Some(index) {
            session.current_index = Some(index);
            session.progress.note_change(index, now);
            events.push(Event::IndexChanged { index });
        }
        self.media.seek_to(millis_to_seconds(entry.start_ms));
        self.media.pause();
        info!(index, "record-along session started");

        events.push(Event::BoundedChanged { bounded: true });
        Ok(events)
    }

    fn exit_record(&mut self) -> Result<Vec<Event>> {
        let Some(session) = self.session.as_mut() else {
            return Err(EngineError::SessionNotLoaded);
        };
        if !session.record_active {
            return Err(EngineError::RecordNotActive);
        }
        session.record_active = false;
        Ok(vec![Event::BoundedChanged { bounded: false }])
    }

    fn media_failed(&mut self, message: String) -> Result<Vec<Event>> {
        // Non-fatal: navigation away stays available, state is unchanged.
        warn!(%message, "media playback failure reported");
        Ok(vec![Event::Error(EngineErrorEvent {
            kind: EngineErrorKind::Media,
            message,
        })])
    }

    fn close(&mut self) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        self.flush_progress(&mut events);
        if let Some(session) = self.session.take() {
            info!(media_id = %session.media_id, "session closed");
        }
        Ok(events)
    }

    fn persist_settings(&mut self, events: &mut Vec<Event>) {
        if let Err(error) = self.store.save_settings(&self.settings) {
            warn!(%error, "settings write failed");
            events.push(Event::Error(EngineErrorEvent::from_error(&error)));
        }
    }

    fn flush_progress(&mut self, events: &mut Vec<Event>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Some(index) = session.progress.take_pending() {
            let media_id = session.media_id.clone();
            if let Err(error) = self.store.save_progress(&media_id, index) {
                warn!(%error, "teardown progress write failed");
                events.push(Event::Error(EngineErrorEvent::from_error(&error)));
            }
        }
    }

    fn snapshot_of(&self, session: &Session) -> SessionSnapshot {
        SessionSnapshot {
            media_id: session.media_id.clone(),
            entry_count: session.track.len(),
            current_index: session.current_index,
            base_mode: self.settings.play_mode,
            bounded: session.bounded(),
            edit: session.edit.as_ref().map(EditView::from),
            settings: self.settings.clone(),
        }
    }
}

impl<M, S, C> Drop for Engine<M, S, C>
where
    M: MediaTransport,
    S: DurableStore + SettingsStore,
    C: Clock,
{
    fn drop(&mut self) {
        // Backstop for exit paths that skip Command::Close.
        let mut events = Vec::new();
        self.flush_progress(&mut events);
    }
}
