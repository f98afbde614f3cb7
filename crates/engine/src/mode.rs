use serde::{Deserialize, Serialize};

use crate::session::EditBuffer;
use crate::track::SubtitleEntry;

/// User-selected base playback policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlayMode {
    /// Play straight through; the containment scan advances the index.
    #[default]
    Continuous,
    /// Pause at the end of the current sentence.
    SinglePause,
    /// Loop the current sentence.
    SingleLoop,
}

/// Which transient session forced bounded playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundedSource {
    Edit,
    Record,
}

/// Mode actually in effect for one tick.
///
/// Computed from the base mode and the edit/record override flags; the
/// overrides take absolute priority. Keeping this a single exhaustive enum
/// lets every tick handler match all cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveMode {
    Continuous,
    SinglePause,
    SingleLoop,
    Bounded(BoundedSource),
}

impl EffectiveMode {
    /// Resolves the effective mode for one tick.
    ///
    /// At most one of `edit_active`/`record_active` is true; edit is
    /// checked first so a stale pair cannot silently pick record.
    pub fn resolve(base: PlayMode, edit_active: bool, record_active: bool) -> Self {
        if edit_active {
            Self::Bounded(BoundedSource::Edit)
        } else if record_active {
            Self::Bounded(BoundedSource::Record)
        } else {
            match base {
                PlayMode::Continuous => Self::Continuous,
                PlayMode::SinglePause => Self::SinglePause,
                PlayMode::SingleLoop => Self::SingleLoop,
            }
        }
    }

    /// Returns true for any mode that stops playback at one entry's end.
    pub fn is_bounded(&self) -> bool {
        matches!(self, Self::Bounded(_))
    }
}

/// Replay boundary for bounded playback, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    pub start_ms: i64,
    pub end_ms: i64,
}

/// Selects the replay boundary for an override session.
///
/// Edit uses the live edit buffer when present so offset adjustments are
/// audible immediately; record always replays the entry's precise bounds.
pub fn override_boundary(
    source: BoundedSource,
    entry: &SubtitleEntry,
    edit: Option<&EditBuffer>,
) -> Boundary {
    match (source, edit) {
        (BoundedSource::Edit, Some(buffer)) => Boundary {
            start_ms: buffer.precise_start_ms,
            end_ms: buffer.precise_end_ms,
        },
        _ => Boundary {
            start_ms: entry.precise_start_ms,
            end_ms: entry.precise_end_ms,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{Boundary, BoundedSource, EffectiveMode, PlayMode, override_boundary};
    use crate::session::EditBuffer;
    use crate::track::SubtitleEntry;

    fn entry() -> SubtitleEntry {
        SubtitleEntry {
            index: 0,
            start_ms: 1_000,
            end_ms: 2_000,
            precise_start_ms: 1_050,
            precise_end_ms: 1_950,
            text: "line".to_string(),
        }
    }

    #[test]
    fn overrides_take_priority_over_every_base_mode() {
        for base in [
            PlayMode::Continuous,
            PlayMode::SinglePause,
            PlayMode::SingleLoop,
        ] {
            assert_eq!(
                EffectiveMode::resolve(base, true, false),
                EffectiveMode::Bounded(BoundedSource::Edit)
            );
            assert_eq!(
                EffectiveMode::resolve(base, false, true),
                EffectiveMode::Bounded(BoundedSource::Record)
            );
        }
    }

    #[test]
    fn base_mode_applies_without_overrides() {
        assert_eq!(
            EffectiveMode::resolve(PlayMode::Continuous, false, false),
            EffectiveMode::Continuous
        );
        assert_eq!(
            EffectiveMode::resolve(PlayMode::SinglePause, false, false),
            EffectiveMode::SinglePause
        );
        assert_eq!(
            EffectiveMode::resolve(PlayMode::SingleLoop, false, false),
            EffectiveMode::SingleLoop
        );
    }

    #[test]
    fn edit_boundary_prefers_the_live_buffer() {
        let entry = entry();
        let mut buffer = EditBuffer::snapshot(&entry);
        buffer.precise_start_ms = 900;
        buffer.precise_end_ms = 2_100;

        let boundary = override_boundary(BoundedSource::Edit, &entry, Some(&buffer));
        assert_eq!(
            boundary,
            Boundary {
                start_ms: 900,
                end_ms: 2_100
            }
        );
    }

    #[test]
    fn record_boundary_always_uses_precise_entry_bounds() {
        let entry = entry();
        let buffer = EditBuffer::snapshot(&entry);

        let boundary = override_boundary(BoundedSource::Record, &entry, Some(&buffer));
        assert_eq!(
            boundary,
            Boundary {
                start_ms: 1_050,
                end_ms: 1_950
            }
        );
    }

    #[test]
    fn play_mode_serializes_in_kebab_case() {
        let json = serde_json::to_string(&PlayMode::SinglePause).expect("serialize play mode");
        assert_eq!(json, "\"single-pause\"");
    }
}
