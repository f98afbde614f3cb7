use std::time::{Duration, Instant};

use tracing::debug;

/// Quiet period between the last index change and the deferred write.
pub const PROGRESS_QUIET_PERIOD: Duration = Duration::from_millis(500);

/// Time source injected into the engine.
///
/// The engine runs single-threaded and event-driven, so the debouncer is
/// polled from the tick path instead of owning a timer; this seam keeps it
/// deterministic under test.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall-clock time source used by production wiring.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pending {
    index: usize,
    due: Instant,
}

/// Debounces progress writes: only the final index of a burst of changes
/// reaches the store, and teardown flushes the latest value synchronously.
///
/// The debouncer holds scheduling state only; the engine performs the
/// store write with whatever [`ProgressDebouncer::poll`] or
/// [`ProgressDebouncer::take_pending`] yields.
#[derive(Debug)]
pub struct ProgressDebouncer {
    quiet: Duration,
    last_settled: Option<usize>,
    pending: Option<Pending>,
}

impl ProgressDebouncer {
    /// Creates a debouncer primed with the index restored at session
    /// start, which is never re-persisted; persistence begins from the
    /// first subsequent change.
    pub fn new(quiet: Duration, restored: Option<usize>) -> Self {
        Self {
            quiet,
            last_settled: restored,
            pending: None,
        }
    }

    /// Records an index change, (re)scheduling the deferred write at
    /// `now + quiet`. A change back to the settled value with nothing
    /// scheduled is a no-op.
    pub fn note_change(&mut self, index: usize, now: Instant) {
        if self.pending.is_none() && self.last_settled == Some(index) {
            return;
        }
        self.pending = Some(Pending {
            index,
            due: now + self.quiet,
        });
    }

    /// Returns the index to persist when the quiet period has elapsed.
    ///
    /// Yields at most once per settled burst; the caller writes the value.
    pub fn poll(&mut self, now: Instant) -> Option<usize> {
        let pending = self.pending?;
        if now < pending.due {
            return None;
        }
        self.pending = None;
        self.last_settled = Some(pending.index);
        debug!(index = pending.index, "progress debounce settled");
        Some(pending.index)
    }

    /// Cancels the schedule and yields the latest unwritten value, if any.
    ///
    /// Used on teardown for the synchronous flush; afterwards nothing is
    /// pending, so a later drop-path flush cannot write a duplicate.
    pub fn take_pending(&mut self) -> Option<usize> {
        let pending = self.pending.take()?;
        self.last_settled = Some(pending.index);
        Some(pending.index)
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::ProgressDebouncer;

    const QUIET: Duration = Duration::from_millis(500);

    #[test]
    fn burst_of_changes_yields_one_write_with_the_last_value() {
        let start = Instant::now();
        let mut debouncer = ProgressDebouncer::new(QUIET, None);

        debouncer.note_change(1, start);
        debouncer.note_change(2, start + Duration::from_millis(100));
        debouncer.note_change(3, start + Duration::from_millis(200));

        assert_eq!(debouncer.poll(start + Duration::from_millis(400)), None);
        assert_eq!(
            debouncer.poll(start + Duration::from_millis(700)),
            Some(3)
        );
        assert_eq!(debouncer.poll(start + Duration::from_millis(800)), None);
    }

    #[test]
    fn change_within_the_window_reschedules_the_deadline() {
        let start = Instant::now();
        let mut debouncer = ProgressDebouncer::new(QUIET, None);

        debouncer.note_change(1, start);
        // 499 ms later: still inside the window, so the deadline moves.
        debouncer.note_change(2, start + Duration::from_millis(499));

        assert_eq!(debouncer.poll(start + Duration::from_millis(600)), None);
        assert_eq!(
            debouncer.poll(start + Duration::from_millis(999)),
            Some(2)
        );
    }

    #[test]
    fn restored_value_is_not_re_persisted() {
        let start = Instant::now();
        let mut debouncer = ProgressDebouncer::new(QUIET, Some(5));

        debouncer.note_change(5, start);

        assert_eq!(debouncer.poll(start + QUIET + QUIET), None);
        assert_eq!(debouncer.take_pending(), None);
    }

    #[test]
    fn moving_away_and_back_to_the_restored_value_is_persisted() {
        let start = Instant::now();
        let mut debouncer = ProgressDebouncer::new(QUIET, Some(5));

        debouncer.note_change(6, start);
        debouncer.note_change(5, start + Duration::from_millis(10));

        assert_eq!(debouncer.poll(start + Duration::from_secs(1)), Some(5));
    }

    #[test]
    fn teardown_flush_takes_the_pending_value_exactly_once() {
        let start = Instant::now();
        let mut debouncer = ProgressDebouncer::new(QUIET, None);

        debouncer.note_change(4, start);

        assert_eq!(debouncer.take_pending(), Some(4));
        assert_eq!(debouncer.take_pending(), None);
        assert_eq!(debouncer.poll(start + Duration::from_secs(5)), None);
    }

    #[test]
    fn settled_write_suppresses_a_redundant_change_to_the_same_value() {
        let start = Instant::now();
        let mut debouncer = ProgressDebouncer::new(QUIET, None);

        debouncer.note_change(2, start);
        assert_eq!(debouncer.poll(start + Duration::from_secs(1)), Some(2));

        debouncer.note_change(2, start + Duration::from_secs(2));
        assert_eq!(debouncer.poll(start + Duration::from_secs(4)), None);
    }
}
