use std::time::Duration;

use rand_chacha::ChaCha8Rng;
use tint_tap_core::{Event, GimmickKind, GridView, Scheduler};

/// Work a gimmick timer performs when it fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TimerTask {
    /// Periodic execution.
    Interval,
    /// One-shot undo of a temporary change.
    Revert,
}

/// Payload stored in the engine's scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Timer {
    pub(crate) kind: GimmickKind,
    pub(crate) task: TimerTask,
}

/// Everything a gimmick may touch while it runs.
pub(crate) struct Stage<'a> {
    pub(crate) grid: &'a mut dyn GridView,
    pub(crate) timers: &'a mut Scheduler<Timer>,
    pub(crate) rng: &'a mut ChaCha8Rng,
    pub(crate) out: &'a mut Vec<Event>,
    pub(crate) now: Duration,
}

/// Converts configured seconds into a duration, ignoring non-positive values.
pub(crate) fn seconds(value: f64) -> Option<Duration> {
    (value.is_finite() && value > 0.0).then(|| Duration::from_secs_f64(value))
}
