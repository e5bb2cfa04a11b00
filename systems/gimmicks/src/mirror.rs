use std::time::Duration;

use rand::seq::SliceRandom;
use tint_tap_core::{Event, FlipAxis, GimmickKind, GimmickRange, TaskHandle};

use crate::stage::{Stage, Timer, TimerTask};

const DEFAULT_DURATION_MS: u64 = 2_000;
const DEFAULT_FREQUENCY: u32 = 1;
const REPEAT_PERIOD: Duration = Duration::from_secs(5);

/// Flips the grid along an axis and flips it back after a while.
#[derive(Debug, Default)]
pub(crate) struct Mirror {
    revert: Option<TaskHandle>,
}

impl Mirror {
    /// A single flip per activation unless the tier asks for more.
    pub(crate) fn period(tier: Option<&GimmickRange>) -> Option<Duration> {
        let frequency = tier
            .and_then(|t| t.frequency)
            .unwrap_or(DEFAULT_FREQUENCY);
        (frequency > 1).then_some(REPEAT_PERIOD)
    }

    pub(crate) fn execute(&mut self, stage: &mut Stage<'_>, tier: Option<&GimmickRange>) -> bool {
        if stage.grid.dimensions().is_none() {
            return false;
        }
        self.cancel_revert(stage);

        let axes = tier
            .and_then(|t| t.direction.as_ref())
            .map(|direction| direction.to_vec())
            .unwrap_or_default();
        let axis = axes
            .choose(&mut *stage.rng)
            .copied()
            .unwrap_or(FlipAxis::Horizontal);
        let duration = tier
            .and_then(|t| t.duration)
            .unwrap_or(DEFAULT_DURATION_MS);

        let transform = stage.grid.transform().with_flip(Some(axis));
        stage.grid.set_transform(transform);
        stage.out.push(Event::GridTransformChanged { transform });

        self.revert = Some(stage.timers.schedule_once(
            stage.now,
            Duration::from_millis(duration),
            Timer {
                kind: GimmickKind::Mirror,
                task: TimerTask::Revert,
            },
        ));
        true
    }

    /// Undoes the flip once its duration elapsed.
    pub(crate) fn revert(&mut self, stage: &mut Stage<'_>) {
        self.revert = None;
        clear_flip(stage);
    }

    pub(crate) fn deactivate(&mut self, stage: &mut Stage<'_>) {
        self.cancel_revert(stage);
        clear_flip(stage);
    }

    fn cancel_revert(&mut self, stage: &mut Stage<'_>) {
        if let Some(handle) = self.revert.take() {
            let _ = stage.timers.cancel(handle);
        }
    }
}

fn clear_flip(stage: &mut Stage<'_>) {
    let current = stage.grid.transform();
    if current.flip().is_none() {
        return;
    }
    let transform = current.with_flip(None);
    stage.grid.set_transform(transform);
    stage.out.push(Event::GridTransformChanged { transform });
}
